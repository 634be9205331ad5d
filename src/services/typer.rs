use crate::config::Config;
use crate::debug_if_enabled;
use crate::events::{KeyAction, SessionFlags, TypingTarget};
use crate::mappings::CharToEvdevCode;
use crate::services::VirtualDevice;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

// Словарь для генерации псевдослучайного текста
const WORDS: &[&str] = &[
    "hello", "world", "rust", "keyboard", "mouse", "screen", "monitor", "desktop",
    "window", "application", "software", "hardware", "internet", "network", "database",
    "algorithm", "function", "variable", "module", "library", "framework", "testing",
    "steam", "game", "gaming", "player", "level", "score", "achievement",
    "bongo", "cat", "chest", "icon", "click", "screenshot", "image", "detection",
];

const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, Copy)]
enum TypingPattern {
    /// Целое слово с пробелом
    Word,
    /// Серия одиночных символов
    Chars,
    /// Быстрые одиночные нажатия
    Rapid,
}

/// Фоновая задача печати: эмитирует клавиши, пока не достигнута цель цикла
/// или не выставлен флаг остановки. Флаги читаются перед каждым действием.
/// Возвращает число символов, напечатанных за цикл.
pub async fn run_typer(
    config: Arc<Config>,
    device: Arc<VirtualDevice>,
    flags: Arc<SessionFlags>,
    target: TypingTarget,
) -> u64 {
    info!(
        "Запуск задачи печати: цель {} символов",
        target.chars_goal()
    );

    let mut keypress_count: u64 = 0;

    loop {
        if flags.should_stop() || target.is_met() {
            break;
        }

        match pick_pattern() {
            TypingPattern::Word => {
                let word = pick_word();
                for symbol in word.chars() {
                    if !emit_symbol(&config, &device, &flags, &target, symbol).await {
                        break;
                    }
                    keypress_count += 1;
                    sleep(key_delay(&config)).await;
                }
                if emit_symbol(&config, &device, &flags, &target, ' ').await {
                    keypress_count += 1;
                }
            }
            TypingPattern::Chars => {
                let burst_len = pick_range(2, 5);
                for _ in 0..burst_len {
                    if !emit_symbol(&config, &device, &flags, &target, pick_char()).await {
                        break;
                    }
                    keypress_count += 1;
                    sleep(key_delay(&config)).await;
                }
                if emit_symbol(&config, &device, &flags, &target, ' ').await {
                    keypress_count += 1;
                }
            }
            TypingPattern::Rapid => {
                let burst_len = pick_range(1, 3);
                for _ in 0..burst_len {
                    if !emit_symbol(&config, &device, &flags, &target, pick_char()).await {
                        break;
                    }
                    keypress_count += 1;
                    // Минимальная пауза для максимальной частоты
                    sleep(Duration::from_millis(pick_range(10, 30))).await;
                }
            }
        }

        if target.chars_done() % 100 == 0 && target.chars_done() > 0 {
            debug_if_enabled!(
                "Прогресс печати: {}/{} символов",
                target.chars_done(),
                target.chars_goal()
            );
        }

        // Случайная пауза между сериями
        sleep(burst_pause(&config)).await;
    }

    info!(
        "Задача печати завершена: {}/{} символов, {} нажатий",
        target.chars_done(),
        target.chars_goal(),
        keypress_count
    );

    target.chars_done()
}

/// Эмитировать один символ. false - пора останавливаться
/// (флаг остановки или цель достигнута).
async fn emit_symbol(
    config: &Config,
    device: &VirtualDevice,
    flags: &SessionFlags,
    target: &TypingTarget,
    symbol: char,
) -> bool {
    if flags.should_stop() {
        return false;
    }

    // Резервируем символ до эмиссии - chars_done не превысит chars_goal
    if !target.try_claim() {
        return false;
    }

    match CharToEvdevCode::translate(symbol) {
        Ok(code) => {
            if let Err(e) = device.send_key(code, KeyAction::Press) {
                error!("Ошибка отправки события нажатия: {}", e);
                return true;
            }
            sleep(key_hold(config)).await;
            if let Err(e) = device.send_key(code, KeyAction::Release) {
                error!("Ошибка отправки события отпускания: {}", e);
            }
        }
        Err(e) => {
            error!("Пропуск символа: {}", e);
        }
    }

    true
}

fn pick_pattern() -> TypingPattern {
    const PATTERNS: [TypingPattern; 3] =
        [TypingPattern::Word, TypingPattern::Chars, TypingPattern::Rapid];
    *PATTERNS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&TypingPattern::Chars)
}

fn pick_word() -> &'static str {
    WORDS.choose(&mut rand::thread_rng()).copied().unwrap_or("bongo")
}

fn pick_char() -> char {
    let byte = *CHARS.choose(&mut rand::thread_rng()).unwrap_or(&b'a');
    byte as char
}

fn pick_range(lo: u64, hi: u64) -> u64 {
    rand::thread_rng().gen_range(lo..=hi)
}

fn key_hold(config: &Config) -> Duration {
    Duration::from_millis(pick_range(
        config.typing.key_hold_ms_min,
        config.typing.key_hold_ms_max,
    ))
}

fn key_delay(config: &Config) -> Duration {
    Duration::from_millis(pick_range(
        config.typing.key_delay_ms_min,
        config.typing.key_delay_ms_max,
    ))
}

fn burst_pause(config: &Config) -> Duration {
    Duration::from_millis(pick_range(
        config.typing.burst_pause_ms_min,
        config.typing.burst_pause_ms_max,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> Arc<Config> {
        let mut config = Config::default();
        config.typing.key_hold_ms_min = 0;
        config.typing.key_hold_ms_max = 1;
        config.typing.key_delay_ms_min = 0;
        config.typing.key_delay_ms_max = 1;
        config.typing.burst_pause_ms_min = 0;
        config.typing.burst_pause_ms_max = 1;
        config.build_optimization_indexes();
        Arc::new(config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_typer_reaches_goal_exactly() {
        let config = fast_config();
        let device = Arc::new(VirtualDevice::new("typer-test", true).unwrap());
        let flags = Arc::new(SessionFlags::new());
        flags.begin_cycle();

        let target = TypingTarget::new(25);
        let typed = run_typer(config, device, flags, target.clone()).await;

        assert_eq!(typed, 25);
        assert_eq!(target.chars_done(), 25);
        assert!(target.is_met());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typer_stops_on_flag_within_one_step() {
        let config = fast_config();
        let device = Arc::new(VirtualDevice::new("typer-test", true).unwrap());
        let flags = Arc::new(SessionFlags::new());
        flags.begin_cycle();
        // Остановка выставлена до старта - задача не должна напечатать ничего
        flags.stop_typing();

        let target = TypingTarget::new(1000);
        let typed = run_typer(config, device, flags, target.clone()).await;

        assert_eq!(typed, 0);
        assert_eq!(target.chars_done(), 0);
    }
}
