use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub game: GameConfig,
    pub typing: TypingConfig,
    pub countdown: CountdownConfig,
    pub chest: ChestConfig,
    // Оптимизационные индексы - не сериализуются, строятся после загрузки
    #[serde(skip)]
    process_patterns_lower: Vec<String>, // Предварительно нормализованные паттерны процессов
    #[serde(skip)]
    window_patterns_lower: Vec<String>, // Предварительно нормализованные паттерны окон
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Подстроки имён процессов игры (без учёта регистра)
    pub process_patterns: Vec<String>,
    /// Подстроки заголовков окна игры (без учёта регистра)
    pub window_title_patterns: Vec<String>,
    /// Интервал опроса наличия процесса игры
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TypingConfig {
    /// Символов на один цикл
    pub chars_per_cycle: u64,
    /// Удержание клавиши, мс
    pub key_hold_ms_min: u64,
    pub key_hold_ms_max: u64,
    /// Пауза между символами, мс
    pub key_delay_ms_min: u64,
    pub key_delay_ms_max: u64,
    /// Пауза между сериями, мс
    pub burst_pause_ms_min: u64,
    pub burst_pause_ms_max: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CountdownConfig {
    /// Длительность по умолчанию, когда OCR недоступен или нечитаем
    pub default_secs: u64,
    /// Режим чтения таймера: "tesseract" | "off"
    pub ocr_mode: String,
    /// Кликать по области таймера перед чтением, чтобы таймер был виден
    pub click_timer_area: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChestConfig {
    /// Путь к шаблону иконки сундука
    pub template_path: String,
    /// Максимум попыток поиска за цикл
    pub max_attempts: u32,
    /// Пауза между попытками, секунды
    pub retry_wait_secs: u64,
    /// Совпадение принимается сразу
    pub accept_threshold: f64,
    /// Ослабленный порог финальной попытки
    pub degraded_threshold: f64,
    /// Каталог для отладочного снимка последней неудачной попытки
    #[serde(default)]
    pub debug_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: "bongo_rust=info".to_string(),
            },
            game: GameConfig {
                process_patterns: vec![
                    "bongocat".to_string(),
                    "bongo cat".to_string(),
                    "bongo-cat".to_string(),
                    "bongo_cat".to_string(),
                ],
                window_title_patterns: vec!["bongo cat".to_string(), "bongocat".to_string()],
                poll_interval_ms: 2000,
            },
            typing: TypingConfig {
                chars_per_cycle: 1000,
                key_hold_ms_min: 50,
                key_hold_ms_max: 150,
                key_delay_ms_min: 20,
                key_delay_ms_max: 80,
                burst_pause_ms_min: 100,
                burst_pause_ms_max: 500,
            },
            countdown: CountdownConfig {
                default_secs: 30 * 60,
                ocr_mode: "tesseract".to_string(),
                click_timer_area: true,
            },
            chest: ChestConfig {
                template_path: "chest.png".to_string(),
                max_attempts: 7,
                retry_wait_secs: 300,
                accept_threshold: 0.7,
                degraded_threshold: 0.3,
                debug_dir: None,
            },
            process_patterns_lower: Vec::new(),
            window_patterns_lower: Vec::new(),
        };
        config.build_optimization_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Значения по умолчанию перекрываются файлом, файл - переменными окружения
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("BONGO_"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_optimization_indexes();

        Ok(config)
    }

    /// Строит оптимизационные индексы для быстрого поиска
    pub fn build_optimization_indexes(&mut self) {
        // Предварительно нормализуем паттерны процессов и окон
        self.process_patterns_lower = self
            .game
            .process_patterns
            .iter()
            .map(|pattern| pattern.to_lowercase())
            .collect();

        self.window_patterns_lower = self
            .game
            .window_title_patterns
            .iter()
            .map(|pattern| pattern.to_lowercase())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек игры
        if self.game.process_patterns.is_empty() {
            anyhow::bail!("process_patterns не должен быть пустым");
        }

        if self.game.poll_interval_ms < 100 {
            anyhow::bail!("poll_interval_ms должно быть минимум 100");
        }

        // Валидация настроек печати
        if self.typing.chars_per_cycle == 0 {
            anyhow::bail!("chars_per_cycle должно быть больше 0");
        }

        if self.typing.key_hold_ms_min > self.typing.key_hold_ms_max {
            anyhow::bail!("key_hold_ms_min не может превышать key_hold_ms_max");
        }

        if self.typing.key_delay_ms_min > self.typing.key_delay_ms_max {
            anyhow::bail!("key_delay_ms_min не может превышать key_delay_ms_max");
        }

        if self.typing.burst_pause_ms_min > self.typing.burst_pause_ms_max {
            anyhow::bail!("burst_pause_ms_min не может превышать burst_pause_ms_max");
        }

        // Валидация настроек отсчёта
        if self.countdown.default_secs == 0 {
            anyhow::bail!("default_secs должно быть больше 0");
        }

        match self.countdown.ocr_mode.as_str() {
            "tesseract" | "off" => {}
            _ => anyhow::bail!("Неверный режим OCR: {}", self.countdown.ocr_mode),
        }

        // Валидация настроек сундука
        if self.chest.max_attempts == 0 {
            anyhow::bail!("max_attempts должно быть больше 0");
        }

        for (name, value) in [
            ("accept_threshold", self.chest.accept_threshold),
            ("degraded_threshold", self.chest.degraded_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} должен лежать в [0, 1], получено {}", name, value);
            }
        }

        if self.chest.degraded_threshold > self.chest.accept_threshold {
            anyhow::bail!("degraded_threshold не может превышать accept_threshold");
        }

        Ok(())
    }

    /// Проверить, относится ли имя процесса к игре (O(паттернов), без аллокаций
    /// на каждый паттерн - используются предварительно нормализованные строки)
    pub fn matches_game_process(&self, process_name: &str) -> bool {
        let name_lower = process_name.to_lowercase();
        self.process_patterns_lower
            .iter()
            .any(|pattern| name_lower.contains(pattern))
    }

    /// Проверить, относится ли заголовок окна к игре
    pub fn matches_game_window(&self, window_title: &str) -> bool {
        let title_lower = window_title.to_lowercase();
        self.window_patterns_lower
            .iter()
            .any(|pattern| title_lower.contains(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_matches_game_process() {
        let mut config = Config::default();
        config.game.process_patterns = vec!["bongocat".to_string(), "bongo cat".to_string()];

        // Перестраиваем оптимизационные индексы после изменения конфигурации
        config.build_optimization_indexes();

        assert!(config.matches_game_process("BongoCat.exe"));
        assert!(config.matches_game_process("steam_bongo cat_launcher"));
        assert!(!config.matches_game_process("firefox"));
    }

    #[test]
    fn test_matches_game_window() {
        let config = Config::default();

        assert!(config.matches_game_window("Bongo Cat"));
        assert!(config.matches_game_window("bongocat - Steam"));
        assert!(!config.matches_game_window("Terminal"));
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = Config::default();
        config.chest.accept_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chest.degraded_threshold = 0.9;
        config.chest.accept_threshold = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_goal_and_attempts() {
        let mut config = Config::default();
        config.typing.chars_per_cycle = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chest.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_ocr_mode() {
        let mut config = Config::default();
        config.countdown.ocr_mode = "easyocr".to_string();
        assert!(config.validate().is_err());
    }
}
