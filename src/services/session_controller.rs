use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::{BongoError, Result};
use crate::events::{
    ChestAttempt, ChestMatch, CycleOutcome, Session, SessionFlags, SessionMode, TypingTarget,
};
use crate::services::clicker::MouseClicker;
use crate::services::detector::{parse_countdown_secs, Detector};
use crate::services::typer::run_typer;
use crate::services::VirtualDevice;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, Duration};
use tracing::{error, info, warn};

/// Чем закончился отсчёт внутри цикла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownEnd {
    /// Время вышло - пора искать сундук
    Elapsed,
    /// Процесс игры пропал - цикл прерывается, сессия продолжается
    ProcessLost,
    /// Пользователь отменил сессию
    Cancelled,
}

/// SessionController - единственный компонент с состоянием: владеет циклами,
/// отсчётом, целью печати и retry-политикой поиска сундука. Все внешние
/// взаимодействия идут через фасады Detector / MouseClicker / VirtualDevice.
pub struct SessionController {
    config: Arc<Config>,
    detector: Arc<dyn Detector>,
    clicker: Arc<dyn MouseClicker>,
    virtual_device: Arc<VirtualDevice>,
    /// Внешний сигнал отмены (Ctrl+C) - владелец main
    shutdown: Arc<AtomicBool>,
    /// Протокол двух задач цикла: писатель - отсчёт, читатель - печать
    flags: Arc<SessionFlags>,
    max_cycles: u64,
    total_typed: AtomicU64,
}

impl SessionController {
    pub fn new(
        config: Arc<Config>,
        detector: Arc<dyn Detector>,
        clicker: Arc<dyn MouseClicker>,
        virtual_device: Arc<VirtualDevice>,
        shutdown: Arc<AtomicBool>,
        max_cycles: u64,
    ) -> Self {
        info!("Инициализация SessionController ({} циклов максимум)", max_cycles);

        Self {
            config,
            detector,
            clicker,
            virtual_device,
            shutdown,
            flags: Arc::new(SessionFlags::new()),
            max_cycles,
            total_typed: AtomicU64::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn flags(&self) -> Arc<SessionFlags> {
        Arc::clone(&self.flags)
    }

    pub fn total_typed(&self) -> u64 {
        self.total_typed.load(Ordering::Relaxed)
    }

    fn cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Главный цикл сессии: ждёт появления процесса игры (опрос каждые 2 с),
    /// прогоняет циклы и останавливается при исчерпании попыток поиска
    /// сундука, выполнении всех циклов или отмене.
    pub async fn run(&self, mode: SessionMode) -> Result<()> {
        let mut session = Session::new(mode);
        let overall_goal = self.overall_goal(mode);
        let poll = Duration::from_millis(self.config.game.poll_interval_ms);

        info!("Сессия запущена в режиме {}", mode);

        loop {
            if self.cancelled() {
                self.flags.end_cycle();
                return Err(BongoError::Cancelled);
            }

            if mode == SessionMode::Typing
                && (session.cycle_index >= self.max_cycles || self.total_typed() >= overall_goal)
            {
                info!(
                    "Все {} циклов выполнены, напечатано {} символов",
                    session.cycle_index,
                    self.total_typed()
                );
                return Ok(());
            }

            match self.detector.is_game_running().await {
                Ok(true) => {
                    match self.run_cycle(&mut session).await? {
                        CycleOutcome::Stopped => {
                            error!("Сессия остановлена после цикла {}", session.cycle_index);
                            return Ok(());
                        }
                        CycleOutcome::Continued => {
                            debug_if_enabled!(
                                "Цикл {} завершён, короткая пауза перед следующим",
                                session.cycle_index
                            );
                            self.wait_interruptible(Duration::from_secs(5)).await?;
                        }
                    }
                }
                Ok(false) => {
                    debug_if_enabled!("Процесс игры не наблюдается, продолжаем опрос");
                }
                Err(e) => {
                    warn!("Не удалось проверить процесс игры: {}", e);
                }
            }

            self.wait_interruptible(poll).await?;
        }
    }

    /// Прогнать один цикл: активация окна, отсчёт с фоновой печатью,
    /// поиск сундука с retry-политикой.
    pub async fn run_cycle(&self, session: &mut Session) -> Result<CycleOutcome> {
        let cycle = session.begin_cycle();
        self.flags.begin_cycle();

        let result = self.run_cycle_impl(session).await;

        self.flags.end_cycle();
        session.end_cycle();

        match &result {
            Ok(outcome) => debug_if_enabled!("Цикл {} завершён с исходом {:?}", cycle, outcome),
            Err(e) => debug_if_enabled!("Цикл {} прерван: {}", cycle, e),
        }

        result
    }

    async fn run_cycle_impl(&self, session: &Session) -> Result<CycleOutcome> {
        info!("Запуск цикла {} (режим {})", session.cycle_index, session.mode);

        // Активируем окно игры, чтобы печать уходила в него (best-effort)
        if let Some(pattern) = self.config.game.window_title_patterns.first() {
            if let Err(e) = self.clicker.activate_window(pattern).await {
                warn!("Не удалось активировать окно игры: {}", e);
            }
        }

        // Фоновая задача печати (только в режиме Typing)
        let typer = self.spawn_typer(session.mode);

        let duration_secs = self.smart_countdown_secs().await;
        info!("Отсчёт цикла {}: {} секунд", session.cycle_index, duration_secs);

        let end = self.countdown(duration_secs).await;

        // Останавливаем печать кооперативно и дожидаемся задачи
        self.flags.stop_typing();
        if let Some((handle, target)) = typer {
            self.join_typer(handle).await;
            self.total_typed
                .fetch_add(target.chars_done(), Ordering::Relaxed);
        }

        match end {
            CountdownEnd::Cancelled => Err(BongoError::Cancelled),
            CountdownEnd::ProcessLost => {
                warn!(
                    "Игра пропала во время цикла {} - цикл прерван, сессия продолжается",
                    session.cycle_index
                );
                Ok(CycleOutcome::Continued)
            }
            CountdownEnd::Elapsed => {
                info!("Цикл {} завершён! Ищем сундук...", session.cycle_index);
                match self.find_and_open_chest().await {
                    Ok(attempt) => {
                        info!("Сундук открыт ({})", attempt);
                        Ok(CycleOutcome::Continued)
                    }
                    Err(BongoError::Cancelled) => Err(BongoError::Cancelled),
                    Err(e) => {
                        error!("{} - сессия останавливается", e);
                        Ok(CycleOutcome::Stopped)
                    }
                }
            }
        }
    }

    fn overall_goal(&self, mode: SessionMode) -> u64 {
        match mode {
            SessionMode::Typing => self.max_cycles * self.config.typing.chars_per_cycle,
            SessionMode::ChestOnly => 0,
        }
    }

    /// Цель печати на следующий цикл: остаток от общей цели, но не больше
    /// chars_per_cycle.
    fn next_cycle_goal(&self) -> u64 {
        let per_cycle = self.config.typing.chars_per_cycle;
        let overall = self.max_cycles * per_cycle;
        per_cycle.min(overall.saturating_sub(self.total_typed()))
    }

    fn spawn_typer(&self, mode: SessionMode) -> Option<(JoinHandle<u64>, TypingTarget)> {
        if mode != SessionMode::Typing {
            return None;
        }

        let goal = self.next_cycle_goal();
        if goal == 0 {
            return None;
        }

        info!("Цель печати на цикл: {} символов", goal);

        let target = TypingTarget::new(goal);
        let handle = tokio::spawn(run_typer(
            Arc::clone(&self.config),
            Arc::clone(&self.virtual_device),
            Arc::clone(&self.flags),
            target.clone(),
        ));

        Some((handle, target))
    }

    async fn join_typer(&self, handle: JoinHandle<u64>) {
        let mut handle = handle;
        match timeout(Duration::from_secs(2), &mut handle).await {
            Ok(Ok(typed)) => debug_if_enabled!("Задача печати вернула {} символов", typed),
            Ok(Err(e)) => warn!("Задача печати завершилась с ошибкой: {}", e),
            Err(_) => {
                warn!("Таймаут ожидания задачи печати - прерываем");
                handle.abort();
            }
        }
    }

    /// Длительность отсчёта: OCR по снимку окна игры, при любой неудаче -
    /// значение по умолчанию из конфигурации.
    async fn smart_countdown_secs(&self) -> u64 {
        let default = self.config.countdown.default_secs;

        // Клик по области таймера, чтобы таймер был виден на снимке
        if self.config.countdown.click_timer_area {
            match self.detector.find_game_window().await {
                Ok(window) => {
                    let (x, y) = window.timer_area_point();
                    if let Err(e) = self.clicker.click_at(x, y).await {
                        warn!("Не удалось кликнуть по области таймера: {}", e);
                    }
                }
                Err(e) => {
                    warn!(
                        "Окно игры не найдено ({}), используем {} секунд по умолчанию",
                        e, default
                    );
                    return default;
                }
            }
        }

        let image = match self.detector.capture_game_window().await {
            Ok(image) => image,
            Err(e) => {
                warn!(
                    "Не удалось снять окно игры ({}), используем {} секунд по умолчанию",
                    e, default
                );
                return default;
            }
        };

        match self.detector.read_countdown_text(&image) {
            Ok(Some(text)) => match parse_countdown_secs(&text) {
                Some(secs) if secs > 0 => {
                    info!("OCR прочитал таймер: {} секунд", secs);
                    secs
                }
                _ => {
                    warn!(
                        "Не удалось разобрать текст таймера '{}', используем {} секунд",
                        text, default
                    );
                    default
                }
            },
            Ok(None) => {
                warn!("OCR не вернул текст, используем {} секунд", default);
                default
            }
            Err(BongoError::ServiceUnavailable(msg)) => {
                warn!("OCR недоступен ({}), используем {} секунд", msg, default);
                default
            }
            Err(e) => {
                warn!("Ошибка чтения таймера ({}), используем {} секунд", e, default);
                default
            }
        }
    }

    /// Отсчёт с шагом в секунду. Каждый тик проверяет отмену, каждые
    /// poll_interval_ms - присутствие процесса игры.
    async fn countdown(&self, duration_secs: u64) -> CountdownEnd {
        let poll_secs = (self.config.game.poll_interval_ms / 1000).max(1);

        let mut ticker = interval(Duration::from_secs(1));
        ticker.tick().await; // первый тик мгновенный

        for elapsed in 0..duration_secs {
            if self.cancelled() {
                return CountdownEnd::Cancelled;
            }

            if elapsed > 0 && elapsed % poll_secs == 0 {
                match self.detector.is_game_running().await {
                    Ok(false) => return CountdownEnd::ProcessLost,
                    Ok(true) => {}
                    Err(e) => debug_if_enabled!("Не удалось проверить процесс игры: {}", e),
                }
            }

            let remaining = duration_secs - elapsed;
            if remaining % 300 == 0 {
                info!("Осталось {} секунд отсчёта", remaining);
            } else {
                debug_if_enabled!("Осталось {} секунд отсчёта", remaining);
            }

            ticker.tick().await;
        }

        if self.cancelled() {
            CountdownEnd::Cancelled
        } else {
            CountdownEnd::Elapsed
        }
    }

    /// Поиск сундука с retry-политикой: явный ограниченный цикл вместо
    /// рекурсии. Совпадение >= accept_threshold принимается сразу; на
    /// финальной попытке принимается и ослабленное совпадение
    /// >= degraded_threshold.
    async fn find_and_open_chest(&self) -> Result<ChestAttempt> {
        let max_attempts = self.config.chest.max_attempts;
        let accept = self.config.chest.accept_threshold;
        let degraded = self.config.chest.degraded_threshold;
        let retry_wait = Duration::from_secs(self.config.chest.retry_wait_secs);

        let mut best_confidence: f64 = 0.0;

        for attempt_number in 1..=max_attempts {
            if self.cancelled() {
                return Err(BongoError::Cancelled);
            }

            let is_final = attempt_number == max_attempts;

            // Ошибки захвата/поиска - транзиентный промах, повторяем по политике
            let located = match self.capture_and_locate().await {
                Ok(found) => Some(found),
                Err(e) => {
                    warn!("Попытка {}/{}: {}", attempt_number, max_attempts, e);
                    None
                }
            };

            if let Some(found) = located {
                best_confidence = best_confidence.max(found.confidence);
                let attempt = ChestAttempt {
                    attempt_number,
                    max_attempts,
                    confidence: found.confidence,
                };
                info!("Поиск сундука: {}", attempt);

                if found.confidence >= accept {
                    info!("Сундук найден! Кликаем по ({}, {})", found.center.0, found.center.1);
                    self.click_chest(&found).await;
                    return Ok(attempt);
                }

                if is_final && found.confidence >= degraded {
                    warn!("Принимаем ослабленное совпадение на финальной попытке: {}", attempt);
                    self.click_chest(&found).await;
                    return Ok(attempt);
                }
            }

            if !is_final {
                info!(
                    "Сундук не найден - ждём {} секунд до попытки {}/{}",
                    retry_wait.as_secs(),
                    attempt_number + 1,
                    max_attempts
                );
                self.wait_interruptible(retry_wait).await?;
            }
        }

        self.dump_debug_screenshot().await;

        Err(BongoError::ChestNotFound {
            attempts: max_attempts,
            best_confidence,
        })
    }

    async fn capture_and_locate(&self) -> Result<ChestMatch> {
        let screen = self.detector.capture_screen().await?;
        self.detector.locate_chest(&screen)
    }

    async fn click_chest(&self, found: &ChestMatch) {
        let (x, y) = (found.center.0 as i32, found.center.1 as i32);
        if let Err(e) = self.clicker.click_at(x, y).await {
            warn!("Не удалось кликнуть по сундуку в ({}, {}): {}", x, y, e);
        }
    }

    /// Отладочный снимок последней неудачной попытки (если настроен каталог)
    async fn dump_debug_screenshot(&self) {
        let Some(dir) = self.config.chest.debug_dir.as_deref() else {
            return;
        };

        let screen = match self.detector.capture_screen().await {
            Ok(screen) => screen,
            Err(e) => {
                warn!("Не удалось снять экран для отладочного снимка: {}", e);
                return;
            }
        };

        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("Не удалось создать каталог {}: {}", dir, e);
            return;
        }

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = std::path::Path::new(dir).join(format!("chest_not_found_{}.png", timestamp));

        match screen.save(&path) {
            Ok(()) => info!("Отладочный снимок сохранён: {:?}", path),
            Err(e) => warn!("Не удалось сохранить отладочный снимок: {}", e),
        }
    }

    /// Ожидание, прерываемое сигналом отмены не позже чем через секунду
    async fn wait_interruptible(&self, duration: Duration) -> Result<()> {
        let step = Duration::from_secs(1);
        let mut remaining = duration;

        while remaining > Duration::ZERO {
            if self.cancelled() {
                return Err(BongoError::Cancelled);
            }
            let chunk = remaining.min(step);
            sleep(chunk).await;
            remaining = remaining.saturating_sub(chunk);
        }

        if self.cancelled() {
            Err(BongoError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameWindow;
    use image::RgbaImage;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU32;
    use tokio::time::Instant;

    /// Сценарный детектор: уверенности выдаются по списку, последняя повторяется
    struct MockDetector {
        running: AtomicBool,
        confidences: Vec<f64>,
        locate_calls: AtomicU32,
        countdown_text: Option<String>,
        ocr_unavailable: bool,
    }

    impl MockDetector {
        fn new(confidences: Vec<f64>) -> Self {
            Self {
                running: AtomicBool::new(true),
                confidences,
                locate_calls: AtomicU32::new(0),
                countdown_text: Some("00:02".to_string()),
                ocr_unavailable: false,
            }
        }

        fn locate_calls(&self) -> u32 {
            self.locate_calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait::async_trait]
    impl Detector for MockDetector {
        async fn is_game_running(&self) -> Result<bool> {
            Ok(self.running.load(Ordering::Relaxed))
        }

        async fn find_game_window(&self) -> Result<GameWindow> {
            Ok(GameWindow::new("Bongo Cat - mock".to_string(), 0, 0, 640, 480))
        }

        async fn capture_game_window(&self) -> Result<RgbaImage> {
            Ok(RgbaImage::new(64, 64))
        }

        async fn capture_screen(&self) -> Result<RgbaImage> {
            Ok(RgbaImage::new(64, 64))
        }

        fn locate_chest(&self, _screen: &RgbaImage) -> Result<ChestMatch> {
            let call = self.locate_calls.fetch_add(1, Ordering::Relaxed) as usize;
            let index = call.min(self.confidences.len().saturating_sub(1));
            Ok(ChestMatch {
                confidence: self.confidences[index],
                top_left: (10, 20),
                center: (15, 25),
            })
        }

        fn read_countdown_text(&self, _window_image: &RgbaImage) -> Result<Option<String>> {
            if self.ocr_unavailable {
                return Err(BongoError::ServiceUnavailable("tesseract не найден".to_string()));
            }
            Ok(self.countdown_text.clone())
        }
    }

    #[derive(Default)]
    struct RecordingClicker {
        clicks: Mutex<Vec<(i32, i32)>>,
    }

    impl RecordingClicker {
        fn click_count(&self) -> usize {
            self.clicks.lock().len()
        }
    }

    #[async_trait::async_trait]
    impl MouseClicker for RecordingClicker {
        async fn click_at(&self, x: i32, y: i32) -> Result<()> {
            self.clicks.lock().push((x, y));
            Ok(())
        }

        async fn activate_window(&self, _title_pattern: &str) -> Result<()> {
            Ok(())
        }
    }

    fn test_config() -> Arc<Config> {
        let mut config = Config::default();
        config.countdown.click_timer_area = false;
        config.typing.chars_per_cycle = 10;
        config.typing.key_hold_ms_min = 0;
        config.typing.key_hold_ms_max = 1;
        config.typing.key_delay_ms_min = 0;
        config.typing.key_delay_ms_max = 1;
        config.typing.burst_pause_ms_min = 0;
        config.typing.burst_pause_ms_max = 1;
        config.build_optimization_indexes();
        Arc::new(config)
    }

    fn controller_with(
        config: Arc<Config>,
        detector: Arc<MockDetector>,
        clicker: Arc<RecordingClicker>,
        shutdown: Arc<AtomicBool>,
    ) -> SessionController {
        let device = Arc::new(VirtualDevice::new("controller-test", true).unwrap());
        SessionController::new(config, detector, clicker, device, shutdown, 1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_chest_accepted_on_first_attempt() {
        let detector = Arc::new(MockDetector::new(vec![0.8]));
        let clicker = Arc::new(RecordingClicker::default());
        let controller = controller_with(
            test_config(),
            detector.clone(),
            clicker.clone(),
            Arc::new(AtomicBool::new(false)),
        );

        let attempt = controller.find_and_open_chest().await.unwrap();
        assert_eq!(attempt.attempt_number, 1);
        assert_eq!(attempt.confidence, 0.8);
        assert_eq!(detector.locate_calls(), 1);
        assert_eq!(clicker.click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_match_accepted_only_on_final_attempt() {
        let detector = Arc::new(MockDetector::new(vec![0.5]));
        let clicker = Arc::new(RecordingClicker::default());
        let controller = controller_with(
            test_config(),
            detector.clone(),
            clicker.clone(),
            Arc::new(AtomicBool::new(false)),
        );

        let attempt = controller.find_and_open_chest().await.unwrap();
        assert_eq!(attempt.attempt_number, 7);
        assert_eq!(attempt.max_attempts, 7);
        assert_eq!(detector.locate_calls(), 7);
        assert_eq!(clicker.click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_confidence_rejected_with_full_backoff() {
        let detector = Arc::new(MockDetector::new(vec![0.2]));
        let clicker = Arc::new(RecordingClicker::default());
        let controller = controller_with(
            test_config(),
            detector.clone(),
            clicker.clone(),
            Arc::new(AtomicBool::new(false)),
        );

        let started = Instant::now();
        let result = controller.find_and_open_chest().await;
        let elapsed = started.elapsed();

        match result {
            Err(BongoError::ChestNotFound {
                attempts,
                best_confidence,
            }) => {
                assert_eq!(attempts, 7);
                assert!((best_confidence - 0.2).abs() < 1e-9);
            }
            other => panic!("Ожидался ChestNotFound, получено {:?}", other.map(|a| a.confidence)),
        }

        assert_eq!(detector.locate_calls(), 7);
        assert_eq!(clicker.click_count(), 0);

        // Суммарное виртуальное ожидание: (attempts - 1) * 300 секунд
        assert!(elapsed >= Duration::from_secs(6 * 300));
        assert!(elapsed < Duration::from_secs(6 * 300 + 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cycle_stops_session_after_exhausted_retries() {
        let detector = Arc::new(MockDetector::new(vec![0.2]));
        let clicker = Arc::new(RecordingClicker::default());
        let controller = controller_with(
            test_config(),
            detector.clone(),
            clicker.clone(),
            Arc::new(AtomicBool::new(false)),
        );

        let mut session = Session::new(SessionMode::ChestOnly);
        let outcome = controller.run_cycle(&mut session).await.unwrap();

        assert_eq!(outcome, CycleOutcome::Stopped);
        assert!(!session.active);
        assert!(!controller.flags().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ocr_unavailable_falls_back_to_default() {
        let mut detector = MockDetector::new(vec![0.9]);
        detector.ocr_unavailable = true;
        let detector = Arc::new(detector);
        let clicker = Arc::new(RecordingClicker::default());
        let controller = controller_with(
            test_config(),
            detector,
            clicker,
            Arc::new(AtomicBool::new(false)),
        );

        assert_eq!(controller.smart_countdown_secs().await, 1800);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ocr_text_overrides_default() {
        let mut detector = MockDetector::new(vec![0.9]);
        detector.countdown_text = Some("29:59".to_string());
        let detector = Arc::new(detector);
        let clicker = Arc::new(RecordingClicker::default());
        let controller = controller_with(
            test_config(),
            detector,
            clicker,
            Arc::new(AtomicBool::new(false)),
        );

        assert_eq!(controller.smart_countdown_secs().await, 1799);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_ocr_text_falls_back_to_default() {
        let mut detector = MockDetector::new(vec![0.9]);
        detector.countdown_text = Some("bongo".to_string());
        let detector = Arc::new(detector);
        let clicker = Arc::new(RecordingClicker::default());
        let controller = controller_with(
            test_config(),
            detector,
            clicker,
            Arc::new(AtomicBool::new(false)),
        );

        assert_eq!(controller.smart_countdown_secs().await, 1800);
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_loss_aborts_cycle_but_not_session() {
        let mut detector = MockDetector::new(vec![0.9]);
        detector.countdown_text = Some("00:30".to_string());
        let detector = Arc::new(detector);
        let clicker = Arc::new(RecordingClicker::default());
        let controller = Arc::new(controller_with(
            test_config(),
            detector.clone(),
            clicker.clone(),
            Arc::new(AtomicBool::new(false)),
        ));

        let task_controller = Arc::clone(&controller);
        let handle = tokio::spawn(async move {
            let mut session = Session::new(SessionMode::ChestOnly);
            task_controller.run_cycle(&mut session).await
        });

        // Игра "умирает" посреди отсчёта
        tokio::time::sleep(Duration::from_secs(5)).await;
        detector.running.store(false, Ordering::Relaxed);

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, CycleOutcome::Continued);
        // До поиска сундука дело не дошло
        assert_eq!(detector.locate_calls(), 0);
        assert_eq!(clicker.click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_terminates_session_within_poll_interval() {
        let mut detector = MockDetector::new(vec![0.9]);
        detector.countdown_text = Some("30:00".to_string());
        let detector = Arc::new(detector);
        let clicker = Arc::new(RecordingClicker::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let controller = Arc::new(controller_with(
            test_config(),
            detector,
            clicker,
            shutdown.clone(),
        ));

        let flags = controller.flags();
        let task_controller = Arc::clone(&controller);
        let handle = tokio::spawn(async move { task_controller.run(SessionMode::ChestOnly).await });

        // Даём сессии войти в отсчёт
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(flags.is_active());

        let cancel_at = Instant::now();
        shutdown.store(true, Ordering::Relaxed);

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(BongoError::Cancelled)));

        // Переход в неактивное состояние за один интервал опроса (<= 2 с)
        assert!(cancel_at.elapsed() <= Duration::from_secs(2));
        assert!(!flags.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_session_completes_all_cycles() {
        let detector = Arc::new(MockDetector::new(vec![0.8]));
        let clicker = Arc::new(RecordingClicker::default());
        let controller = Arc::new(controller_with(
            test_config(),
            detector.clone(),
            clicker.clone(),
            Arc::new(AtomicBool::new(false)),
        ));

        controller.run(SessionMode::Typing).await.unwrap();

        // Один цикл: сундук кликнут, цель печати не превышена
        assert_eq!(clicker.click_count(), 1);
        assert!(controller.total_typed() <= 10);
        assert_eq!(detector.locate_calls(), 1);
    }
}
