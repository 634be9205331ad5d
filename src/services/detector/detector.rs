use crate::bongo_error;
use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::{BongoError, Result};
use crate::events::{ChestMatch, GameProcessInfo, GameWindow};
use image::RgbaImage;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::chest_matcher::ChestMatcher;
use super::ocr::TesseractReader;
use super::proc_scan::ProcScanProbe;
use super::ps::PsProbe;
use super::r#trait::Detector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkingProbe {
    Ps,
    ProcScan,
}

pub struct RealDetector {
    config: Arc<Config>,
    chest_matcher: ChestMatcher,
    ocr: TesseractReader,
    ps: PsProbe,
    proc_scan: ProcScanProbe,
    working_probe: RwLock<Option<WorkingProbe>>,
    // Кэш геометрии окна игры между снимками
    game_window: RwLock<Option<GameWindow>>,
}

impl RealDetector {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("Инициализация RealDetector");

        let chest_matcher = ChestMatcher::new(&config.chest.template_path)?;

        Ok(Self {
            config,
            chest_matcher,
            ocr: TesseractReader::new(),
            ps: PsProbe::new(),
            proc_scan: ProcScanProbe::new(),
            working_probe: RwLock::new(None),
            game_window: RwLock::new(None),
        })
    }

    async fn detect_working_probe(&self) -> Result<WorkingProbe> {
        info!("Определяем рабочий метод перечисления процессов...");

        if self.ps.test().await.is_ok() {
            info!("Используем ps");
            return Ok(WorkingProbe::Ps);
        }

        if self.proc_scan.test().await.is_ok() {
            info!("Используем сканирование /proc");
            return Ok(WorkingProbe::ProcScan);
        }

        Err(bongo_error!(
            internal,
            "Ни один метод перечисления процессов не работает"
        ))
    }

    async fn list_by_probe(&self, probe: WorkingProbe) -> Result<Vec<GameProcessInfo>> {
        match probe {
            WorkingProbe::Ps => self.ps.list_processes().await,
            WorkingProbe::ProcScan => self.proc_scan.list_processes().await,
        }
    }

    async fn list_processes(&self) -> Result<Vec<GameProcessInfo>> {
        let cached = *self.working_probe.read();
        let probe = match cached {
            Some(probe) => probe,
            None => {
                let probe = self.detect_working_probe().await?;
                *self.working_probe.write() = Some(probe);
                probe
            }
        };

        match self.list_by_probe(probe).await {
            Ok(processes) => Ok(processes),
            Err(e) => {
                warn!(
                    "Рабочий метод {:?} перестал работать: {}. Переопределяем...",
                    probe, e
                );
                let new_probe = self.detect_working_probe().await?;
                *self.working_probe.write() = Some(new_probe);
                self.list_by_probe(new_probe).await
            }
        }
    }

    /// Найти окно игры среди всех окон системы
    fn find_xcap_window(&self) -> Result<xcap::Window> {
        let windows = xcap::Window::all()
            .map_err(|e| BongoError::Capture(format!("Не удалось перечислить окна: {}", e)))?;

        for window in windows {
            let Ok(title) = window.title() else {
                continue;
            };

            if !self.config.matches_game_window(&title) {
                continue;
            }

            let geometry = Self::window_geometry(&window, title.clone());
            match geometry {
                Ok(game_window) if game_window.is_usable() => {
                    debug_if_enabled!("Найдено окно игры: {}", game_window);
                    *self.game_window.write() = Some(game_window);
                    return Ok(window);
                }
                Ok(game_window) => {
                    debug!("Окно игры найдено, но непригодно: {}", game_window);
                }
                Err(e) => {
                    debug!("Не удалось прочитать геометрию окна '{}': {}", title, e);
                }
            }
        }

        BongoError::window_not_found(format!(
            "Ни одно окно не подходит под паттерны {:?}",
            self.config.game.window_title_patterns
        ))
    }

    fn window_geometry(window: &xcap::Window, title: String) -> Result<GameWindow> {
        let to_capture_err =
            |e: xcap::XCapError| BongoError::Capture(format!("Геометрия окна: {}", e));

        Ok(GameWindow::new(
            title,
            window.x().map_err(to_capture_err)?,
            window.y().map_err(to_capture_err)?,
            window.width().map_err(to_capture_err)?,
            window.height().map_err(to_capture_err)?,
        ))
    }
}

#[async_trait::async_trait]
impl Detector for RealDetector {
    async fn is_game_running(&self) -> Result<bool> {
        let processes = self.list_processes().await?;

        let matches: Vec<&GameProcessInfo> = processes
            .iter()
            .filter(|p| self.config.matches_game_process(&p.name))
            .collect();

        if !matches.is_empty() {
            debug_if_enabled!(
                "Обнаружены процессы игры: {:?}",
                matches.iter().map(|p| p.to_string()).collect::<Vec<_>>()
            );
        }

        Ok(!matches.is_empty())
    }

    async fn find_game_window(&self) -> Result<GameWindow> {
        self.find_xcap_window()?;

        let cached = self.game_window.read().clone();
        cached.ok_or_else(|| {
            BongoError::WindowNotFound("Геометрия окна игры недоступна".to_string())
        })
    }

    async fn capture_game_window(&self) -> Result<RgbaImage> {
        let window = self.find_xcap_window()?;
        window
            .capture_image()
            .map_err(|e| BongoError::Capture(format!("Снимок окна игры: {}", e)))
    }

    async fn capture_screen(&self) -> Result<RgbaImage> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| BongoError::Capture(format!("Не удалось перечислить мониторы: {}", e)))?;

        let monitor = monitors
            .first()
            .ok_or_else(|| bongo_error!(capture, "Мониторы не найдены"))?;

        monitor
            .capture_image()
            .map_err(|e| BongoError::Capture(format!("Снимок экрана: {}", e)))
    }

    fn locate_chest(&self, screen: &RgbaImage) -> Result<ChestMatch> {
        self.chest_matcher.locate(screen)
    }

    fn read_countdown_text(&self, window_image: &RgbaImage) -> Result<Option<String>> {
        if self.config.countdown.ocr_mode == "off" {
            return Err(BongoError::ServiceUnavailable(
                "OCR отключен в конфигурации".to_string(),
            ));
        }

        self.ocr.test()?;

        // Область таймера: левый блок под котом
        let (w, h) = (window_image.width(), window_image.height());
        let timer_region =
            image::imageops::crop_imm(window_image, w / 6, h / 3, w / 3 - w / 6, h / 2 - h / 3)
                .to_image();

        self.ocr.read_text(&timer_region)
    }
}
