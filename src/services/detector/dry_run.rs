use crate::error::Result;
use crate::events::{ChestMatch, GameWindow};
use image::RgbaImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::r#trait::Detector;

// Сценарий dry-run: первый цикл находит сундук сразу, дальше
// чередуются слабые совпадения, демонстрирующие retry-политику
const SCRIPTED_CONFIDENCES: [f64; 3] = [0.85, 0.45, 0.55];

pub struct DryRunDetector {
    locate_calls: AtomicUsize,
}

impl DryRunDetector {
    pub fn new() -> Self {
        info!("Dry-run режим - Detector работает в режиме эмуляции");
        Self {
            locate_calls: AtomicUsize::new(0),
        }
    }

    fn fake_window() -> GameWindow {
        GameWindow::new("Bongo Cat - dry_run".to_string(), 100, 100, 800, 600)
    }
}

impl Default for DryRunDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Detector for DryRunDetector {
    async fn is_game_running(&self) -> Result<bool> {
        info!("Dry-run: эмулируем присутствие процесса игры");
        Ok(true)
    }

    async fn find_game_window(&self) -> Result<GameWindow> {
        Ok(Self::fake_window())
    }

    async fn capture_game_window(&self) -> Result<RgbaImage> {
        let window = Self::fake_window();
        Ok(RgbaImage::new(window.width, window.height))
    }

    async fn capture_screen(&self) -> Result<RgbaImage> {
        Ok(RgbaImage::new(1280, 720))
    }

    fn locate_chest(&self, _screen: &RgbaImage) -> Result<ChestMatch> {
        let call = self.locate_calls.fetch_add(1, Ordering::Relaxed);
        let confidence = SCRIPTED_CONFIDENCES[call % SCRIPTED_CONFIDENCES.len()];
        info!("Dry-run: эмулируем поиск сундука, уверенность {:.2}", confidence);

        Ok(ChestMatch {
            confidence,
            top_left: (42, 42),
            center: (58, 58),
        })
    }

    fn read_countdown_text(&self, _window_image: &RgbaImage) -> Result<Option<String>> {
        // Короткий таймер, чтобы dry-run цикл проходил быстро
        Ok(Some("00:05".to_string()))
    }
}
