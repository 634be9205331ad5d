use crate::config::Config;
use crate::error::Result;
use crate::events::{ChestMatch, GameWindow};
use image::RgbaImage;
use std::sync::Arc;

/// Trait for game detectors that can run in different modes
#[async_trait::async_trait]
pub trait Detector: Send + Sync {
    /// Наблюдается ли процесс игры в системе
    async fn is_game_running(&self) -> Result<bool>;

    /// Найти окно игры и вернуть его геометрию
    async fn find_game_window(&self) -> Result<GameWindow>;

    /// Снимок окна игры
    async fn capture_game_window(&self) -> Result<RgbaImage>;

    /// Снимок всего экрана
    async fn capture_screen(&self) -> Result<RgbaImage>;

    /// Поиск шаблона сундука на снимке
    fn locate_chest(&self, screen: &RgbaImage) -> Result<ChestMatch>;

    /// Сырой текст таймера из снимка окна игры.
    /// Err(ServiceUnavailable) - движок распознавания недоступен.
    fn read_countdown_text(&self, window_image: &RgbaImage) -> Result<Option<String>>;
}

/// Factory function to create an appropriate detector based on the dry_run flag
pub fn create_detector(config: Arc<Config>, dry_run: bool) -> Result<Arc<dyn Detector>> {
    if dry_run {
        Ok(Arc::new(super::dry_run::DryRunDetector::new()))
    } else {
        Ok(Arc::new(super::detector::RealDetector::new(config)?))
    }
}
