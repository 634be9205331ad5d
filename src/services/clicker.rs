use crate::error::{BongoError, Result};
use std::process::Command;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Trait for mouse clickers that can run in different modes
#[async_trait::async_trait]
pub trait MouseClicker: Send + Sync {
    /// Передвинуть курсор и выполнить двойной клик в экранных координатах
    async fn click_at(&self, x: i32, y: i32) -> Result<()>;

    /// Активировать окно по подстроке заголовка (best-effort)
    async fn activate_window(&self, title_pattern: &str) -> Result<()>;
}

/// Factory function to create an appropriate clicker based on the dry_run flag
pub fn create_clicker(dry_run: bool) -> Result<Arc<dyn MouseClicker>> {
    if dry_run {
        Ok(Arc::new(DryRunClicker::new()))
    } else {
        let clicker = XdotoolClicker::new();
        if let Err(e) = clicker.test() {
            warn!("xdotool недоступен - клики будут пропускаться: {}", e);
        }
        Ok(Arc::new(clicker))
    }
}

pub struct XdotoolClicker;

impl XdotoolClicker {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("xdotool").arg("version").output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BongoError::Internal("xdotool failed".to_string()))
        }
    }

    fn run_xdotool(args: &[&str]) -> Result<String> {
        let output = Command::new("xdotool").args(args).output().map_err(|e| {
            debug!("xdotool не найден или не работает: {}", e);
            BongoError::ServiceUnavailable(format!("xdotool не найден: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("xdotool вернул ошибку: {}", stderr);
            return Err(BongoError::Internal(format!(
                "xdotool вернул ошибку: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for XdotoolClicker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MouseClicker for XdotoolClicker {
    async fn click_at(&self, x: i32, y: i32) -> Result<()> {
        debug!("Клик по координатам ({}, {})", x, y);

        Self::run_xdotool(&["mousemove", &x.to_string(), &y.to_string()])?;
        sleep(Duration::from_millis(200)).await;

        // Двойной клик для надёжности
        Self::run_xdotool(&["click", "1"])?;
        sleep(Duration::from_millis(200)).await;
        Self::run_xdotool(&["click", "1"])?;

        Ok(())
    }

    async fn activate_window(&self, title_pattern: &str) -> Result<()> {
        debug!("Активация окна по паттерну '{}'", title_pattern);

        let window_id = Self::run_xdotool(&["search", "--name", title_pattern])?;
        let first_id = window_id.lines().next().ok_or_else(|| {
            BongoError::WindowNotFound(format!("xdotool не нашёл окно '{}'", title_pattern))
        })?;

        Self::run_xdotool(&["windowactivate", first_id])?;
        sleep(Duration::from_millis(500)).await;

        Ok(())
    }
}

pub struct DryRunClicker;

impl DryRunClicker {
    pub fn new() -> Self {
        info!("Dry-run режим - MouseClicker работает в режиме эмуляции");
        Self
    }
}

impl Default for DryRunClicker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MouseClicker for DryRunClicker {
    async fn click_at(&self, x: i32, y: i32) -> Result<()> {
        info!("[DRY RUN] Клик по координатам ({}, {})", x, y);
        Ok(())
    }

    async fn activate_window(&self, title_pattern: &str) -> Result<()> {
        info!("[DRY RUN] Активация окна '{}'", title_pattern);
        Ok(())
    }
}
