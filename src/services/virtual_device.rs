use crate::error::{BongoError, Result};
use crate::events::KeyAction;
use crate::mappings::CharToEvdevCode;
use parking_lot::Mutex;
use tracing::{debug, info};

pub struct VirtualDevice {
    device: Mutex<Option<uinput::Device>>,
    device_name: String,
    dry_run: bool,
}

impl VirtualDevice {
    pub fn new(device_name: &str, dry_run: bool) -> Result<Self> {
        info!("Инициализация VirtualDevice '{}' (dry_run: {})", device_name, dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Self::create_virtual_device(device_name)?)
        };

        Ok(Self {
            device: Mutex::new(device),
            device_name: device_name.to_string(),
            dry_run,
        })
    }

    fn create_virtual_device(device_name: &str) -> Result<uinput::Device> {
        info!("Создание виртуального устройства uinput '{}' для инъекции клавиш", device_name);

        let virtual_device = uinput::default()?
            .name(device_name)
            .map_err(|e| BongoError::Internal(format!("Не удалось задать имя устройства '{}': {}", device_name, e)))?
            .event(uinput::event::Keyboard::All)
            .map_err(|e| BongoError::Internal(format!("Не удалось включить клавиатурные события: {}", e)))?
            .create()
            .map_err(|e| BongoError::Internal(format!("Не удалось создать виртуальное устройство '{}': {}", device_name, e)))?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(virtual_device)
    }

    /// Отправить событие нажатия или отпускания для evdev кода
    pub fn send_key(&self, keycode: u16, action: KeyAction) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Виртуальное событие: код {} {:?}", keycode, action);
            return Ok(());
        }

        debug!("Виртуальное событие: код {} {:?}", keycode, action);

        let mut guard = self.device.lock();
        let device = guard
            .as_mut()
            .ok_or_else(|| BongoError::Internal("Виртуальное устройство недоступно".to_string()))?;

        // Отправляем событие клавиши
        if let Err(e) = device.write(1, keycode as i32, action.event_value()) {
            return Err(BongoError::Internal(format!(
                "Не удалось отправить событие клавиши {}: {}",
                keycode, e
            )));
        }

        // Синхронизируем события
        if let Err(e) = device.write(0, 0, 0) {
            return Err(BongoError::Internal(format!(
                "Не удалось синхронизировать события: {}",
                e
            )));
        }

        Ok(())
    }

    /// Гарантировать отсутствие залипших клавиш: отпустить весь рабочий алфавит
    pub fn release_all(&self) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] release_all пропущен");
            return Ok(());
        }

        for symbol in CharToEvdevCode::supported_charset().chars() {
            if let Ok(code) = CharToEvdevCode::translate(symbol) {
                self.send_key(code, KeyAction::Release)?;
            }
        }

        Ok(())
    }

    #[allow(dead_code)]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if !self.dry_run {
            info!("Закрытие виртуального устройства '{}'", self.device_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_device_accepts_events() {
        let device = VirtualDevice::new("bongo-test", true).unwrap();
        assert!(device.send_key(30, KeyAction::Press).is_ok());
        assert!(device.send_key(30, KeyAction::Release).is_ok());
        assert!(device.release_all().is_ok());
        assert_eq!(device.device_name(), "bongo-test");
    }
}
