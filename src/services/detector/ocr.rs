use crate::error::{BongoError, Result};
use image::RgbaImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;
use tracing::debug;

// Формат таймера игры: MM:SS
static TIMER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("корректное регулярное выражение"));

/// Чтение текста таймера через внешний бинарь tesseract.
/// Движок трактуется как внешний сервис: отсутствие бинаря - ServiceUnavailable,
/// вызывающая сторона обязана уметь деградировать на значение по умолчанию.
pub struct TesseractReader;

impl TesseractReader {
    pub fn new() -> Self {
        Self
    }

    /// Проверить доступность движка распознавания
    pub fn test(&self) -> Result<()> {
        let output = Command::new("tesseract")
            .arg("--version")
            .output()
            .map_err(|e| {
                BongoError::ServiceUnavailable(format!("tesseract не найден: {}", e))
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BongoError::ServiceUnavailable(
                "tesseract --version вернул ошибку".to_string(),
            ))
        }
    }

    /// Распознать текст на изображении. Ограничиваем алфавит цифрами и
    /// двоеточием (--psm 8: одна строка-слово).
    pub fn read_text(&self, image: &RgbaImage) -> Result<Option<String>> {
        let tmp = tempfile::tempdir()?;
        let image_path = tmp.path().join("timer.png");
        image.save(&image_path)?;

        let output = Command::new("tesseract")
            .arg(&image_path)
            .arg("stdout")
            .args(["--psm", "8", "-c", "tessedit_char_whitelist=0123456789:"])
            .output()
            .map_err(|e| {
                BongoError::ServiceUnavailable(format!("tesseract не найден: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BongoError::Internal(format!(
                "tesseract вернул ошибку: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("OCR прочитал текст таймера: '{}'", text);

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}

/// Разобрать текст таймера MM:SS в секунды.
/// Секунды >= 60 означают ошибку распознавания и отвергаются.
pub fn parse_countdown_secs(text: &str) -> Option<u64> {
    let captures = TIMER_RE.captures(text.trim())?;

    let minutes: u64 = captures.get(1)?.as_str().parse().ok()?;
    let seconds: u64 = captures.get(2)?.as_str().parse().ok()?;

    if seconds >= 60 {
        return None;
    }

    Some(minutes * 60 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_timers() {
        assert_eq!(parse_countdown_secs("29:59"), Some(1799));
        assert_eq!(parse_countdown_secs("03:41"), Some(221));
        assert_eq!(parse_countdown_secs("0:05"), Some(5));
        assert_eq!(parse_countdown_secs("  12:00  "), Some(720));
    }

    #[test]
    fn test_parse_timer_inside_noise() {
        // OCR часто добавляет мусорные символы вокруг таймера
        assert_eq!(parse_countdown_secs("::12:34:"), Some(754));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_countdown_secs(""), None);
        assert_eq!(parse_countdown_secs("bongo"), None);
        assert_eq!(parse_countdown_secs("1234"), None);
        assert_eq!(parse_countdown_secs("12:99"), None);
    }
}
