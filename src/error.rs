use thiserror::Error;

#[derive(Error, Debug)]
pub enum BongoError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Ошибка обработки изображения: {0}")]
    Image(#[from] image::ImageError),

    #[error("Процесс игры не найден: {0}")]
    ProcessNotFound(String),

    #[error("Окно игры не найдено: {0}")]
    WindowNotFound(String),

    #[error("Ошибка захвата экрана: {0}")]
    Capture(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Сундук не найден после {attempts} попыток (лучшая уверенность: {best_confidence:.4})")]
    ChestNotFound { attempts: u32, best_confidence: f64 },

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сессия отменена пользователем")]
    Cancelled,

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl BongoError {
    pub fn window_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(BongoError::WindowNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, BongoError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! bongo_error {
    (process_not_found, $($arg:tt)*) => {
        $crate::error::BongoError::ProcessNotFound(format!($($arg)*))
    };
    (window_not_found, $($arg:tt)*) => {
        $crate::error::BongoError::WindowNotFound(format!($($arg)*))
    };
    (capture, $($arg:tt)*) => {
        $crate::error::BongoError::Capture(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::BongoError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::BongoError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::BongoError::Internal(format!($($arg)*))
    };
}
