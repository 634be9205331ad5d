pub mod game;
pub mod session;

pub use game::{ChestMatch, GameProcessInfo, GameWindow};
pub use session::{ChestAttempt, CycleOutcome, Session, SessionFlags, SessionMode, TypingTarget};

/// Действие над клавишей виртуального устройства
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

impl KeyAction {
    /// Значение события для протокола uinput
    pub fn event_value(&self) -> i32 {
        match self {
            KeyAction::Press => 1,
            KeyAction::Release => 0,
        }
    }
}
