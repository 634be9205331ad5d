use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Режим работы сессии
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    /// Печать случайных символов + клик по сундуку каждый цикл
    Typing,
    /// Только клик по сундуку, без печати
    ChestOnly,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Typing => write!(f, "typing"),
            SessionMode::ChestOnly => write!(f, "chest-only"),
        }
    }
}

/// Исход одного цикла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Цикл завершён, сессия продолжается
    Continued,
    /// Сессия должна остановиться (исчерпаны попытки поиска сундука)
    Stopped,
}

/// Состояние сессии. Одновременно активен не более одного цикла.
#[derive(Debug)]
pub struct Session {
    pub mode: SessionMode,
    pub cycle_index: u64,
    pub active: bool,
}

impl Session {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            cycle_index: 0,
            active: false,
        }
    }

    /// Начать новый цикл. Инвариант: предыдущий цикл уже завершён.
    pub fn begin_cycle(&mut self) -> u64 {
        debug_assert!(!self.active, "предыдущий цикл ещё активен");
        self.cycle_index += 1;
        self.active = true;
        self.cycle_index
    }

    pub fn end_cycle(&mut self) {
        self.active = false;
    }
}

/// Флаги, разделяемые между задачей отсчёта (писатель) и фоновой задачей
/// печати (читатель). Один писатель / один читатель, поэтому достаточно
/// relaxed-атомиков без блокировок.
#[derive(Debug, Default)]
pub struct SessionFlags {
    stop: AtomicBool,
    active: AtomicBool,
}

impl SessionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Писатель: начало цикла
    pub fn begin_cycle(&self) {
        self.stop.store(false, Ordering::Relaxed);
        self.active.store(true, Ordering::Relaxed);
    }

    /// Писатель: остановить фоновую печать, цикл продолжается
    pub fn stop_typing(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Писатель: цикл завершён
    pub fn end_cycle(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Читатель: проверяется перед каждым эмитируемым действием
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || !self.active.load(Ordering::Relaxed)
    }
}

/// Цель печати на цикл. Каждый символ резервируется атомарно до эмиссии,
/// поэтому chars_done никогда не превышает chars_goal.
#[derive(Debug, Clone)]
pub struct TypingTarget {
    chars_goal: u64,
    chars_done: Arc<AtomicU64>,
}

impl TypingTarget {
    pub fn new(chars_goal: u64) -> Self {
        Self {
            chars_goal,
            chars_done: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn chars_goal(&self) -> u64 {
        self.chars_goal
    }

    pub fn chars_done(&self) -> u64 {
        self.chars_done.load(Ordering::Relaxed)
    }

    /// Зарезервировать один символ. false — цель уже достигнута.
    pub fn try_claim(&self) -> bool {
        self.chars_done
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |done| {
                if done < self.chars_goal {
                    Some(done + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    pub fn is_met(&self) -> bool {
        self.chars_done() >= self.chars_goal
    }
}

/// Одна попытка поиска сундука внутри retry-последовательности
#[derive(Debug, Clone, Copy)]
pub struct ChestAttempt {
    pub attempt_number: u32,
    pub max_attempts: u32,
    pub confidence: f64,
}

impl fmt::Display for ChestAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "попытка {}/{}, уверенность {:.4}",
            self.attempt_number, self.max_attempts, self.confidence
        )
    }
}
