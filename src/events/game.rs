use std::fmt;

/// Информация о найденном процессе игры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProcessInfo {
    pub pid: i32,
    pub name: String,
}

impl GameProcessInfo {
    pub fn new(pid: i32, name: String) -> Self {
        Self { pid, name }
    }
}

impl fmt::Display for GameProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

/// Геометрия окна игры в экранных координатах
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameWindow {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl GameWindow {
    pub fn new(title: String, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            title,
            x,
            y,
            width,
            height,
        }
    }

    /// Окно считается пригодным, если оно видимо и имеет разумный размер.
    /// Некоторые оконные менеджеры дают y = -1 для валидных окон.
    pub fn is_usable(&self) -> bool {
        self.x >= -1000 && self.y >= -1000 && self.width > 100 && self.height > 100
    }

    /// Точка в области счётчика/таймера (левый блок под котом)
    pub fn timer_area_point(&self) -> (i32, i32) {
        (
            self.x + (self.width / 4) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

impl fmt::Display for GameWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}, {}) {}x{}",
            self.title, self.x, self.y, self.width, self.height
        )
    }
}

/// Результат поиска шаблона сундука на снимке экрана
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChestMatch {
    /// Уверенность совпадения в [0, 1]
    pub confidence: f64,
    /// Левый верхний угол найденной области
    pub top_left: (u32, u32),
    /// Центр найденной области — точка клика
    pub center: (u32, u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_usability() {
        let ok = GameWindow::new("Bongo Cat".to_string(), 100, -1, 800, 600);
        assert!(ok.is_usable());

        let minimized = GameWindow::new("Bongo Cat".to_string(), -32000, -32000, 800, 600);
        assert!(!minimized.is_usable());

        let tiny = GameWindow::new("Bongo Cat".to_string(), 0, 0, 50, 40);
        assert!(!tiny.is_usable());
    }

    #[test]
    fn test_timer_area_point() {
        let window = GameWindow::new("Bongo Cat".to_string(), 100, 200, 800, 600);
        assert_eq!(window.timer_area_point(), (300, 500));
    }
}
