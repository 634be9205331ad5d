//! Detector service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for observing the game
//! (process presence, window geometry, screen/window captures, chest template
//! matching, countdown text recognition). It MUST NOT contain any business
//! logic related to cycles, countdown policy or retry decisions. All of that
//! is made exclusively by SessionController.

mod chest_matcher;
mod detector;
mod dry_run;
mod ocr;
mod proc_scan;
mod ps;
mod r#trait;

pub use self::ocr::parse_countdown_secs;
pub use self::r#trait::{create_detector, Detector};
