pub mod clicker;
pub mod detector;
pub mod session_controller;
pub mod typer;
pub mod virtual_device;

pub use clicker::create_clicker;
pub use detector::create_detector;
pub use session_controller::SessionController;
pub use virtual_device::VirtualDevice;
