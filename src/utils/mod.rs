pub mod javascript;
pub mod polling;
pub mod screenshot;

pub use javascript::JavaScriptRunner;
pub use polling::wait_until;
pub use screenshot::ScreenshotManager;
