pub mod config;
pub mod driver;

pub use config::{BrowserConfig, Capabilities, Config, TaskConfig, TimeoutConfig};
pub use driver::{Driver, ElementRef, FrameTarget, WebDriver, WebElement, ELEMENT_KEY};
