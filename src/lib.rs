//! A retrying, lazily-resolving browser automation DSL on top of WebDriver.
//!
//! `Browser` is the entry point: it hands out lazy element finders
//! (`element`, `all`) and positional chained actions (`actions`), and runs
//! session commands through a retry-with-hooks pipeline.

pub mod actions;
pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod logging;
pub mod task;
pub mod testing;
pub mod types;
pub mod utils;

pub use actions::{keys, ChainedAction, FindOptions, Position, Slowness, WaitRegistry};
pub use browser::{Browser, DriverProvider, Navigation};
pub use crate::core::{Config, Driver, ElementRef, WebDriver, WebElement};
pub use dom::{By, ElementArrayFinder, ElementFinder, Locator};
pub use errors::{BrowserError, Result};
pub use task::{SharedResults, Task, TaskEvents, TaskOptions};
pub use types::*;
