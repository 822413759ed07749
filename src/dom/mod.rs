pub mod by;
pub mod element;
pub mod element_array;
pub mod finders;
pub mod locator;

pub use by::By;
pub use element::ElementFinder;
pub use element_array::ElementArrayFinder;
pub use locator::{CustomLocator, ElementResolver, Locator, NativeLocator, ScriptFinder, Strategy};
