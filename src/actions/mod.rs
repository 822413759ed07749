//! Positional chained actions (`see`, `click`, `find`, ...), keyboard
//! constants and the wait-strategy registry.

pub mod base;
pub mod chain;
pub mod context;
pub mod find;
pub mod keys;
pub mod registry;

pub use base::{click_with_recovery, is_masked_input_interception, Position, Slowness};
pub use chain::{ChainedAction, NotChain};
pub use context::{ActionContext, PositionalLocator};
pub use find::{retrying_find, FindOptions, FindOutcome};
pub use registry::{ScriptWait, WaitRegistry, WaitStrategy, DOCUMENT_READY};
