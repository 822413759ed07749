use crate::core::config::TaskConfig;
use crate::core::driver::WebDriver;
use crate::errors::Result;
use crate::task::shared_results::SharedResults;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A hook run in-process around an action.
#[async_trait]
pub trait LocalTask: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, results: &mut SharedResults, driver: &dyn WebDriver) -> Result<()>;
}

type LocalClosure = dyn Fn(&mut SharedResults) -> Result<()> + Send + Sync;

/// Adapts a synchronous closure into a `LocalTask`.
pub struct LocalFn {
    name: String,
    func: Box<LocalClosure>,
}

impl LocalFn {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut SharedResults) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl LocalTask for LocalFn {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, results: &mut SharedResults, _driver: &dyn WebDriver) -> Result<()> {
        (self.func)(results)
    }
}

/// Hooks of one phase. Browser tasks are script bodies executed in the page
/// and cannot see the shared results.
#[derive(Clone, Default)]
pub struct Task {
    pub local: Vec<Arc<dyn LocalTask>>,
    pub browser: Vec<String>,
}

impl Task {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local<T: LocalTask + 'static>(mut self, task: T) -> Self {
        self.local.push(Arc::new(task));
        self
    }

    pub fn with_local_arc(mut self, task: Arc<dyn LocalTask>) -> Self {
        self.local.push(task);
        self
    }

    pub fn with_browser(mut self, script: impl Into<String>) -> Self {
        self.browser.push(script.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.browser.is_empty()
    }

    /// `self` followed by `other`.
    pub fn merged(&self, other: &Task) -> Task {
        let mut local = self.local.clone();
        local.extend(other.local.iter().cloned());
        let mut browser = self.browser.clone();
        browser.extend(other.browser.iter().cloned());
        Task { local, browser }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.local.iter().map(|t| t.name()).collect();
        f.debug_struct("Task")
            .field("local", &names)
            .field("browser", &self.browser.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskEvents {
    pub before: Task,
    pub after: Task,
}

impl TaskEvents {
    pub fn new(before: Task, after: Task) -> Self {
        Self { before, after }
    }

    pub fn merged(&self, other: &TaskEvents) -> TaskEvents {
        TaskEvents {
            before: self.before.merged(&other.before),
            after: self.after.merged(&other.after),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskOptions {
    pub tasks: TaskEvents,
    pub retries: u32,
    pub validate: bool,
    pub use_defaults: bool,
    /// Wait strategy to apply instead of the session default.
    pub wait_strategy: Option<String>,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self::from_config(&TaskConfig::default())
    }
}

impl TaskOptions {
    pub fn from_config(config: &TaskConfig) -> Self {
        Self {
            tasks: TaskEvents::default(),
            retries: config.retries,
            validate: config.validate,
            use_defaults: config.use_defaults,
            wait_strategy: None,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_use_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }

    pub fn with_before(mut self, task: Task) -> Self {
        self.tasks.before = task;
        self
    }

    pub fn with_after(mut self, task: Task) -> Self {
        self.tasks.after = task;
        self
    }

    pub fn with_wait_strategy(mut self, name: impl Into<String>) -> Self {
        self.wait_strategy = Some(name.into());
        self
    }

    /// Number of attempts the pipeline makes.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    /// Options with `defaults` run ahead of the caller's own tasks when
    /// `use_defaults` is set.
    pub fn with_default_tasks(&self, defaults: &TaskEvents) -> TaskOptions {
        let mut options = self.clone();
        if self.use_defaults {
            options.tasks = defaults.merged(&self.tasks);
        }
        options
    }
}
