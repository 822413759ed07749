//! Retry-with-hooks pipeline wrapped around browser actions.

pub mod helpers;
pub mod options;
pub mod shared_results;

pub use options::{LocalFn, LocalTask, Task, TaskEvents, TaskOptions};
pub use shared_results::SharedResults;

use crate::core::driver::{Driver, WebDriver, WebElement};
use crate::errors::{BrowserError, Result};
use std::future::Future;
use tracing::{error, warn};

/// What an action runs against. Elements resolve to the session that owns
/// them.
#[derive(Clone)]
pub enum Target {
    Session(Driver),
    Element(WebElement),
}

impl Target {
    pub fn driver(&self) -> Driver {
        match self {
            Target::Session(driver) => driver.clone(),
            Target::Element(element) => element.driver(),
        }
    }
}

impl From<Driver> for Target {
    fn from(driver: Driver) -> Self {
        Target::Session(driver)
    }
}

impl From<WebElement> for Target {
    fn from(element: WebElement) -> Self {
        Target::Element(element)
    }
}

async fn execute_local(
    driver: &dyn WebDriver,
    task: &Task,
    results: &mut SharedResults,
) -> Result<()> {
    for local in &task.local {
        local
            .run(results, driver)
            .await
            .map_err(|e| BrowserError::hook(local.name(), e))?;
    }
    Ok(())
}

async fn execute_browser(driver: &dyn WebDriver, task: &Task) -> Result<()> {
    for (index, script) in task.browser.iter().enumerate() {
        driver
            .execute_script(script, vec![])
            .await
            .map_err(|e| BrowserError::hook(&format!("browser[{}]", index), e))?;
    }
    Ok(())
}

/// Local tasks, then browser tasks.
pub async fn execute_before(
    driver: &dyn WebDriver,
    task: &Task,
    results: &mut SharedResults,
) -> Result<()> {
    execute_local(driver, task, results).await?;
    execute_browser(driver, task).await
}

/// Browser tasks, then local tasks.
pub async fn execute_after(
    driver: &dyn WebDriver,
    task: &Task,
    results: &mut SharedResults,
) -> Result<()> {
    execute_browser(driver, task).await?;
    execute_local(driver, task, results).await
}

/// Runs `action` between the before and after hooks of `options`, retrying
/// the whole cycle up to `options.attempts()` times.
///
/// `Ok(None)` is only possible when `validate` is off and no attempt got a
/// value out of the action.
pub async fn run_action<T, F, Fut>(
    mut action: F,
    options: &TaskOptions,
    results: &mut SharedResults,
    target: &Target,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let driver = target.driver();
    let attempts = options.attempts();
    let mut best: Option<T> = None;

    for attempt in 1..=attempts {
        results.start_attempt(attempt);
        let outcome: Result<T> = async {
            execute_before(driver.as_ref(), &options.tasks.before, results).await?;
            let value = action().await?;
            if let Err(e) = execute_after(driver.as_ref(), &options.tasks.after, results).await {
                best = Some(value);
                return Err(e);
            }
            Ok(value)
        }
        .await;
        results.finish_attempt();

        match outcome {
            Ok(value) => return Ok(Some(value)),
            Err(err) if attempt < attempts => {
                warn!(attempt, attempts, error = %err, "attempt {} failed, retrying", attempt);
            }
            Err(err) => {
                error!(attempt, attempts, error = %err, "action failed on its final attempt");
                if options.validate {
                    return Err(err);
                }
                return Ok(best);
            }
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDriver;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn mock_session() -> (Arc<MockDriver>, Target) {
        let mock = Arc::new(
            MockDriver::new().with_page("http://localhost/a.html", "<html><body></body></html>"),
        );
        let driver: Driver = mock.clone();
        (mock, Target::Session(driver))
    }

    fn session() -> Target {
        mock_session().1
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &str) -> LocalFn {
        let log = log.clone();
        let label = name.to_string();
        LocalFn::new(name, move |_| {
            log.lock().unwrap().push(label.clone());
            Ok(())
        })
    }

    #[tokio::test]
    async fn always_failing_action_runs_exactly_retries_times() {
        let calls = AtomicU32::new(0);
        let options = TaskOptions::default().with_retries(3);
        let mut results = SharedResults::new();

        let err = run_action(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(BrowserError::Driver("nope".into())) }
            },
            &options,
            &mut results,
            &session(),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, BrowserError::Driver(_)));
        assert_eq!(results.retry, 3);
    }

    #[tokio::test]
    async fn success_stops_retrying() {
        let calls = AtomicU32::new(0);
        let options = TaskOptions::default().with_retries(5);
        let value = run_action(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 1 {
                        Err(BrowserError::Driver("flaky".into()))
                    } else {
                        Ok(n)
                    }
                }
            },
            &options,
            &mut SharedResults::new(),
            &session(),
        )
        .await
        .unwrap();
        assert_eq!(value, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn hooks_are_symmetric_around_the_action() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let action_log = log.clone();
        let options = TaskOptions::default()
            .with_before(
                Task::new()
                    .with_local(recorder(&log, "before-local"))
                    .with_browser("window.__hooks = ['before-browser'];"),
            )
            .with_after(
                Task::new()
                    .with_local(recorder(&log, "after-local"))
                    .with_browser("window.__hooks.push('after-browser');"),
            );

        let (mock, target) = mock_session();
        run_action(
            || {
                action_log.lock().unwrap().push("action".to_string());
                async { Ok(()) }
            },
            &options,
            &mut SharedResults::new(),
            &target,
        )
        .await
        .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["before-local", "action", "after-local"]
        );
        let scripts = mock.executed_scripts();
        assert_eq!(scripts[0], "window.__hooks = ['before-browser'];");
        assert_eq!(scripts[1], "window.__hooks.push('after-browser');");
    }

    #[tokio::test]
    async fn failing_hook_is_retried_then_swallowed_without_validation() {
        let hook_calls = Arc::new(AtomicU32::new(0));
        let counter = hook_calls.clone();
        let options = TaskOptions::default()
            .with_retries(2)
            .with_validate(false)
            .with_after(Task::new().with_local(LocalFn::new("flaky-after", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BrowserError::Timeout("never settles".into()))
            })));

        let value = run_action(
            || async { Ok("clicked") },
            &options,
            &mut SharedResults::new(),
            &session(),
        )
        .await
        .unwrap();

        assert_eq!(value, Some("clicked"));
        assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_hook_surfaces_as_hook_error_when_validating() {
        let options = TaskOptions::default().with_before(
            Task::new().with_local(LocalFn::new("guard", |_| {
                Err(BrowserError::Driver("bad state".into()))
            })),
        );
        let err = run_action(
            || async { Ok(()) },
            &options,
            &mut SharedResults::new(),
            &session(),
        )
        .await
        .unwrap_err();
        match err {
            BrowserError::Hook { hook, message } => {
                assert_eq!(hook, "guard");
                assert!(message.contains("bad state"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn action_failure_without_validation_yields_none() {
        let options = TaskOptions::default().with_validate(false);
        let value = run_action(
            || async { Err::<u8, _>(BrowserError::Driver("x".into())) },
            &options,
            &mut SharedResults::new(),
            &session(),
        )
        .await
        .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn local_tasks_share_results_across_attempts() {
        let options = TaskOptions::default().with_retries(3).with_before(
            Task::new().with_local(LocalFn::new("count", |results| {
                let seen = results.get("seen").and_then(|v| v.as_u64()).unwrap_or(0);
                results.insert("seen", seen + 1);
                Ok(())
            })),
        );
        let mut results = SharedResults::new();
        let _ = run_action(
            || async { Err::<(), _>(BrowserError::Driver("x".into())) },
            &options,
            &mut results,
            &session(),
        )
        .await;
        assert_eq!(results.get("seen"), Some(&serde_json::json!(3)));
        assert!(results.before_utc_timestamp.is_some());
        assert!(results.after_utc_timestamp.is_some());
    }
}
