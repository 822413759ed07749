use crate::core::driver::WebDriver;
use crate::errors::Result;
use serde_json::Value;
use std::time::Duration;

pub const READY_STATE: &str = "return document.readyState;";

pub const ELEMENTS_EQUAL: &str = "return arguments[0] === arguments[1];";

pub const SUBMIT_FORM: &str = r#"var el = arguments[0];
var form = el.tagName && el.tagName.toLowerCase() === 'form'
    ? el : (el.form || (el.closest && el.closest('form')));
if (!form) { throw new Error('no such element: element is not inside a form'); }
if (form.requestSubmit) { form.requestSubmit(); } else { form.submit(); }
return null;"#;

/// Saves the page's context-menu handler under `<prefix>OriginalOnContextMenuHandler`
/// and replaces it with one that swallows the event.
pub fn suppress_context_menu(prefix: &str) -> String {
    format!(
        "window.{p}OriginalOnContextMenuHandler = window.oncontextmenu;\n\
         window.oncontextmenu = () => false;",
        p = prefix
    )
}

pub fn restore_context_menu(prefix: &str) -> String {
    format!(
        "window.oncontextmenu = window.{p}OriginalOnContextMenuHandler;\n\
         delete window.{p}OriginalOnContextMenuHandler;",
        p = prefix
    )
}

pub struct JavaScriptRunner;

impl JavaScriptRunner {
    pub async fn execute(driver: &dyn WebDriver, script: &str) -> Result<Value> {
        driver.execute_script(script, vec![]).await
    }

    /// Polls a script until it returns `true`. `Ok(false)` means the
    /// timeout elapsed; script failures are returned as they are.
    pub async fn wait_for_condition(
        driver: &dyn WebDriver,
        condition: &str,
        timeout_ms: u64,
        poll_interval_ms: u64,
    ) -> Result<bool> {
        let poll_interval = Duration::from_millis(poll_interval_ms);
        let polling = async {
            loop {
                let value = driver.execute_script(condition, vec![]).await?;
                if value.as_bool().unwrap_or(false) {
                    return Ok(());
                }
                tokio::time::sleep(poll_interval).await;
            }
        };
        match tokio::time::timeout(Duration::from_millis(timeout_ms), polling).await {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(false),
        }
    }

    pub async fn ready_state(driver: &dyn WebDriver) -> Result<String> {
        let value = driver.execute_script(READY_STATE, vec![]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BrowserError;
    use crate::testing::MockDriver;

    #[test]
    fn context_menu_scripts_share_the_prefix() {
        let install = suppress_context_menu("__p1");
        let restore = restore_context_menu("__p1");
        assert!(install.contains("window.__p1OriginalOnContextMenuHandler = window.oncontextmenu;"));
        assert!(install.contains("window.oncontextmenu = () => false;"));
        assert!(restore.contains("window.oncontextmenu = window.__p1OriginalOnContextMenuHandler;"));
        assert!(restore.contains("delete window.__p1OriginalOnContextMenuHandler;"));
    }

    #[tokio::test(start_paused = true)]
    async fn condition_that_never_holds_reports_false() {
        let driver = MockDriver::new();
        driver.on_script("window.ready", Value::Bool(false));
        let done = JavaScriptRunner::wait_for_condition(&driver, "return window.ready;", 2000, 100)
            .await
            .unwrap();
        assert!(!done);
    }

    #[tokio::test(start_paused = true)]
    async fn script_timeouts_are_not_read_as_an_unmet_condition() {
        let driver = MockDriver::new();
        driver.fail_next(
            "execute_script",
            BrowserError::Timeout("script timeout".to_string()),
        );
        let err = JavaScriptRunner::wait_for_condition(&driver, "return window.ready;", 2000, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::Timeout(ref m) if m == "script timeout"));
    }
}
