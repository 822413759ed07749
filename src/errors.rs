use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Session failed: {0}")]
    SessionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// A locator kept resolving to the wrong number of elements until its
    /// timeout elapsed.
    #[error("Failed to find {description}")]
    NotFound { description: String },

    /// The element a lookup was scoped to has left the document.
    #[error("Stale root: {0}")]
    StaleRoot(String),

    #[error("{0}")]
    StaleElement(String),

    #[error("{0}")]
    NoSuchElement(String),

    #[error("{0}")]
    ClickIntercepted(String),

    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid url: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, BrowserError>;

impl From<anyhow::Error> for BrowserError {
    fn from(err: anyhow::Error) -> Self {
        BrowserError::AnyhowError(err.to_string())
    }
}

impl BrowserError {
    pub fn hook<E: std::fmt::Display>(hook: &str, err: E) -> Self {
        BrowserError::Hook {
            hook: hook.to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowserError::NotFound { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            BrowserError::StaleElement(_) | BrowserError::StaleRoot(_)
        )
    }

    /// Classifies a raw error message coming back from a remote end by the
    /// W3C error codes it carries.
    pub fn from_driver_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("stale element reference") {
            BrowserError::StaleElement(message)
        } else if lower.contains("no such element") {
            BrowserError::NoSuchElement(message)
        } else if lower.contains("element click intercepted") {
            BrowserError::ClickIntercepted(message)
        } else if lower.contains("javascript error") {
            BrowserError::JavaScriptFailed(message)
        } else if lower.contains("timeout") {
            BrowserError::Timeout(message)
        } else {
            BrowserError::Driver(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_starts_with_failed_to_find() {
        let err = BrowserError::NotFound {
            description: "see(\"Cheese\")".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to find see(\"Cheese\")");
        assert!(err.is_not_found());
    }

    #[test]
    fn driver_messages_are_classified() {
        assert!(matches!(
            BrowserError::from_driver_message("stale element reference: element is not attached"),
            BrowserError::StaleElement(_)
        ));
        assert!(matches!(
            BrowserError::from_driver_message("element click intercepted: Other element would receive the click"),
            BrowserError::ClickIntercepted(_)
        ));
        assert!(matches!(
            BrowserError::from_driver_message("unknown error: chrome not reachable"),
            BrowserError::Driver(_)
        ));
    }

    #[test]
    fn click_intercepted_keeps_the_raw_message() {
        let err = BrowserError::ClickIntercepted("Other element would receive the click".into());
        assert_eq!(err.to_string(), "Other element would receive the click");
    }
}
