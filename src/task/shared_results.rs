use crate::types::Cookie;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Diagnostic snapshots collected while one action runs, across all of its
/// attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedResults {
    pub url: Option<String>,
    pub before_url: Option<String>,
    pub after_url: Option<String>,
    pub before_cookies: Option<Vec<Cookie>>,
    pub after_cookies: Option<Vec<Cookie>>,
    pub after_document_ready_state: Option<String>,
    pub after_page_source: Option<String>,
    pub before_active_element: Option<String>,
    pub after_active_element: Option<String>,
    pub before_window_handle: Option<String>,
    pub after_window_handle: Option<String>,
    pub before_utc_timestamp: Option<DateTime<Utc>>,
    pub after_utc_timestamp: Option<DateTime<Utc>>,
    /// 1-based index of the latest attempt.
    pub retry: u32,
    pub duration: Option<Duration>,
    #[serde(default)]
    extras: HashMap<String, Value>,
}

impl SharedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value for user-defined hooks.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extras.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.extras.remove(key)
    }

    pub fn extras(&self) -> &HashMap<String, Value> {
        &self.extras
    }

    pub(crate) fn start_attempt(&mut self, attempt: u32) {
        self.retry = attempt;
        self.before_utc_timestamp = Some(Utc::now());
        self.after_utc_timestamp = None;
        self.duration = None;
    }

    pub(crate) fn finish_attempt(&mut self) {
        let now = Utc::now();
        self.after_utc_timestamp = Some(now);
        self.duration = self
            .before_utc_timestamp
            .and_then(|start| (now - start).to_std().ok());
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
