//! Backend connection settings for the messaging request handler
//!
//! Host, timeout and the fixed SDK-identifying headers live in one value
//! handed to [`MessagingRequestHandler`](crate::messaging::MessagingRequestHandler)
//! at construction, so tests can point the handler at a local server.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default FCM backend host
pub const DEFAULT_HOST: &str = "fcm.googleapis.com";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the messaging backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Host used when the caller does not name one explicitly
    pub host: String,
    /// URL scheme, `https` in production
    pub scheme: String,
    /// Request timeout in milliseconds (0 disables the timeout)
    pub timeout_ms: u64,
    /// Headers sent with every request
    pub headers: HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            scheme: "https".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headers: HashMap::from([
                ("Sdk-Version".to_string(), format!("Rust/Admin/{}", crate::VERSION)),
                ("access_token_auth".to_string(), "true".to_string()),
            ]),
        }
    }
}

impl BackendConfig {
    /// Set the default host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the URL scheme
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Add or replace a fixed header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Request timeout, or `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Build an absolute URL for `path` on `host`
    pub fn url_for(&self, host: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, host, path)
    }
}
