//! Request configuration passed through the client layers
//!
//! A [`RequestConfig`] is plain owned data. Layers that need to change it
//! (the authorizing client adds a header) work on a clone, so a config
//! template can be reused across concurrent calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// HTTP method for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload
///
/// `Json` is serialized by the transport and must hold a JSON object. To send
/// a JSON leaf value, serialize it yourself and pass it as `Text` or `Bytes`
/// with a matching `Content-Type` header.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// A fully-resolved outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    pub headers: HashMap<String, String>,
    pub data: Option<RequestData>,
    /// Abort the exchange after this long; zero means no timeout
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            data: None,
            timeout: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.data = Some(RequestData::Json(body));
        self
    }

    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.data = Some(RequestData::Text(body.into()));
        self
    }

    pub fn with_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.data = Some(RequestData::Bytes(body.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The timeout to enforce, ignoring zero
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }

    /// Look up a header ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Short `METHOD url` label used in logs and error messages
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let config = RequestConfig::new(HttpMethod::Post, "https://fcm.googleapis.com/v1/x")
            .with_header("Sdk-Version", "Rust/Admin/0.1.0")
            .with_json(json!({"message": {"topic": "news"}}))
            .with_timeout(Duration::from_millis(500));

        assert_eq!(config.describe(), "POST https://fcm.googleapis.com/v1/x");
        assert_eq!(config.header("sdk-version"), Some("Rust/Admin/0.1.0"));
        assert_eq!(config.effective_timeout(), Some(Duration::from_millis(500)));
        assert!(matches!(config.data, Some(RequestData::Json(_))));
    }

    #[test]
    fn test_zero_timeout_is_ignored() {
        let config = RequestConfig::new(HttpMethod::Get, "http://localhost/")
            .with_timeout(Duration::ZERO);
        assert_eq!(config.effective_timeout(), None);
    }

    #[test]
    fn test_last_data_wins() {
        let config = RequestConfig::new(HttpMethod::Put, "http://localhost/")
            .with_json(json!({"a": 1}))
            .with_text("plain");
        assert_eq!(config.data, Some(RequestData::Text("plain".to_string())));
    }

    #[test]
    fn test_method_serde() {
        assert_eq!(serde_json::to_string(&HttpMethod::Patch).unwrap(), "\"PATCH\"");
        let method: HttpMethod = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(method, HttpMethod::Delete);
        assert_eq!(reqwest::Method::from(HttpMethod::Head), reqwest::Method::HEAD);
    }
}
