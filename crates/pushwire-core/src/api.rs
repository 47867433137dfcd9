//! Backend endpoint descriptors
//!
//! An [`ApiSettings`] names one backend endpoint (path and HTTP method) and
//! carries optional validators run against the outgoing payload and the
//! parsed response. Validators default to no-ops.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::http::HttpMethod;

/// Validator callback; returns an error to reject the value
pub type ApiCallback = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;

/// Settings for one backend API endpoint
#[derive(Clone)]
pub struct ApiSettings {
    endpoint: String,
    http_method: HttpMethod,
    request_validator: ApiCallback,
    response_validator: ApiCallback,
}

fn no_op() -> ApiCallback {
    Arc::new(|_| Ok(()))
}

impl ApiSettings {
    /// Create settings for `endpoint` with no-op validators
    pub fn new(endpoint: impl Into<String>, http_method: HttpMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_method,
            request_validator: no_op(),
            response_validator: no_op(),
        }
    }

    /// Create settings for a POST endpoint
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Post)
    }

    pub fn with_request_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        self.request_validator = Arc::new(validator);
        self
    }

    pub fn with_response_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        self.response_validator = Arc::new(validator);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    /// Run the request validator against an outgoing payload
    pub fn validate_request(&self, payload: &Value) -> Result<()> {
        (self.request_validator)(payload)
    }

    /// Run the response validator against a parsed response
    pub fn validate_response(&self, response: &Value) -> Result<()> {
        (self.response_validator)(response)
    }
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("endpoint", &self.endpoint)
            .field("http_method", &self.http_method)
            .finish_non_exhaustive()
    }
}
