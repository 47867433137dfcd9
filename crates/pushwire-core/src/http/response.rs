//! Raw exchanges and the caller-facing response wrapper

use serde_json::Value;
use std::collections::HashMap;

use crate::error::{AppErrorCode, DomainError, Result};
use crate::http::request::RequestConfig;

/// One completed network round-trip
///
/// Header names are lowercase. The body is already decompressed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHttpExchange {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body_text: String,
    /// The request that produced this exchange
    pub config: RequestConfig,
}

/// A response exposed to callers of the client layers
///
/// The body is parsed as JSON once at construction. [`Response::data`] hands
/// out the parsed value or fails with `app/unable-to-parse-response`.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    text: String,
    parsed: std::result::Result<Value, String>,
    request: String,
}

impl Response {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header value by lowercase name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Raw response body
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the body parsed as JSON
    pub fn is_json(&self) -> bool {
        self.parsed.is_ok()
    }

    /// `METHOD url` of the request that produced this response
    pub fn request(&self) -> &str {
        &self.request
    }

    /// Parsed JSON body
    pub fn data(&self) -> Result<&Value> {
        self.parsed
            .as_ref()
            .map_err(|parse_error| self.parse_error(parse_error))
    }

    /// Consume the response, returning the parsed JSON body
    pub fn into_data(self) -> Result<Value> {
        if let Err(parse_error) = &self.parsed {
            return Err(self.parse_error(parse_error));
        }
        Ok(self.parsed.unwrap_or_default())
    }

    fn parse_error(&self, parse_error: &str) -> DomainError {
        DomainError::new(
            AppErrorCode::UnableToParseResponse,
            format!(
                "Error while parsing response data: \"{}\". Raw server response: \"{}\". \
                 Status code: \"{}\". Outgoing request: \"{}.\"",
                parse_error, self.text, self.status, self.request
            ),
        )
    }
}

impl From<RawHttpExchange> for Response {
    fn from(exchange: RawHttpExchange) -> Self {
        let parsed = serde_json::from_str::<Value>(&exchange.body_text).map_err(|e| e.to_string());
        Self {
            status: exchange.status,
            headers: exchange.headers,
            text: exchange.body_text,
            parsed,
            request: exchange.config.describe(),
        }
    }
}
