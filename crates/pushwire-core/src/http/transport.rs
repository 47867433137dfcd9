//! Single-exchange HTTP transport
//!
//! A [`Transport`] performs exactly one network round-trip for a
//! [`RequestConfig`]. It never interprets the status code: 4xx and 5xx
//! responses come back as ordinary exchanges. Everything below the status
//! line (bad request shape, socket failures, timeouts, undecodable bodies)
//! is reported as a [`TransportError`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING};
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::error::{AppErrorCode, DomainError};
use crate::http::decompress::{self, ContentEncoding};
use crate::http::error::TransportError;
use crate::http::request::{RequestConfig, RequestData};
use crate::http::response::RawHttpExchange;
use crate::http::timeout::with_timeout;

/// Content type applied to JSON bodies unless the caller set one
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// Performs one HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, config: &RequestConfig) -> Result<RawHttpExchange, TransportError>;
}

/// Transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Create a transport with its own connection pool
    pub fn new() -> Result<Self, DomainError> {
        let client = ReqwestClient::builder().build().map_err(|e| {
            DomainError::new(
                AppErrorCode::InternalError,
                format!("Failed to create HTTP client: {}", e),
            )
        })?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    ///
    /// The client must not have automatic decompression enabled, or bodies
    /// would be decoded twice.
    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }

    fn build_request(&self, config: &RequestConfig) -> Result<reqwest::Request, TransportError> {
        let url = parse_url(config)?;
        let (mut headers, body) = encode_body(config)?;

        if let Some(body) = &body {
            headers.retain(|name, _| !name.eq_ignore_ascii_case("content-length"));
            headers.insert("Content-Length".to_string(), body.len().to_string());
        }

        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in &headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::invalid_request(format!("Invalid header name \"{}\"", name), config)
                    .with_source(e)
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::invalid_request(
                    format!("Invalid value for header \"{}\"", name),
                    config,
                )
                .with_source(e)
            })?;
            header_map.insert(header_name, header_value);
        }

        let mut builder = self
            .client
            .request(config.method.into(), url)
            .headers(header_map);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        builder.build().map_err(|e| {
            TransportError::invalid_request(format!("Failed to build request: {}", e), config)
                .with_source(e)
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, config: &RequestConfig) -> Result<RawHttpExchange, TransportError> {
        let request = self.build_request(config)?;
        debug!(request = %config.describe(), "sending request");

        let exchange = async {
            let response = self
                .client
                .execute(request)
                .await
                .map_err(|e| TransportError::from_reqwest(e, config))?;
            read_exchange(response, config).await
        };

        let timeout = config.effective_timeout();
        match with_timeout(exchange, timeout).await {
            Some(result) => result,
            None => {
                let limit = timeout.map(|t| t.as_millis()).unwrap_or_default();
                debug!(request = %config.describe(), timeout_ms = %limit, "request timed out");
                Err(TransportError::timeout(config, limit))
            }
        }
    }
}

fn parse_url(config: &RequestConfig) -> Result<Url, TransportError> {
    let url = Url::parse(&config.url).map_err(|e| {
        TransportError::invalid_request(format!("Invalid request URL \"{}\"", config.url), config)
            .with_source(e)
    })?;

    match url.scheme() {
        "https" | "http" => Ok(url),
        scheme => Err(TransportError::invalid_request(
            format!("Unsupported URL scheme \"{}\"", scheme),
            config,
        )),
    }
}

/// Serialize the payload, returning the headers to send alongside it
fn encode_body(
    config: &RequestConfig,
) -> Result<(HashMap<String, String>, Option<Vec<u8>>), TransportError> {
    let mut headers = config.headers.clone();

    let body = match &config.data {
        None => None,
        Some(RequestData::Json(value @ Value::Object(_))) => {
            let bytes = serde_json::to_vec(value).map_err(|e| {
                TransportError::invalid_request(
                    format!("Failed to serialize request data: {}", e),
                    config,
                )
                .with_source(e)
            })?;
            if config.header("content-type").is_none() {
                headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
            }
            Some(bytes)
        }
        Some(RequestData::Json(_)) => {
            return Err(TransportError::invalid_request(
                "Request data must be a string, a byte buffer or a json serializable object",
                config,
            ));
        }
        Some(RequestData::Text(text)) => Some(text.as_bytes().to_vec()),
        Some(RequestData::Bytes(bytes)) => Some(bytes.clone()),
    };

    Ok((headers, body))
}

/// Buffer the full body, decoding it when a supported content encoding is set
async fn read_exchange(
    mut response: reqwest::Response,
    config: &RequestConfig,
) -> Result<RawHttpExchange, TransportError> {
    let status = response.status().as_u16();
    let mut headers = collect_headers(response.headers());

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| TransportError::from_reqwest(e, config))?
    {
        body.extend_from_slice(&chunk);
    }

    let encoding = headers
        .get(CONTENT_ENCODING.as_str())
        .and_then(|value| ContentEncoding::parse(value));
    if let Some(encoding) = encoding {
        headers.remove(CONTENT_ENCODING.as_str());
        debug!(?encoding, compressed_len = body.len(), "decoding response body");
        body = match decompress::decode(&body) {
            Ok(decoded) => decoded,
            Err(e) => {
                let partial = RawHttpExchange {
                    status,
                    headers,
                    body_text: String::new(),
                    config: config.clone(),
                };
                return Err(TransportError::decode(e, partial));
            }
        };
    }

    Ok(RawHttpExchange {
        status,
        headers,
        body_text: String::from_utf8_lossy(&body).into_owned(),
        config: config.clone(),
    })
}

/// Flatten a header map; repeated headers are joined with ", "
///
/// Values that are not visible ASCII are decoded lossily rather than dropped.
fn collect_headers(header_map: &HeaderMap) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in header_map {
        let value = String::from_utf8_lossy(value.as_bytes());
        let value = value.as_ref();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}
