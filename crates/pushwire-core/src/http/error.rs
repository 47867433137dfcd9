//! Transport failures and their classification
//!
//! The transport reports everything that goes wrong below the HTTP status
//! line as a [`TransportError`]. The retrying client decides which of those
//! are worth a second attempt and turns the rest into a [`ClientError`].

use std::error::Error as StdError;
use std::fmt;
use std::io;
use thiserror::Error;

use crate::error::DomainError;
use crate::http::request::RequestConfig;
use crate::http::response::{RawHttpExchange, Response};

/// Broad category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request could not be built; no I/O happened
    InvalidRequest,
    /// Socket or protocol failure
    Network,
    /// The configured timeout expired and the exchange was aborted
    Timeout,
    /// The response body could not be decoded
    Decode,
}

/// Low-level network error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorCode {
    ConnectionReset,
    TimedOut,
    ConnectionRefused,
    ConnectFailed,
    Protocol,
}

impl TransportErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorCode::ConnectionReset => "ECONNRESET",
            TransportErrorCode::TimedOut => "ETIMEDOUT",
            TransportErrorCode::ConnectionRefused => "ECONNREFUSED",
            TransportErrorCode::ConnectFailed => "ECONNFAILED",
            TransportErrorCode::Protocol => "EPROTO",
        }
    }

    /// Classify a reqwest error by walking its source chain
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return TransportErrorCode::TimedOut;
        }

        let mut source = error.source();
        while let Some(cause) = source {
            if let Some(io_error) = cause.downcast_ref::<io::Error>() {
                match io_error.kind() {
                    io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof => return TransportErrorCode::ConnectionReset,
                    io::ErrorKind::ConnectionRefused => {
                        return TransportErrorCode::ConnectionRefused
                    }
                    io::ErrorKind::TimedOut => return TransportErrorCode::TimedOut,
                    _ => {}
                }
            }
            if let Some(hyper_error) = cause.downcast_ref::<hyper::Error>() {
                if hyper_error.is_incomplete_message() {
                    return TransportErrorCode::ConnectionReset;
                }
            }
            source = cause.source();
        }

        if error.is_connect() {
            TransportErrorCode::ConnectFailed
        } else {
            TransportErrorCode::Protocol
        }
    }
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed exchange, enriched with the request that caused it
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub kind: TransportErrorKind,
    pub code: Option<TransportErrorCode>,
    pub config: RequestConfig,
    /// `METHOD url` of the in-flight request
    pub request: String,
    /// Partial exchange, when the server had already answered
    pub response: Option<RawHttpExchange>,
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    fn new(
        kind: TransportErrorKind,
        code: Option<TransportErrorCode>,
        message: impl Into<String>,
        config: &RequestConfig,
    ) -> Self {
        Self {
            message: message.into(),
            kind,
            code,
            config: config.clone(),
            request: config.describe(),
            response: None,
            source: None,
        }
    }

    /// The request was rejected before any I/O
    pub fn invalid_request(message: impl Into<String>, config: &RequestConfig) -> Self {
        Self::new(TransportErrorKind::InvalidRequest, None, message, config)
    }

    /// A socket or protocol failure with an optional low-level code
    pub fn network(
        message: impl Into<String>,
        code: Option<TransportErrorCode>,
        config: &RequestConfig,
    ) -> Self {
        Self::new(TransportErrorKind::Network, code, message, config)
    }

    /// The configured timeout fired
    pub fn timeout(config: &RequestConfig, timeout_ms: u128) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            Some(TransportErrorCode::TimedOut),
            format!("timeout of {}ms exceeded", timeout_ms),
            config,
        )
    }

    /// Build from a reqwest failure
    pub fn from_reqwest(error: reqwest::Error, config: &RequestConfig) -> Self {
        let code = TransportErrorCode::classify(&error);
        let kind = if code == TransportErrorCode::TimedOut {
            TransportErrorKind::Timeout
        } else {
            TransportErrorKind::Network
        };
        Self::new(kind, Some(code), error.to_string(), config).with_source(error)
    }

    /// The body could not be decoded; `response` holds status and headers
    pub fn decode(error: io::Error, response: RawHttpExchange) -> Self {
        let mut err = Self::new(
            TransportErrorKind::Decode,
            None,
            format!("failed to decode response body: {}", error),
            &response.config,
        )
        .with_source(error);
        err.response = Some(response);
        err
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.code == Some(TransportErrorCode::TimedOut)
    }
}

/// A completed exchange whose status is outside the 2xx range
#[derive(Error, Debug, Clone)]
#[error("Server responded with status {}.", .response.status())]
pub struct HttpError {
    pub response: Response,
}

impl HttpError {
    pub fn new(response: Response) -> Self {
        Self { response }
    }
}

/// Failure modes of the retrying and authorizing clients
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}
