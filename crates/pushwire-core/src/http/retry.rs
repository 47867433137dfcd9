//! Bounded retry for transient network failures
//!
//! A call is retried only when the transport fails with one of the policy's
//! retryable codes, at most `max_retries` times, with no delay in between.
//! Attempts for one call are strictly sequential. Whatever the last attempt
//! produced is then finalized: a 2xx exchange becomes a [`Response`], any
//! other status becomes an [`HttpError`], and transport failures become a
//! [`DomainError`] with an `app/*` code.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AppErrorCode, DomainError};
use crate::http::error::{
    ClientError, HttpError, TransportError, TransportErrorCode, TransportErrorKind,
};
use crate::http::request::RequestConfig;
use crate::http::response::{RawHttpExchange, Response};
use crate::http::transport::{ReqwestTransport, Transport};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Transport error codes worth another attempt
    pub retryable_codes: Vec<TransportErrorCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retryable_codes: vec![
                TransportErrorCode::ConnectionReset,
                TransportErrorCode::TimedOut,
            ],
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn is_retryable(&self, error: &TransportError) -> bool {
        error
            .code
            .is_some_and(|code| self.retryable_codes.contains(&code))
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

/// Per-call retry bookkeeping
#[derive(Debug)]
pub struct RetryHandler<'a> {
    policy: &'a RetryPolicy,
    retries: u32,
}

impl<'a> RetryHandler<'a> {
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self { policy, retries: 0 }
    }

    /// Decide whether `error` earns another attempt
    pub fn should_retry(&mut self, error: &TransportError) -> RetryDecision {
        if self.retries >= self.policy.max_retries || !self.policy.is_retryable(error) {
            return RetryDecision::NoRetry;
        }
        self.retries += 1;
        RetryDecision::Retry
    }

    /// Retries granted so far
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

/// Client that retries transient failures and classifies the outcome
#[derive(Clone)]
pub struct RetryingClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    pub fn with_policy(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Client over a fresh [`ReqwestTransport`]
    pub fn with_default_transport() -> Result<Self, DomainError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?)))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `config`, retrying transient network failures
    pub async fn send(&self, config: &RequestConfig) -> Result<Response, ClientError> {
        let mut handler = RetryHandler::new(&self.policy);

        loop {
            match self.transport.send(config).await {
                Ok(exchange) => return finalize(exchange),
                Err(error) => match handler.should_retry(&error) {
                    RetryDecision::Retry => {
                        warn!(
                            request = %error.request,
                            code = ?error.code,
                            retry = handler.retries(),
                            "transient network error, retrying: {}",
                            error
                        );
                    }
                    RetryDecision::NoRetry => {
                        debug!(
                            request = %error.request,
                            retries = handler.retries(),
                            "request failed: {}",
                            error
                        );
                        return Err(classify(error));
                    }
                },
            }
        }
    }
}

/// Wrap a completed exchange, rejecting statuses outside [200, 300)
fn finalize(exchange: RawHttpExchange) -> Result<Response, ClientError> {
    let response = Response::from(exchange);
    if (200..300).contains(&response.status()) {
        Ok(response)
    } else {
        Err(HttpError::new(response).into())
    }
}

/// Translate a terminal transport failure into a client error
fn classify(mut error: TransportError) -> ClientError {
    if let Some(exchange) = error.response.take() {
        return HttpError::new(Response::from(exchange)).into();
    }

    if error.kind == TransportErrorKind::InvalidRequest {
        return DomainError::new(AppErrorCode::InvalidArgument, error.message).into();
    }

    if error.is_timeout() {
        return DomainError::new(
            AppErrorCode::NetworkTimeout,
            format!("Error while making request: {}.", error.message),
        )
        .into();
    }

    let code = error.code.map(|c| c.as_str()).unwrap_or("UNKNOWN");
    DomainError::new(
        AppErrorCode::NetworkError,
        format!("Error while making request: {}. Error code: {}", error.message, code),
    )
    .into()
}
