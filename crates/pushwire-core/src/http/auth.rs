//! Bearer-token authorization
//!
//! Token acquisition sits behind the [`TokenProvider`] trait; caching and
//! refresh are the provider's business. [`AuthorizingClient`] asks for a token
//! on every send and attaches it to a private copy of the request.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppErrorCode, DomainError};
use crate::http::error::ClientError;
use crate::http::request::RequestConfig;
use crate::http::response::Response;
use crate::http::retry::RetryingClient;

/// An OAuth2 access token
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Source of access tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a valid token, refreshing it if needed
    async fn get_token(&self) -> Result<AccessToken, DomainError>;
}

/// Provider that always hands out the same token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(access_token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<AccessToken, DomainError> {
        if self.token.access_token.is_empty() {
            return Err(DomainError::new(
                AppErrorCode::InvalidCredential,
                "Access token must be a non-empty string",
            ));
        }
        Ok(self.token.clone())
    }
}

/// Client that authorizes every request with a bearer token
#[derive(Clone)]
pub struct AuthorizingClient {
    inner: RetryingClient,
    token_provider: Arc<dyn TokenProvider>,
}

impl AuthorizingClient {
    pub fn new(inner: RetryingClient, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            inner,
            token_provider,
        }
    }

    /// Send a copy of `config` carrying an `Authorization` header
    ///
    /// The caller's config is never modified. Token provider failures are
    /// returned as-is.
    pub async fn send(&self, config: &RequestConfig) -> Result<Response, ClientError> {
        let token = self.token_provider.get_token().await?;
        debug!(request = %config.describe(), "authorizing request");

        let mut authorized = config.clone();
        authorized.headers.retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
        authorized.headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", token.access_token),
        );

        self.inner.send(&authorized).await
    }
}
