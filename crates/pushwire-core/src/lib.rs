//! Pushwire Core - Resilient, authenticated request pipeline for the FCM backend
//!
//! Requests flow through a stack of small layers, each re-classifying the
//! failures of the one below it:
//!
//! - **Messaging**: [`MessagingRequestHandler`] builds backend requests and
//!   decodes backend error envelopes into [`DomainError`]s
//! - **Authorization**: [`AuthorizingClient`] attaches a bearer token from a
//!   [`TokenProvider`]
//! - **Retry**: [`RetryingClient`] retries transient network failures once
//! - **Transport**: [`ReqwestTransport`] performs the exchange, decodes
//!   compressed bodies and enforces the timeout
//!
//! # Example
//!
//! ```no_run
//! use pushwire_core::{BackendConfig, MessagingRequestHandler, StaticTokenProvider};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! async fn example() -> pushwire_core::Result<()> {
//!     let handler = MessagingRequestHandler::new(
//!         Arc::new(StaticTokenProvider::new("ya29.token")),
//!         BackendConfig::default(),
//!     )?;
//!     let sent = handler
//!         .send_message("my-project", json!({"message": {"topic": "news"}}))
//!         .await?;
//!     println!("{}", sent["name"]);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod messaging;

/// Crate version, reported in the `Sdk-Version` header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types for convenience
pub use api::{ApiCallback, ApiSettings};
pub use config::BackendConfig;
pub use error::{AppErrorCode, DomainError, ErrorCode, MessagingErrorCode, Result};
pub use http::{
    AccessToken, AuthorizingClient, ClientError, HttpError, HttpMethod, RawHttpExchange,
    RequestConfig, RequestData, ReqwestTransport, Response, RetryPolicy, RetryingClient,
    StaticTokenProvider, TokenProvider, Transport, TransportError, TransportErrorCode,
};
pub use messaging::{extract_error_code, extract_error_message, MessagingRequestHandler};
