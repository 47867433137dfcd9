//! HTTP request pipeline
//!
//! Layers, outermost first:
//! - [`AuthorizingClient`]: clones the request and adds a bearer token
//! - [`RetryingClient`]: one retry on transient network failures, status
//!   classification, translation into [`ClientError`]
//! - [`Transport`]: a single exchange with body encoding, decompression and
//!   timeout enforcement

pub mod auth;
pub mod decompress;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod timeout;
pub mod transport;

pub use auth::{AccessToken, AuthorizingClient, StaticTokenProvider, TokenProvider};
pub use error::{ClientError, HttpError, TransportError, TransportErrorCode, TransportErrorKind};
pub use request::{HttpMethod, RequestConfig, RequestData};
pub use response::{RawHttpExchange, Response};
pub use retry::{RetryDecision, RetryPolicy, RetryingClient};
pub use transport::{ReqwestTransport, Transport};
