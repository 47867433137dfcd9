//! FCM backend access
//!
//! [`MessagingRequestHandler`] drives requests through the authorizing client
//! and turns backend error envelopes into [`DomainError`](crate::DomainError)s.

pub mod request_handler;

pub use request_handler::{
    extract_error_code, extract_error_message, MessagingRequestHandler, FCM_ERROR_TYPE,
};
