//! Client-facing error taxonomy
//!
//! Every failed call through the request pipeline ends as exactly one
//! [`DomainError`]. Its [`ErrorCode`] is split into two namespaces:
//! `app/*` codes describe transport and response-decoding problems, while
//! `messaging/*` codes describe failures reported by the FCM backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Error codes raised by the request pipeline itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppErrorCode {
    /// Request configuration was rejected before any I/O
    InvalidArgument,
    /// The token provider could not produce an access token
    InvalidCredential,
    /// Unexpected internal failure (e.g. the HTTP client could not be built)
    InternalError,
    /// Low-level network failure
    NetworkError,
    /// The request timed out
    NetworkTimeout,
    /// Response body was read as JSON but could not be parsed
    UnableToParseResponse,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::InvalidArgument => "app/invalid-argument",
            AppErrorCode::InvalidCredential => "app/invalid-credential",
            AppErrorCode::InternalError => "app/internal-error",
            AppErrorCode::NetworkError => "app/network-error",
            AppErrorCode::NetworkTimeout => "app/network-timeout",
            AppErrorCode::UnableToParseResponse => "app/unable-to-parse-response",
        }
    }
}

/// Error codes describing failures reported by the messaging backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagingErrorCode {
    InvalidArgument,
    InvalidRegistrationToken,
    RegistrationTokenNotRegistered,
    MismatchedCredential,
    InvalidPackageName,
    PayloadSizeLimitExceeded,
    InvalidDataPayloadKey,
    InvalidOptions,
    DeviceMessageRateExceeded,
    TopicsMessageRateExceeded,
    MessageRateExceeded,
    InvalidApnsCredentials,
    AuthenticationError,
    InternalError,
    ServerUnavailable,
    UnknownError,
}

impl MessagingErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagingErrorCode::InvalidArgument => "messaging/invalid-argument",
            MessagingErrorCode::InvalidRegistrationToken => "messaging/invalid-registration-token",
            MessagingErrorCode::RegistrationTokenNotRegistered => {
                "messaging/registration-token-not-registered"
            }
            MessagingErrorCode::MismatchedCredential => "messaging/mismatched-credential",
            MessagingErrorCode::InvalidPackageName => "messaging/invalid-package-name",
            MessagingErrorCode::PayloadSizeLimitExceeded => "messaging/payload-size-limit-exceeded",
            MessagingErrorCode::InvalidDataPayloadKey => "messaging/invalid-data-payload-key",
            MessagingErrorCode::InvalidOptions => "messaging/invalid-options",
            MessagingErrorCode::DeviceMessageRateExceeded => {
                "messaging/device-message-rate-exceeded"
            }
            MessagingErrorCode::TopicsMessageRateExceeded => {
                "messaging/topics-message-rate-exceeded"
            }
            MessagingErrorCode::MessageRateExceeded => "messaging/message-rate-exceeded",
            MessagingErrorCode::InvalidApnsCredentials => "messaging/invalid-apns-credentials",
            MessagingErrorCode::AuthenticationError => "messaging/authentication-error",
            MessagingErrorCode::InternalError => "messaging/internal-error",
            MessagingErrorCode::ServerUnavailable => "messaging/server-unavailable",
            MessagingErrorCode::UnknownError => "messaging/unknown-error",
        }
    }

    /// Message used when the backend does not supply one
    pub fn default_message(&self) -> &'static str {
        match self {
            MessagingErrorCode::InvalidArgument => "Invalid argument provided.",
            MessagingErrorCode::InvalidRegistrationToken => {
                "Invalid registration token provided. Make sure it matches the registration \
                 token the client app receives from registering with FCM."
            }
            MessagingErrorCode::RegistrationTokenNotRegistered => {
                "The provided registration token is not registered. A previously valid \
                 registration token can be unregistered for a variety of reasons. Remove this \
                 registration token and stop using it to send messages."
            }
            MessagingErrorCode::MismatchedCredential => {
                "The credential used to authenticate this SDK does not have permission to send \
                 messages to the device corresponding to the provided registration token."
            }
            MessagingErrorCode::InvalidPackageName => {
                "The message was addressed to a registration token whose package name does not \
                 match the provided restricted package name."
            }
            MessagingErrorCode::PayloadSizeLimitExceeded => {
                "The provided message payload exceeds the FCM size limits."
            }
            MessagingErrorCode::InvalidDataPayloadKey => {
                "The data message payload contains an invalid key."
            }
            MessagingErrorCode::InvalidOptions => "Invalid message options provided.",
            MessagingErrorCode::DeviceMessageRateExceeded => {
                "The rate of messages to a particular device is too high. Reduce the number of \
                 messages sent to this device and do not immediately retry sending to it."
            }
            MessagingErrorCode::TopicsMessageRateExceeded => {
                "The rate of messages to subscribers to a particular topic is too high. Reduce \
                 the number of messages sent for this topic and do not immediately retry."
            }
            MessagingErrorCode::MessageRateExceeded => {
                "Sending limit exceeded for the message target."
            }
            MessagingErrorCode::InvalidApnsCredentials => {
                "A message targeted to an iOS device could not be sent because the required \
                 APNs credentials were not uploaded or have expired."
            }
            MessagingErrorCode::AuthenticationError => {
                "An error occurred when trying to authenticate to the FCM servers. Make sure the \
                 credential used to authenticate this SDK has the proper permissions."
            }
            MessagingErrorCode::InternalError => {
                "An internal error has occurred. Please retry the request."
            }
            MessagingErrorCode::ServerUnavailable => {
                "The FCM server could not process the request in time."
            }
            MessagingErrorCode::UnknownError => "An unknown server error was returned.",
        }
    }

    /// Map an error code reported by the backend to a client-facing code
    ///
    /// Covers both the legacy FCM codes and the v1 canonical/FCM-specific codes.
    pub fn from_server_code(server_code: &str) -> Option<Self> {
        let code = match server_code {
            "InvalidParameters" | "INVALID_ARGUMENT" => MessagingErrorCode::InvalidArgument,
            "MismatchSenderId" | "PERMISSION_DENIED" | "SENDER_ID_MISMATCH" => {
                MessagingErrorCode::MismatchedCredential
            }
            "Unavailable" | "UNAVAILABLE" => MessagingErrorCode::ServerUnavailable,
            "InternalServerError" | "INTERNAL" => MessagingErrorCode::InternalError,
            "InvalidRegistration" => MessagingErrorCode::InvalidRegistrationToken,
            "NotRegistered" | "NOT_FOUND" | "UNREGISTERED" => {
                MessagingErrorCode::RegistrationTokenNotRegistered
            }
            "InvalidPackageName" => MessagingErrorCode::InvalidPackageName,
            "MessageTooBig" => MessagingErrorCode::PayloadSizeLimitExceeded,
            "InvalidDataKey" => MessagingErrorCode::InvalidDataPayloadKey,
            "InvalidTtl" => MessagingErrorCode::InvalidOptions,
            "DeviceMessageRateExceeded" => MessagingErrorCode::DeviceMessageRateExceeded,
            "TopicsMessageRateExceeded" => MessagingErrorCode::TopicsMessageRateExceeded,
            "RESOURCE_EXHAUSTED" | "QUOTA_EXCEEDED" => MessagingErrorCode::MessageRateExceeded,
            "InvalidApnsCredential" | "UNAUTHENTICATED" | "APNS_AUTH_ERROR" => {
                MessagingErrorCode::InvalidApnsCredentials
            }
            "UNSPECIFIED_ERROR" => MessagingErrorCode::UnknownError,
            _ => return None,
        };
        Some(code)
    }

    /// Classify a non-JSON error response purely by its HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => MessagingErrorCode::InvalidArgument,
            401 | 403 => MessagingErrorCode::AuthenticationError,
            500 => MessagingErrorCode::InternalError,
            503 => MessagingErrorCode::ServerUnavailable,
            _ => MessagingErrorCode::UnknownError,
        }
    }
}

/// A client-facing error code from either namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    App(AppErrorCode),
    Messaging(MessagingErrorCode),
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::App(code) => code.as_str(),
            ErrorCode::Messaging(code) => code.as_str(),
        }
    }
}

impl From<AppErrorCode> for ErrorCode {
    fn from(code: AppErrorCode) -> Self {
        ErrorCode::App(code)
    }
}

impl From<MessagingErrorCode> for ErrorCode {
    fn from(code: MessagingErrorCode) -> Self {
        ErrorCode::Messaging(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal error surfaced to callers of the request pipeline
#[derive(Error, Debug, Clone)]
#[error("{message} ({code})")]
pub struct DomainError {
    /// Client-facing error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Raw error code reported by the backend, if any
    pub server_code: Option<String>,
    /// Full JSON error body returned by the backend, for diagnostics
    pub server_response: Option<Value>,
}

impl DomainError {
    /// Create an error with no backend context
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            server_code: None,
            server_response: None,
        }
    }

    /// Create an error from a messaging code using its default message
    pub fn messaging(code: MessagingErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Decode a backend-reported error into a client-facing error
    ///
    /// Unknown server codes map to `messaging/unknown-error`, in which case the
    /// serialized raw response is appended to the message.
    pub fn from_server_error(
        server_code: Option<&str>,
        message: Option<&str>,
        server_response: &Value,
    ) -> Self {
        let code = server_code
            .and_then(MessagingErrorCode::from_server_code)
            .unwrap_or(MessagingErrorCode::UnknownError);

        let mut text = message.unwrap_or(code.default_message()).to_string();
        if code == MessagingErrorCode::UnknownError {
            text.push_str(&format!(" Raw server response: \"{}\"", server_response));
        }

        Self {
            code: code.into(),
            message: text,
            server_code: server_code.map(str::to_string),
            server_response: Some(server_response.clone()),
        }
    }
}

/// Convenience type alias for Results using [`DomainError`]
pub type Result<T> = std::result::Result<T, DomainError>;
