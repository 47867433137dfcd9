//! Messaging backend request handler
//!
//! Builds requests against the configured FCM host, sends them through an
//! [`AuthorizingClient`], and decodes failures. A call fails when the status
//! is outside the 2xx range, when the body is not JSON, or when the JSON body
//! declares an error even though the status looks successful.
//!
//! Backend error envelopes look like:
//!
//! ```json
//! {"error": {"status": "NOT_FOUND", "message": "...",
//!            "details": [{"@type": "type.googleapis.com/google.firebase.fcm.v1.FcmErrorCode",
//!                         "errorCode": "UNREGISTERED"}]}}
//! ```
//!
//! or the legacy string form `{"error": "NotRegistered"}`.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::ApiSettings;
use crate::config::BackendConfig;
use crate::error::{DomainError, MessagingErrorCode, Result};
use crate::http::{
    AuthorizingClient, ClientError, HttpMethod, RequestConfig, ReqwestTransport, Response,
    RetryingClient, TokenProvider, Transport,
};

/// `@type` of the details element carrying the FCM error code
pub const FCM_ERROR_TYPE: &str = "type.googleapis.com/google.firebase.fcm.v1.FcmErrorCode";

/// Extract the backend error code from a response body
///
/// Rules, first match wins:
/// 1. `error` is a string: that string
/// 2. `error.details` holds an element typed [`FCM_ERROR_TYPE`]: its `errorCode`
/// 3. `error.status`
/// 4. `error.message`
pub fn extract_error_code(response: &Value) -> Option<String> {
    let error = response.as_object()?.get("error")?;
    if let Some(code) = error.as_str() {
        return non_empty(code);
    }

    let error = error.as_object()?;
    let field = |name: &str| error.get(name).and_then(Value::as_str).and_then(non_empty);

    let from_details = error
        .get("details")
        .and_then(Value::as_array)
        .and_then(|details| {
            details.iter().find(|element| {
                element.get("@type").and_then(Value::as_str) == Some(FCM_ERROR_TYPE)
            })
        })
        .and_then(|element| element.get("errorCode"))
        .and_then(Value::as_str)
        .and_then(non_empty);

    from_details
        .or_else(|| field("status"))
        .or_else(|| field("message"))
}

/// Extract the backend error message, if present and non-empty
pub fn extract_error_message(response: &Value) -> Option<String> {
    response
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Sends requests to the FCM backend and decodes its errors
#[derive(Clone)]
pub struct MessagingRequestHandler {
    client: AuthorizingClient,
    config: BackendConfig,
}

impl MessagingRequestHandler {
    /// Create a handler over a reqwest-backed transport
    pub fn new(token_provider: Arc<dyn TokenProvider>, config: BackendConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_transport(transport, token_provider, config))
    }

    /// Create a handler over an arbitrary transport
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        token_provider: Arc<dyn TokenProvider>,
        config: BackendConfig,
    ) -> Self {
        let client = AuthorizingClient::new(RetryingClient::new(transport), token_provider);
        Self { client, config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Invoke `api` on `host` with `payload`
    ///
    /// A `Null` payload sends no body. Returns the parsed response body.
    pub async fn invoke(&self, host: &str, api: &ApiSettings, payload: Value) -> Result<Value> {
        api.validate_request(&payload)?;

        let request = self.build_request(host, api.endpoint(), api.http_method(), payload);
        let response = match self.client.send(&request).await {
            Ok(response) => response,
            Err(ClientError::Http(err)) => return Err(self.handle_http_error(&err.response)),
            Err(ClientError::Domain(err)) => return Err(err),
        };

        // Non-JSON bodies and backend-declared errors fail even on 2xx
        let declared = response.data().ok().and_then(extract_error_code);
        if !response.is_json() || declared.is_some() {
            return Err(self.handle_http_error(&response));
        }

        let data = response.into_data()?;
        api.validate_response(&data)?;
        Ok(data)
    }

    /// POST `payload` to `path` on `host`
    pub async fn invoke_path(&self, host: &str, path: &str, payload: Value) -> Result<Value> {
        self.invoke(host, &ApiSettings::post(path), payload).await
    }

    /// Send a message through the v1 API of `project_id`
    pub async fn send_message(&self, project_id: &str, payload: Value) -> Result<Value> {
        let path = format!("/v1/projects/{}/messages:send", project_id);
        self.invoke_path(&self.config.host, &path, payload).await
    }

    fn build_request(
        &self,
        host: &str,
        path: &str,
        method: HttpMethod,
        payload: Value,
    ) -> RequestConfig {
        let mut request = RequestConfig::new(method, self.config.url_for(host, path))
            .with_headers(self.config.headers.clone());
        if !payload.is_null() {
            request = request.with_json(payload);
        }
        if let Some(timeout) = self.config.timeout() {
            request = request.with_timeout(timeout);
        }
        request
    }

    /// Decode a failed exchange into a domain error
    fn handle_http_error(&self, response: &Response) -> DomainError {
        if let Ok(json) = response.data() {
            let code = extract_error_code(json);
            let message = extract_error_message(json);
            let error = DomainError::from_server_error(code.as_deref(), message.as_deref(), json);
            warn!(
                request = %response.request(),
                status = response.status(),
                server_code = ?code,
                "backend returned an error: {}",
                error
            );
            return error;
        }

        let code = MessagingErrorCode::from_status(response.status());
        debug!(
            request = %response.request(),
            status = response.status(),
            "non-JSON error response"
        );
        DomainError::new(
            code,
            format!(
                "{} Raw server response: \"{}\". Status code: {}.",
                code.default_message(),
                response.text(),
                response.status()
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppErrorCode, ErrorCode};
    use crate::http::testing::{Outcome, ScriptedTransport};
    use crate::http::{StaticTokenProvider, TransportErrorCode};
    use serde_json::json;

    fn handler(transport: &Arc<ScriptedTransport>) -> MessagingRequestHandler {
        MessagingRequestHandler::with_transport(
            transport.clone(),
            Arc::new(StaticTokenProvider::new("token")),
            BackendConfig::default(),
        )
    }

    fn messaging_code(err: &DomainError) -> MessagingErrorCode {
        match err.code {
            ErrorCode::Messaging(code) => code,
            other => panic!("expected messaging code, got {}", other),
        }
    }

    #[test]
    fn test_details_win_over_status() {
        let body = json!({"error": {
            "status": "NOT_FOUND",
            "details": [{"@type": FCM_ERROR_TYPE, "errorCode": "UNREGISTERED"}]
        }});
        assert_eq!(extract_error_code(&body).as_deref(), Some("UNREGISTERED"));
    }

    #[test]
    fn test_status_without_details() {
        let body = json!({"error": {"status": "INVALID_ARGUMENT", "message": "bad"}});
        assert_eq!(extract_error_code(&body).as_deref(), Some("INVALID_ARGUMENT"));
        assert_eq!(extract_error_message(&body).as_deref(), Some("bad"));
    }

    #[test]
    fn test_string_error() {
        let body = json!({"error": "PERMISSION_DENIED"});
        assert_eq!(extract_error_code(&body).as_deref(), Some("PERMISSION_DENIED"));
        assert_eq!(extract_error_message(&body), None);
    }

    #[test]
    fn test_unrelated_details_fall_back_to_status() {
        let body = json!({"error": {
            "status": "UNAVAILABLE",
            "details": [
                {"@type": "type.googleapis.com/google.rpc.BadRequest"},
                {"@type": FCM_ERROR_TYPE}
            ]
        }});
        assert_eq!(extract_error_code(&body).as_deref(), Some("UNAVAILABLE"));
    }

    #[test]
    fn test_message_is_last_resort() {
        let body = json!({"error": {"message": "Something broke"}});
        assert_eq!(extract_error_code(&body).as_deref(), Some("Something broke"));
    }

    #[test]
    fn test_empty_fields_fall_through() {
        let body = json!({"error": {
            "status": "NOT_FOUND",
            "details": [{"@type": FCM_ERROR_TYPE, "errorCode": ""}]
        }});
        assert_eq!(extract_error_code(&body).as_deref(), Some("NOT_FOUND"));

        let body = json!({"error": {"status": "", "message": "Quota exceeded"}});
        assert_eq!(extract_error_code(&body).as_deref(), Some("Quota exceeded"));
    }

    #[test]
    fn test_no_error_code() {
        for body in [
            json!({"name": "projects/p/messages/1"}),
            json!({"error": null}),
            json!({"error": 42}),
            json!({"error": {}}),
            json!({"error": {"message": ""}}),
            json!([{"error": "x"}]),
            json!("error"),
        ] {
            assert_eq!(extract_error_code(&body), None, "body: {}", body);
        }
    }

    #[tokio::test]
    async fn test_invoke_builds_request() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok(r#"{"name":"m1"}"#)]));
        let data = handler(&transport)
            .invoke_path(
                "fcm.googleapis.com",
                "/v1/projects/p/messages:send",
                json!({"message": {}}),
            )
            .await
            .unwrap();
        assert_eq!(data, json!({"name": "m1"}));

        let seen = transport.seen();
        assert_eq!(seen.len(), 1);
        let request = &seen[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://fcm.googleapis.com/v1/projects/p/messages:send");
        assert_eq!(request.header("access_token_auth"), Some("true"));
        assert!(request.header("sdk-version").is_some());
        assert_eq!(request.header("authorization"), Some("Bearer token"));
        assert_eq!(request.timeout, Some(std::time::Duration::from_millis(10_000)));
        assert_eq!(
            request.data,
            Some(crate::http::RequestData::Json(json!({"message": {}})))
        );
    }

    #[tokio::test]
    async fn test_send_message_uses_configured_host() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok("{}")]));
        let handler = MessagingRequestHandler::with_transport(
            transport.clone(),
            Arc::new(StaticTokenProvider::new("token")),
            BackendConfig::default()
                .with_host("localhost:9000")
                .with_scheme("http"),
        );
        handler.send_message("demo", json!({"message": {"topic": "t"}})).await.unwrap();
        assert_eq!(
            transport.seen()[0].url,
            "http://localhost:9000/v1/projects/demo/messages:send"
        );
    }

    #[tokio::test]
    async fn test_null_payload_sends_no_body() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok("{}")]));
        let api = ApiSettings::new("/v1/status", HttpMethod::Get);
        handler(&transport).invoke("example.com", &api, Value::Null).await.unwrap();

        let seen = transport.seen();
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert!(seen[0].data.is_none());
    }

    #[tokio::test]
    async fn test_error_declared_in_success_body() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok(
            r#"{"error": {"status": "RESOURCE_EXHAUSTED", "message": "Quota exceeded"}}"#,
        )]));
        let err = handler(&transport)
            .invoke_path("fcm.googleapis.com", "/send", json!({}))
            .await
            .unwrap_err();

        assert_eq!(messaging_code(&err), MessagingErrorCode::MessageRateExceeded);
        assert_eq!(err.message, "Quota exceeded");
        assert_eq!(err.server_code.as_deref(), Some("RESOURCE_EXHAUSTED"));
        assert!(err.server_response.is_some());
    }

    #[tokio::test]
    async fn test_empty_status_in_success_body_is_error() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok(
            r#"{"error": {"status": "", "message": "Quota exceeded"}}"#,
        )]));
        let err = handler(&transport)
            .send_message("demo", json!({"message": {}}))
            .await
            .unwrap_err();

        assert_eq!(messaging_code(&err), MessagingErrorCode::UnknownError);
        assert!(err.message.starts_with("Quota exceeded Raw server response: "));
        assert_eq!(err.server_code.as_deref(), Some("Quota exceeded"));
    }

    #[tokio::test]
    async fn test_empty_details_code_uses_status_mapping() {
        let body = json!({"error": {
            "status": "NOT_FOUND",
            "message": "Requested entity was not found.",
            "details": [{"@type": FCM_ERROR_TYPE, "errorCode": ""}]
        }});
        let transport = Arc::new(ScriptedTransport::new([Outcome::status(404, &body.to_string())]));
        let err = handler(&transport)
            .send_message("demo", json!({"message": {}}))
            .await
            .unwrap_err();

        assert_eq!(messaging_code(&err), MessagingErrorCode::RegistrationTokenNotRegistered);
        assert_eq!(err.server_code.as_deref(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_non_json_success_is_error() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok("OK")]));
        let err = handler(&transport)
            .invoke_path("fcm.googleapis.com", "/send", json!({}))
            .await
            .unwrap_err();

        assert_eq!(messaging_code(&err), MessagingErrorCode::UnknownError);
        assert!(err.message.ends_with("Raw server response: \"OK\". Status code: 200."));
    }

    #[tokio::test]
    async fn test_non_json_status_classification() {
        let cases = [
            (400, MessagingErrorCode::InvalidArgument),
            (401, MessagingErrorCode::AuthenticationError),
            (403, MessagingErrorCode::AuthenticationError),
            (500, MessagingErrorCode::InternalError),
            (503, MessagingErrorCode::ServerUnavailable),
            (418, MessagingErrorCode::UnknownError),
        ];
        for (status, expected) in cases {
            let transport = Arc::new(ScriptedTransport::new([Outcome::status(
                status,
                "<html>nope</html>",
            )]));
            let err = handler(&transport)
                .invoke_path("fcm.googleapis.com", "/send", json!({}))
                .await
                .unwrap_err();

            assert_eq!(messaging_code(&err), expected);
            assert_eq!(
                err.message,
                format!(
                    "{} Raw server response: \"<html>nope</html>\". Status code: {}.",
                    expected.default_message(),
                    status
                )
            );
        }
    }

    #[tokio::test]
    async fn test_json_error_body_is_decoded() {
        let body = json!({"error": {
            "code": 404,
            "status": "NOT_FOUND",
            "message": "Requested entity was not found.",
            "details": [{"@type": FCM_ERROR_TYPE, "errorCode": "UNREGISTERED"}]
        }});
        let transport = Arc::new(ScriptedTransport::new([Outcome::status(404, &body.to_string())]));
        let err = handler(&transport)
            .invoke_path("fcm.googleapis.com", "/send", json!({}))
            .await
            .unwrap_err();

        assert_eq!(messaging_code(&err), MessagingErrorCode::RegistrationTokenNotRegistered);
        assert_eq!(err.message, "Requested entity was not found.");
        assert_eq!(err.server_response, Some(body));
    }

    #[tokio::test]
    async fn test_unknown_server_code_appends_raw_response() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::status(
            500,
            r#"{"error":"SomethingNew"}"#,
        )]));
        let err = handler(&transport)
            .invoke_path("fcm.googleapis.com", "/send", json!({}))
            .await
            .unwrap_err();

        assert_eq!(messaging_code(&err), MessagingErrorCode::UnknownError);
        assert!(err.message.contains("Raw server response: \"{\"error\":\"SomethingNew\"}\""));
    }

    #[tokio::test]
    async fn test_network_errors_pass_through() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::Fail(Some(
            TransportErrorCode::TimedOut,
        ))]));
        let err = handler(&transport)
            .invoke_path("fcm.googleapis.com", "/send", json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::App(AppErrorCode::NetworkTimeout));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_request_validator_blocks_send() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok("{}")]));
        let api = ApiSettings::post("/send").with_request_validator(|payload| {
            if payload.get("message").is_none() {
                return Err(DomainError::messaging(MessagingErrorCode::InvalidArgument));
            }
            Ok(())
        });

        let err = handler(&transport)
            .invoke("fcm.googleapis.com", &api, json!({}))
            .await
            .unwrap_err();
        assert_eq!(messaging_code(&err), MessagingErrorCode::InvalidArgument);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_response_validator_failure_surfaces() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::ok(r#"{"unexpected": true}"#)]));
        let api = ApiSettings::post("/send").with_response_validator(|response| {
            match response.get("name") {
                Some(_) => Ok(()),
                None => Err(DomainError::new(AppErrorCode::InternalError, "missing name")),
            }
        });

        let err = handler(&transport)
            .invoke("fcm.googleapis.com", &api, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::App(AppErrorCode::InternalError));
        assert_eq!(err.message, "missing name");
    }

    #[tokio::test]
    async fn test_rejected_payload_shape_is_invalid_argument() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::Invalid]));
        let err = handler(&transport)
            .invoke_path("fcm.googleapis.com", "/send", json!([1, 2, 3]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::App(AppErrorCode::InvalidArgument));
    }
}
