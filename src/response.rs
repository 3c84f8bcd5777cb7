//! Outgoing HTTP response type.
//!
//! JSON-first: success payloads are whatever the handler serializes, error
//! payloads are always the `{"status":"error","message":…}` envelope. The
//! front door converts a [`Response`] into the hyper wire type and stamps
//! the CORS headers on it.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use souk::Response;
///
/// Response::json(&serde_json::json!({"id": "listing_1"}));
/// Response::status(StatusCode::NO_CONTENT);
/// Response::builder().status(StatusCode::CREATED).json(&serde_json::json!({"id": 42}));
/// ```
pub struct Response {
    status: StatusCode,
    body: Vec<u8>,
    content_type: Option<&'static str>,
}

impl Response {
    /// `200 OK` with a JSON body serialized from `value`.
    ///
    /// A serialization failure degrades to a 500 error envelope rather than
    /// panicking; handlers stay infallible on the happy path.
    pub fn json(value: &impl Serialize) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status: StatusCode::OK,
                body,
                content_type: Some("application/json"),
            },
            Err(e) => Self::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        }
    }

    /// A response with no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, body: Vec::new(), content_type: None }
    }

    /// The uniform JSON error envelope: `{"status":"error","message":…}`.
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: envelope_bytes(message),
            content_type: Some("application/json"),
        }
    }

    /// Builder for responses that need a non-200 success status.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: StatusCode::OK }
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }
}

/// Fluent builder for [`Response`]. Defaults to `200 OK`.
pub struct ResponseBuilder {
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Terminate with a JSON body.
    pub fn json(self, value: &impl Serialize) -> Response {
        let mut response = Response::json(value);
        if response.status == StatusCode::OK {
            response.status = self.status;
        }
        response
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response::status(self.status)
    }
}

fn envelope_bytes(message: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({"status": "error", "message": message}))
        .unwrap_or_else(|_| br#"{"status":"error","message":"serialization failure"}"#.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn json_sets_content_type_and_status() {
        let response = Response::json(&json!({"ok": true})).into_http();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn error_produces_the_envelope() {
        let response = Response::error(StatusCode::NOT_FOUND, "Not Found");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let value: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "Not Found"}));
    }

    #[test]
    fn builder_overrides_status() {
        let response = Response::builder().status(StatusCode::CREATED).json(&json!({"id": 1}));
        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[test]
    fn status_only_has_no_body() {
        let response = Response::status(StatusCode::NO_CONTENT).into_http();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}
