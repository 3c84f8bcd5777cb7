//! Request body decoding.
//!
//! Mutating methods (POST, PUT, PATCH) carry an optional JSON payload.
//! The decoder drains the request stream frame by frame, caps it at
//! [`MAX_BODY_BYTES`], and parses whatever arrived as JSON. Zero bytes is
//! "no body", not an error — plenty of clients POST without a payload.

use bytes::{Buf, BufMut, BytesMut};
use http_body_util::BodyExt;
use hyper::body::Body;
use serde_json::Value;

use crate::error::Error;

/// Hard cap on the accumulated request body.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Drains `body` and parses it as JSON.
///
/// Returns `Ok(None)` on a clean end-of-stream with zero bytes received.
/// Exceeding the cap aborts the read with [`Error::PayloadTooLarge`]; the
/// connection's read side goes down with the dropped stream.
pub(crate) async fn decode<B>(mut body: B) -> Result<Option<Value>, Error>
where
    B: Body + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut buf = BytesMut::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| Error::Transport(e.into().to_string()))?;
        // Trailer frames carry no data and are skipped.
        if let Ok(data) = frame.into_data() {
            if buf.len() + data.remaining() > MAX_BODY_BYTES {
                return Err(Error::PayloadTooLarge);
            }
            buf.put(data);
        }
    }
    if buf.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(&buf)
        .map(Some)
        .map_err(|e| Error::MalformedBody(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use serde_json::json;

    #[tokio::test]
    async fn empty_stream_is_no_body() {
        let body = Full::new(Bytes::new());
        assert_eq!(decode(body).await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_object_is_parsed() {
        let body = Full::new(Bytes::from_static(br#"{"price": 10, "name": "rug"}"#));
        let value = decode(body).await.unwrap().unwrap();
        assert_eq!(value, json!({"price": 10, "name": "rug"}));
    }

    #[tokio::test]
    async fn non_json_text_is_malformed() {
        let body = Full::new(Bytes::from_static(b"hello there"));
        let err = decode(body).await.unwrap_err();
        assert!(matches!(err, Error::MalformedBody(_)));
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let body = Full::new(Bytes::from(vec![b'x'; MAX_BODY_BYTES + 1]));
        let err = decode(body).await.unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge));
    }

    #[tokio::test]
    async fn body_at_the_cap_still_parses() {
        let mut payload = format!(r#"{{"pad":"{}"#, "a".repeat(MAX_BODY_BYTES - 10));
        payload.push_str("\"}");
        assert_eq!(payload.len(), MAX_BODY_BYTES);
        let value = decode(Full::new(Bytes::from(payload))).await.unwrap().unwrap();
        assert!(value.get("pad").is_some());
    }
}
