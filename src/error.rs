//! Unified error type.
//!
//! Every failure that can surface during request processing lives here.
//! The front door catches all of them and converts them into the JSON
//! error envelope — none of them crash the process.

use http::StatusCode;

use crate::body::MAX_BODY_BYTES;

/// The error type returned by souk's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The collection name is not one of the registered collections.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The on-disk file for a collection is not a valid JSON array.
    #[error("corrupt collection {name}: {reason}")]
    CorruptCollection { name: &'static str, reason: String },

    /// The request body exceeded the size cap.
    #[error("request body exceeds {MAX_BODY_BYTES} bytes")]
    PayloadTooLarge,

    /// The request body is not valid JSON.
    #[error("malformed JSON body: {0}")]
    MalformedBody(String),

    /// The underlying stream failed while reading the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// A record could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A failure raised inside a route handler.
    #[error("{0}")]
    Handler(String),

    /// I/O failure at the infrastructure boundary (bind, accept, file access).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// A handler-level failure whose message ends up in the envelope.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// The HTTP status the front door uses when this error reaches it.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
