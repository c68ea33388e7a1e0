//! Typed error definitions for the feed reader.
//!
//! [`FeedError`] covers the connection-level failures that end the control
//! loop. [`ExtractError`] is scoped to a single message: it is reported and
//! the message dropped, but the stream keeps flowing. Both implement
//! `std::error::Error` via `thiserror`, so they integrate with `anyhow::Result`.

use thiserror::Error;

/// Connection-level errors. Any of these stops the control loop.
#[derive(Debug, Error)]
pub enum FeedError {
    /// WebSocket connection, handshake, or read error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The server closed the connection or the stream ended.
    #[error("feed stream closed: {0}")]
    StreamClosed(String),

    /// The worker pool is gone and can no longer accept messages.
    #[error("worker pool closed")]
    PoolClosed,
}

/// Failure to turn one complete message into a [`crate::Transaction`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The bytes are not valid JSON (or not a JSON object).
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// A field is present but has the wrong JSON type.
    #[error("field `{field}` is not {expected}")]
    WrongType { field: String, expected: &'static str },

    /// Summing the amounts for one address overflowed `u64`.
    #[error("amount overflow aggregating `{0}`")]
    AmountOverflow(String),
}
