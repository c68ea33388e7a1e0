//! # utx-stream
//!
//! Turns the unframed byte stream of the push feed into [`Transaction`]
//! records.
//!
//! ## Architecture
//!
//! ```text
//! ChunkSource ──► Dispatcher ──► ByteAccumulator ──► is_complete?
//!                     │                                  │ yes
//!                     │◄──── fresh buffer ───────────────┘
//!                     └──► WorkerPool (bounded queue) ──► extractor ──► sink
//! ```
//!
//! - [`accumulator`] — growable byte buffer with ownership handoff
//! - [`boundary`] — trial-parse message boundary detection
//! - [`extractor`] — JSON message to [`Transaction`] with aggregation
//! - [`worker_pool`] — bounded pool of blocking extraction workers
//! - [`dispatcher`] — the control loop
//! - [`stats`] — pipeline counters
//! - [`json_util`] — field navigation helpers with path-aware errors
//!
//! [`Transaction`]: utx_core::Transaction

pub mod accumulator;
pub mod boundary;
pub mod dispatcher;
pub mod extractor;
pub mod json_util;
pub mod stats;
pub mod worker_pool;

use async_trait::async_trait;
use utx_core::error::FeedError;
use utx_core::ws::FeedConnection;

/// A transport that yields raw byte chunks.
///
/// Chunk boundaries carry no meaning: a message may span several chunks.
/// An `Err` is unrecoverable and ends the dispatcher.
#[async_trait]
pub trait ChunkSource: Send {
    /// Wait for the next chunk of bytes.
    async fn next_chunk(&mut self) -> Result<Vec<u8>, FeedError>;
}

#[async_trait]
impl ChunkSource for FeedConnection {
    async fn next_chunk(&mut self) -> Result<Vec<u8>, FeedError> {
        FeedConnection::next_chunk(self).await
    }
}
