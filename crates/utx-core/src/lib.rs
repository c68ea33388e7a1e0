//! # utx-core
//!
//! Core crate for the unconfirmed-transaction feed reader, providing:
//!
//! - **Types** (`types`) — the aggregated [`Transaction`] record
//! - **Units** (`units`) — smallest-unit to decimal conversion
//! - **Configuration** (`config`) — JSON config deserialization
//! - **Error types** (`error`) — `FeedError` and `ExtractError` via thiserror
//! - **WebSocket** (`ws`) — feed connection: dial, subscribe, read chunks
//! - **CPU affinity** (`cpu_affinity`) — thread-to-core pinning for workers
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod cpu_affinity;
pub mod error;
pub mod logging;
pub mod types;
pub mod units;
pub mod ws;

// Re-export types at crate root for convenience.
pub use types::*;
