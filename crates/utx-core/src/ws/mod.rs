//! WebSocket transport for the push feed.

pub mod client;

pub use client::{FeedConnection, PING_MSG, WsConnConfig};
