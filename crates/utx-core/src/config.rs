//! Configuration parsing for the feed reader.
//!
//! Settings come from an optional JSON file. Every field is optional; the
//! `effective_*` accessors supply defaults, so an empty object (or no file at
//! all, via [`AppConfig::default`]) yields a working setup against the public
//! blockchain.info feed.
//!
//! # Example config
//!
//! ```json
//! {
//!   "feed": {
//!     "url": "wss://ws.blockchain.info:443/inv",
//!     "subscribe_op": "unconfirmed_sub",
//!     "ping_interval_sec": 30
//!   },
//!   "workers": { "count": 4, "queue_capacity": 1024, "cpu_affinity": [2, 3] },
//!   "stats_interval_sec": 60
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Default feed endpoint.
pub const DEFAULT_FEED_URL: &str = "wss://ws.blockchain.info:443/inv";

/// Default `Origin` header sent with the WebSocket handshake.
pub const DEFAULT_ORIGIN: &str = "http://localhost/";

/// Subscription op requesting unconfirmed-transaction notifications.
pub const DEFAULT_SUBSCRIBE_OP: &str = "unconfirmed_sub";

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Feed connection settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Extraction worker pool settings.
    #[serde(default)]
    pub workers: WorkerConfig,

    /// Interval between periodic stats log lines (default: 60).
    pub stats_interval_sec: Option<u64>,
}

impl AppConfig {
    /// Returns the stats print interval, or `None` if set to 0.
    pub fn stats_interval(&self) -> Option<Duration> {
        match self.stats_interval_sec.unwrap_or(60) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Feed endpoint and subscription settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedConfig {
    /// WebSocket URL.
    pub url: Option<String>,

    /// `Origin` header for the handshake.
    pub origin: Option<String>,

    /// Value of the `op` field in the subscription message.
    pub subscribe_op: Option<String>,

    /// Keep-alive ping interval in seconds. No pings when absent.
    pub ping_interval_sec: Option<u64>,

    /// Extra HTTP headers for the WebSocket handshake.
    pub extra_headers: Option<HashMap<String, String>>,
}

impl FeedConfig {
    pub fn effective_url(&self) -> String {
        self.url.clone().unwrap_or_else(|| DEFAULT_FEED_URL.to_string())
    }

    pub fn effective_origin(&self) -> String {
        self.origin.clone().unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
    }

    /// Build the subscription message, e.g. `{"op":"unconfirmed_sub"}`.
    pub fn subscribe_msg(&self) -> String {
        let op = self.subscribe_op.as_deref().unwrap_or(DEFAULT_SUBSCRIBE_OP);
        serde_json::json!({ "op": op }).to_string()
    }

    pub fn ping_interval(&self) -> Option<Duration> {
        self.ping_interval_sec.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerConfig {
    /// Number of extraction workers (default: available parallelism).
    pub count: Option<usize>,

    /// Bounded queue capacity between the control loop and workers
    /// (default: 1024).
    pub queue_capacity: Option<usize>,

    /// CPU cores to pin workers to, assigned round-robin.
    pub cpu_affinity: Option<Vec<i32>>,
}

impl WorkerConfig {
    /// Returns the worker count, never less than 1.
    pub fn effective_count(&self) -> usize {
        self.count
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1)
    }

    /// Returns the queue capacity, never less than 1.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(1024).max(1)
    }

    /// CPU core for the worker at `idx`, if affinity is configured.
    pub fn core_for(&self, idx: usize) -> Option<i32> {
        self.cpu_affinity.as_ref().filter(|c| !c.is_empty()).map(|cores| cores[idx % cores.len()])
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}
