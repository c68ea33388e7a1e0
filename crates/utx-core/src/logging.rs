//! Logging initialization using the `tracing` ecosystem.
//!
//! Log lines always go to stderr so that stdout carries only rendered
//! transactions. Optionally:
//! - a daily-rotating file via `tracing-appender`
//! - JSON formatting for both sinks, for log shippers
//!
//! `RUST_LOG` overrides the configured level.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging settings, usually filled from the command line.
#[derive(Debug, Clone)]
pub struct LogOptions<'a> {
    /// Default level if `RUST_LOG` is not set (e.g. `"info"`).
    pub level: &'a str,
    /// Directory for daily-rotating log files. Console only when `None`.
    pub dir: Option<&'a str>,
    /// Log file prefix (e.g. `"utx-runner"`).
    pub file_prefix: &'a str,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
}

/// Initialize the global tracing subscriber. Call once at program start.
pub fn init_logging(opts: &LogOptions<'_>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(opts.level));

    let console_layer = if opts.json {
        fmt::layer().json().with_writer(std::io::stderr).with_thread_ids(true).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).with_target(true).with_thread_ids(true).with_ansi(true).boxed()
    };

    let file_layer = opts.dir.map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, opts.file_prefix);
        if opts.json {
            fmt::layer().json().with_writer(appender).with_thread_ids(true).boxed()
        } else {
            fmt::layer().with_writer(appender).with_ansi(false).with_target(true).with_thread_ids(true).boxed()
        }
    });

    tracing_subscriber::registry().with(env_filter).with(console_layer).with(file_layer).init();
}
