//! Pipeline counters shared by the control loop and the workers.
//!
//! All counters are relaxed atomics; they are for operators reading logs, not
//! for synchronization.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FeedStats {
    chunks: AtomicU64,
    bytes: AtomicU64,
    dispatched: AtomicU64,
    transactions: AtomicU64,
    control: AtomicU64,
    failures: AtomicU64,
    backpressure_waits: AtomicU64,
}

/// Point-in-time copy of [`FeedStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub chunks: u64,
    pub bytes: u64,
    pub dispatched: u64,
    pub transactions: u64,
    pub control: u64,
    pub failures: u64,
    pub backpressure_waits: u64,
}

impl FeedStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_chunk(&self, len: usize) {
        self.chunks.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_transaction(&self) {
        self.transactions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_control(&self) {
        self.control.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            chunks: self.chunks.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
            control: self.control.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            backpressure_waits: self.backpressure_waits.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Messages handed to workers that have not been accounted for yet.
    pub fn in_flight(&self) -> u64 {
        self.dispatched.saturating_sub(self.transactions + self.control + self.failures)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunks={} bytes={} dispatched={} tx={} control={} failed={} in_flight={} backpressure={}",
            self.chunks,
            self.bytes,
            self.dispatched,
            self.transactions,
            self.control,
            self.failures,
            self.in_flight(),
            self.backpressure_waits,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = FeedStats::new();
        stats.record_chunk(10);
        stats.record_chunk(5);
        stats.record_dispatch();
        stats.record_dispatch();
        stats.record_dispatch();
        stats.record_transaction();
        stats.record_failure();
        let snap = stats.snapshot();
        assert_eq!(snap.chunks, 2);
        assert_eq!(snap.bytes, 15);
        assert_eq!(snap.in_flight(), 1);
    }

    #[test]
    fn display_one_line() {
        let snap = StatsSnapshot { chunks: 1, bytes: 2, dispatched: 3, transactions: 2, ..Default::default() };
        assert_eq!(
            snap.to_string(),
            "chunks=1 bytes=2 dispatched=3 tx=2 control=0 failed=0 in_flight=1 backpressure=0"
        );
    }
}
