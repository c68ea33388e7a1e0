//! Bounded pool of extraction workers.
//!
//! Completed messages travel from the control loop to a fixed set of worker
//! threads over a bounded crossbeam channel. Each worker decodes messages
//! into [`Transaction`]s and hands them to the sink callback. Workers share
//! nothing but the receiver and the stats counters; completion order across
//! workers is unspecified.
//!
//! When the queue is full, [`WorkerPool::submit`] waits for room, so the
//! control loop stops reading the transport until workers catch up.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, info, warn};
use utx_core::config::WorkerConfig;
use utx_core::error::FeedError;
use utx_core::{Transaction, cpu_affinity};

use crate::extractor::{FeedEvent, decode_event};
use crate::stats::FeedStats;

/// Callback invoked on a worker thread for each decoded transaction.
pub type OnTransaction = Arc<dyn Fn(Transaction) + Send + Sync>;

/// Bytes of one complete message, owned by whoever holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Position in the stream, starting at 0. Used in log lines.
    pub seq: u64,
    pub bytes: Vec<u8>,
}

/// Fixed-size pool of blocking extraction workers.
pub struct WorkerPool {
    tx: Sender<RawMessage>,
    workers: Vec<tokio::task::JoinHandle<()>>,
    stats: Arc<FeedStats>,
}

impl WorkerPool {
    /// Spawn the workers. Must be called from within a tokio runtime.
    pub fn start(config: &WorkerConfig, on_tx: OnTransaction, stats: Arc<FeedStats>) -> Self {
        let count = config.effective_count();
        let capacity = config.effective_queue_capacity();
        let (tx, rx) = crossbeam_channel::bounded::<RawMessage>(capacity);

        let workers = (0..count)
            .map(|id| {
                let rx = rx.clone();
                let on_tx = on_tx.clone();
                let stats = stats.clone();
                let cpu_core = config.core_for(id);
                tokio::task::spawn_blocking(move || run_worker(id, rx, on_tx, stats, cpu_core))
            })
            .collect();

        info!("[pool] started {count} worker(s), queue capacity {capacity}");
        Self { tx, workers, stats }
    }

    /// Queue a message for extraction, waiting for room if the queue is full.
    pub async fn submit(&self, msg: RawMessage) -> Result<(), FeedError> {
        match self.tx.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(msg)) => {
                self.stats.record_backpressure();
                debug!("[pool] queue full, holding message #{} until a worker frees a slot", msg.seq);
                let tx = self.tx.clone();
                tokio::task::spawn_blocking(move || tx.send(msg))
                    .await
                    .map_err(|_| FeedError::PoolClosed)?
                    .map_err(|_| FeedError::PoolClosed)
            }
            Err(TrySendError::Disconnected(_)) => Err(FeedError::PoolClosed),
        }
    }

    /// Close the queue, let workers drain it, and wait for them to exit.
    pub async fn shutdown(self) {
        let Self { tx, workers, .. } = self;
        drop(tx);
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("[pool] worker task failed: {e}");
            }
        }
        info!("[pool] all workers stopped");
    }
}

/// Worker loop: decode each queued message until the queue closes.
fn run_worker(
    id: usize,
    rx: Receiver<RawMessage>,
    on_tx: OnTransaction,
    stats: Arc<FeedStats>,
    cpu_core: Option<i32>,
) {
    let label = format!("worker-{id}");
    cpu_affinity::maybe_pin(&label, cpu_core);
    debug!("[{label}] started");

    while let Ok(msg) = rx.recv() {
        match decode_event(&msg.bytes) {
            Ok(FeedEvent::Transaction(tx)) => {
                stats.record_transaction();
                on_tx(tx);
            }
            Ok(FeedEvent::Control(op)) => {
                stats.record_control();
                debug!("[{label}] message #{} is control op `{op}`", msg.seq);
            }
            Err(e) => {
                stats.record_failure();
                warn!("[{label}] message #{} dropped: {e}", msg.seq);
                debug!("[{label}] message #{} body: {}", msg.seq, preview(&msg.bytes));
            }
        }
    }

    debug!("[{label}] exited");
}

/// First 256 bytes of a message, lossily decoded, for log lines.
fn preview(bytes: &[u8]) -> String {
    const MAX: usize = 256;
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(MAX)]);
    if bytes.len() > MAX { format!("{head}...") } else { head.into_owned() }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    const GOOD: &str = r#"{"op":"utx","x":{"hash":"abc123","time":1000,"out":[{"addr":"A","value":500}],"inputs":[]}}"#;

    fn msg(seq: u64, body: &str) -> RawMessage {
        RawMessage { seq, bytes: body.as_bytes().to_vec() }
    }

    fn config(count: usize, capacity: usize) -> WorkerConfig {
        WorkerConfig { count: Some(count), queue_capacity: Some(capacity), cpu_affinity: None }
    }

    fn collecting_sink() -> (OnTransaction, Arc<Mutex<Vec<Transaction>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: OnTransaction = Arc::new(move |tx| sink_seen.lock().unwrap().push(tx));
        (sink, seen)
    }

    #[tokio::test]
    async fn decodes_and_counts() {
        let stats = Arc::new(FeedStats::new());
        let (sink, seen) = collecting_sink();
        let pool = WorkerPool::start(&config(2, 8), sink, stats.clone());

        pool.submit(msg(0, GOOD)).await.unwrap();
        pool.submit(msg(1, r#"{"op":"utx","x":{"time":1}}"#)).await.unwrap();
        pool.submit(msg(2, r#"{"op":"pong"}"#)).await.unwrap();
        pool.submit(msg(3, GOOD)).await.unwrap();
        pool.shutdown().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|tx| tx.id() == "abc123"));

        let snap = stats.snapshot();
        assert_eq!(snap.transactions, 2);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.control, 1);
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure() {
        let stats = Arc::new(FeedStats::new());
        let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
        let gate_rx = Mutex::new(gate_rx);
        let (out_tx, out_rx) = std::sync::mpsc::channel::<Transaction>();
        let out_tx = Mutex::new(out_tx);

        // Sink blocks until the gate sender is dropped.
        let sink: OnTransaction = Arc::new(move |tx| {
            let _ = gate_rx.lock().unwrap().recv();
            let _ = out_tx.lock().unwrap().send(tx);
        });

        let pool = Arc::new(WorkerPool::start(&config(1, 1), sink, stats.clone()));
        let submitter = {
            let pool = pool.clone();
            tokio::spawn(async move {
                for seq in 0..3 {
                    pool.submit(msg(seq, GOOD)).await.unwrap();
                }
            })
        };

        // One message in the worker, one in the queue; the third must wait.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!submitter.is_finished());
        assert!(stats.snapshot().backpressure_waits >= 1);

        drop(gate_tx);
        submitter.await.unwrap();

        let Ok(pool) = Arc::try_unwrap(pool) else { panic!("pool still shared") };
        pool.shutdown().await;
        assert_eq!(out_rx.try_iter().count(), 3);
    }

    #[tokio::test]
    async fn shutdown_drains_queue() {
        let stats = Arc::new(FeedStats::new());
        let (sink, seen) = collecting_sink();
        let pool = WorkerPool::start(&config(1, 64), sink, stats);
        for seq in 0..20 {
            pool.submit(msg(seq, GOOD)).await.unwrap();
        }
        pool.shutdown().await;
        assert_eq!(seen.lock().unwrap().len(), 20);
    }

    #[test]
    fn preview_truncates() {
        let long = vec![b'a'; 300];
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.len(), 259);
        assert_eq!(preview(b"{}"), "{}");
    }
}
