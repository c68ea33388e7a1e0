//! The control loop.
//!
//! The dispatcher has two states. While **accumulating** it appends each
//! chunk and checks the buffer with [`is_complete`]. When the check succeeds
//! it is briefly **dispatching**: the buffer is moved into a [`RawMessage`],
//! queued on the [`WorkerPool`], and accumulation restarts from an empty
//! buffer. Extraction never runs on the control loop.
//!
//! The loop only ends when the [`ChunkSource`] fails. That error is returned
//! unchanged; there is no reconnect.

use std::sync::Arc;

use tracing::{debug, trace};
use utx_core::error::FeedError;

use crate::ChunkSource;
use crate::accumulator::ByteAccumulator;
use crate::boundary::is_complete;
use crate::stats::FeedStats;
use crate::worker_pool::{RawMessage, WorkerPool};

/// Outcome of feeding one chunk.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// More bytes are needed.
    Pending,
    /// A full message is ready; the accumulator is already empty again.
    Complete(RawMessage),
}

pub struct Dispatcher {
    acc: ByteAccumulator,
    next_seq: u64,
    stats: Arc<FeedStats>,
}

impl Dispatcher {
    pub fn new(stats: Arc<FeedStats>) -> Self {
        Self { acc: ByteAccumulator::new(), next_seq: 0, stats }
    }

    /// Append a chunk and hand off the buffer if it now holds a full message.
    pub fn on_chunk(&mut self, chunk: &[u8]) -> Step {
        self.stats.record_chunk(chunk.len());
        self.acc.append(chunk);

        if !is_complete(self.acc.snapshot()) {
            trace!("[dispatch] {} byte(s) pending", self.acc.len());
            return Step::Pending;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        Step::Complete(RawMessage { seq, bytes: self.acc.take() })
    }

    /// Bytes accumulated toward the next message.
    pub fn pending_bytes(&self) -> usize {
        self.acc.len()
    }

    /// Read chunks from `source` forever, queueing each full message on `pool`.
    ///
    /// Returns only on a transport failure or if the pool has shut down.
    pub async fn run<S>(&mut self, source: &mut S, pool: &WorkerPool) -> Result<(), FeedError>
    where
        S: ChunkSource + ?Sized,
    {
        loop {
            let chunk = source.next_chunk().await?;
            if let Step::Complete(msg) = self.on_chunk(&chunk) {
                debug!("[dispatch] message #{} complete ({} bytes)", msg.seq, msg.bytes.len());
                self.stats.record_dispatch();
                pool.submit(msg).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use utx_core::Transaction;
    use utx_core::config::WorkerConfig;

    use super::*;
    use crate::extractor::extract;
    use crate::worker_pool::OnTransaction;

    const MSG: &str = r#"{"op":"utx","x":{"hash":"abc123","time":1000,"out":[{"addr":"A","value":500},{"addr":"A","value":250}],"inputs":[{"prev_out":{"addr":"B","value":700}}]}}"#;
    const MSG2: &str = r#"{"op":"utx","x":{"hash":"def456","time":1001,"out":[{"addr":"C","value":1}],"inputs":[{"prev_out":{"addr":"D","value":2}}]}}"#;
    const NO_HASH: &str = r#"{"op":"utx","x":{"time":1000,"out":[],"inputs":[]}}"#;

    /// Replays a fixed list of chunks, then reports the stream as closed.
    struct ScriptedSource {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ScriptedSource {
        fn new(chunks: &[&[u8]]) -> Self {
            Self { chunks: chunks.iter().map(|c| c.to_vec()).collect() }
        }
    }

    #[async_trait]
    impl ChunkSource for ScriptedSource {
        async fn next_chunk(&mut self) -> Result<Vec<u8>, FeedError> {
            self.chunks.pop_front().ok_or_else(|| FeedError::StreamClosed("script exhausted".into()))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(FeedStats::new()))
    }

    fn pool_config(count: usize) -> WorkerConfig {
        WorkerConfig { count: Some(count), queue_capacity: Some(16), cpu_affinity: None }
    }

    #[test]
    fn single_chunk_completes() {
        let mut d = dispatcher();
        match d.on_chunk(MSG.as_bytes()) {
            Step::Complete(msg) => {
                assert_eq!(msg.seq, 0);
                assert_eq!(msg.bytes, MSG.as_bytes());
            }
            Step::Pending => panic!("expected complete"),
        }
        assert_eq!(d.pending_bytes(), 0);
    }

    #[test]
    fn split_at_any_offset_matches_whole() {
        let whole = extract(MSG.as_bytes()).unwrap();
        let bytes = MSG.as_bytes();
        for at in 1..bytes.len() {
            let mut d = dispatcher();
            assert_eq!(d.on_chunk(&bytes[..at]), Step::Pending, "split at {at}");
            match d.on_chunk(&bytes[at..]) {
                Step::Complete(msg) => assert_eq!(extract(&msg.bytes).unwrap(), whole),
                Step::Pending => panic!("split at {at} never completed"),
            }
        }
    }

    #[test]
    fn sequence_numbers_advance() {
        let mut d = dispatcher();
        let mut seqs = Vec::new();
        for body in [MSG, MSG2] {
            if let Step::Complete(msg) = d.on_chunk(body.as_bytes()) {
                seqs.push(msg.seq);
            }
        }
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn buffer_resets_between_messages() {
        let mut d = dispatcher();
        let (a, b) = MSG2.as_bytes().split_at(10);
        assert!(matches!(d.on_chunk(MSG.as_bytes()), Step::Complete(_)));
        assert_eq!(d.on_chunk(a), Step::Pending);
        assert_eq!(d.pending_bytes(), 10);
        match d.on_chunk(b) {
            Step::Complete(msg) => assert_eq!(msg.bytes, MSG2.as_bytes()),
            Step::Pending => panic!("expected complete"),
        }
    }

    #[tokio::test]
    async fn bad_message_does_not_stop_the_loop() {
        let stats = Arc::new(FeedStats::new());
        let seen = Arc::new(Mutex::new(Vec::<Transaction>::new()));
        let sink_seen = seen.clone();
        let sink: OnTransaction = Arc::new(move |tx| sink_seen.lock().unwrap().push(tx));
        let pool = WorkerPool::start(&pool_config(2), sink, stats.clone());

        let (head, tail) = MSG.as_bytes().split_at(37);
        let mut source = ScriptedSource::new(&[head, tail, NO_HASH.as_bytes(), MSG2.as_bytes()]);
        let mut d = Dispatcher::new(stats.clone());

        let res = d.run(&mut source, &pool).await;
        assert!(matches!(res, Err(FeedError::StreamClosed(_))));
        pool.shutdown().await;

        let mut ids: Vec<String> = seen.lock().unwrap().iter().map(|tx| tx.id().to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["abc123", "def456"]);

        let snap = stats.snapshot();
        assert_eq!(snap.chunks, 4);
        assert_eq!(snap.dispatched, 3);
        assert_eq!(snap.transactions, 2);
        assert_eq!(snap.failures, 1);
    }

    #[tokio::test]
    async fn slow_extraction_does_not_block_accumulation() {
        let stats = Arc::new(FeedStats::new());
        let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
        let gate_rx = Mutex::new(gate_rx);
        let seen = Arc::new(Mutex::new(Vec::<Transaction>::new()));
        let sink_seen = seen.clone();
        let sink: OnTransaction = Arc::new(move |tx| {
            let _ = gate_rx.lock().unwrap().recv();
            sink_seen.lock().unwrap().push(tx);
        });
        let pool = WorkerPool::start(&pool_config(1), sink, stats.clone());

        let (head, tail) = MSG2.as_bytes().split_at(20);
        let mut source = ScriptedSource::new(&[MSG.as_bytes(), head, tail]);
        let mut d = Dispatcher::new(stats.clone());

        // The sink for message 0 is still blocked, yet the loop consumes
        // every chunk of message 1 and reaches the end of the script.
        let res = tokio::time::timeout(Duration::from_secs(5), d.run(&mut source, &pool)).await;
        assert!(matches!(res, Ok(Err(FeedError::StreamClosed(_)))));
        assert_eq!(stats.snapshot().dispatched, 2);
        assert!(seen.lock().unwrap().is_empty());

        drop(gate_tx);
        pool.shutdown().await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transport_error_is_returned() {
        let pool = WorkerPool::start(&pool_config(1), Arc::new(|_: Transaction| {}), Arc::new(FeedStats::new()));
        let mut source = ScriptedSource::new(&[b"{\"op\":".as_slice()]);
        let mut d = dispatcher();
        let res = d.run(&mut source, &pool).await;
        assert!(matches!(res, Err(FeedError::StreamClosed(_))));
        assert_eq!(d.pending_bytes(), 6);
        pool.shutdown().await;
    }
}
