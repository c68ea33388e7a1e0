//! Growable buffer for bytes received since the last message boundary.

/// Accumulates chunks in arrival order until a full message is present.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    buf: Vec<u8>,
}

impl ByteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. No size limit.
    #[inline]
    pub fn append(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Discard everything accumulated so far.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Current contents, without mutating state.
    #[inline]
    pub fn snapshot(&self) -> &[u8] {
        &self.buf
    }

    /// Move the accumulated bytes out, leaving a fresh empty buffer.
    ///
    /// The returned `Vec` is owned by the caller; nothing here aliases it.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
