//! Fixed-capacity receive buffer.

/// A response would not fit in the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("response exceeds receive buffer ({attempted} bytes > {capacity} byte capacity)")]
pub struct BufferOverflow {
    pub capacity: usize,
    pub attempted: usize,
}

/// Receive buffer with a hard ceiling.
///
/// Storage is allocated once at construction and never grows. Appending past
/// the capacity is refused as a whole (nothing of the offending chunk is
/// written), so a caller can never end up parsing a truncated response.
#[derive(Debug)]
pub struct ResponseBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl ResponseBuffer {
    /// Allocate a buffer of exactly `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Append a chunk at the write cursor.
    pub fn extend(&mut self, chunk: &[u8]) -> Result<(), BufferOverflow> {
        let attempted = self.len + chunk.len();
        if attempted > self.data.len() {
            return Err(BufferOverflow {
                capacity: self.data.len(),
                attempted,
            });
        }
        self.data[self.len..attempted].copy_from_slice(chunk);
        self.len = attempted;
        Ok(())
    }

    /// Reset the write cursor. Previously written bytes become unreachable.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The bytes written since the last [`ResponseBuffer::clear`].
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}
