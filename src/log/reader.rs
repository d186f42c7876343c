//! Batch Reader
//!
//! Walks a log segment buffer one record batch at a time.

use crate::error::Result;
use super::batch::decode_batch;
use super::RecordBatch;

/// Reads record batches sequentially from an in-memory segment
pub struct BatchReader<'a> {
    data: &'a [u8],
    position: usize,
    failed: bool,
}

impl<'a> BatchReader<'a> {
    /// Start reading at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            failed: false,
        }
    }

    /// Read the next batch, `Ok(None)` once the buffer is exhausted
    pub fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.position >= self.data.len() {
            return Ok(None);
        }
        let (batch, consumed) = decode_batch(&self.data[self.position..])?;
        tracing::trace!(
            "Decoded batch at byte {} (base_offset={}, records={})",
            self.position,
            batch.base_offset,
            batch.records.len()
        );
        self.position += consumed;
        Ok(Some(batch))
    }

    /// Byte position of the next batch
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Yields batches until the buffer ends or the first decode error
impl Iterator for BatchReader<'_> {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
