//! Record batches
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────────┐
//! │ base_offset (8) │ batch_len (4)   │ partition_leader_epoch (4)   │
//! ├─────────────────┼─────────────────┼──────────────────────────────┤
//! │ magic (1)       │ crc (4)         │ attributes (2)               │
//! ├─────────────────┼─────────────────┼──────────────────────────────┤
//! │ last_offset_delta (4)             │ base_timestamp (8)           │
//! ├───────────────────────────────────┼──────────────────────────────┤
//! │ max_timestamp (8)                 │ producer_id (8)              │
//! ├───────────────────────────────────┼──────────────────────────────┤
//! │ producer_epoch (2)                │ base_sequence (4)            │
//! ├───────────────────────────────────┴──────────────────────────────┤
//! │ record_count (4)  records...                                     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `batch_len` counts every byte after itself. The CRC is carried through
//! untouched and never verified.

use bytes::{BufMut, BytesMut};

use crate::error::{KraftError, Result};
use crate::protocol::codec::{take, Wire};
use crate::protocol::types::{get_array_with, put_array_with};
use super::record::Record;

/// Bytes before the part covered by `batch_len` (base offset + length)
pub const LOG_OVERHEAD: usize = 12;

/// Fixed header size including the record count
pub const BATCH_HEADER_SIZE: usize = 61;

/// Record batch format version this decoder expects
pub const CURRENT_MAGIC: i8 = 2;

/// A batch of records from a log segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBatch {
    pub base_offset: i64,
    pub partition_leader_epoch: i32,
    pub magic: i8,
    pub crc: u32,
    pub attributes: i16,
    pub last_offset_delta: i32,
    pub base_timestamp: i64,
    pub max_timestamp: i64,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub base_sequence: i32,
    pub records: Vec<Record>,
}

impl RecordBatch {
    /// Batch of `records` starting at `base_offset`, with non-transactional defaults
    pub fn new(base_offset: i64, records: Vec<Record>) -> Self {
        let last_offset_delta = records.len().saturating_sub(1) as i32;
        Self {
            base_offset,
            partition_leader_epoch: 0,
            magic: CURRENT_MAGIC,
            crc: 0,
            attributes: 0,
            last_offset_delta,
            base_timestamp: 0,
            max_timestamp: 0,
            producer_id: -1,
            producer_epoch: -1,
            base_sequence: -1,
            records,
        }
    }

    /// Offset of the last record in the batch
    pub fn last_offset(&self) -> i64 {
        self.base_offset + i64::from(self.last_offset_delta)
    }
}

impl Wire for RecordBatch {
    fn encode(&self, buf: &mut BytesMut) {
        let mut body = BytesMut::with_capacity(BATCH_HEADER_SIZE - LOG_OVERHEAD);
        self.partition_leader_epoch.encode(&mut body);
        self.magic.encode(&mut body);
        self.crc.encode(&mut body);
        self.attributes.encode(&mut body);
        self.last_offset_delta.encode(&mut body);
        self.base_timestamp.encode(&mut body);
        self.max_timestamp.encode(&mut body);
        self.producer_id.encode(&mut body);
        self.producer_epoch.encode(&mut body);
        self.base_sequence.encode(&mut body);
        put_array_with(&mut body, Some(self.records.as_slice()), |buf, r| r.encode(buf));

        self.base_offset.encode(buf);
        buf.put_i32(body.len() as i32);
        buf.put_slice(&body);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let base_offset = i64::decode(buf)?;
        let batch_length = i32::decode(buf)?;
        if batch_length < 0 {
            return Err(KraftError::InvalidLength(i64::from(batch_length)));
        }
        let mut body = take(buf, batch_length as usize)?;

        let partition_leader_epoch = i32::decode(&mut body)?;
        let magic = i8::decode(&mut body)?;
        let crc = u32::decode(&mut body)?;
        let attributes = i16::decode(&mut body)?;
        let last_offset_delta = i32::decode(&mut body)?;
        let base_timestamp = i64::decode(&mut body)?;
        let max_timestamp = i64::decode(&mut body)?;
        let producer_id = i64::decode(&mut body)?;
        let producer_epoch = i16::decode(&mut body)?;
        let base_sequence = i32::decode(&mut body)?;
        let records = get_array_with(&mut body, Record::decode)?.unwrap_or_default();

        if !body.is_empty() {
            tracing::trace!(
                "Batch at offset {} has {} trailing bytes",
                base_offset,
                body.len()
            );
        }

        Ok(Self {
            base_offset,
            partition_leader_epoch,
            magic,
            crc,
            attributes,
            last_offset_delta,
            base_timestamp,
            max_timestamp,
            producer_id,
            producer_epoch,
            base_sequence,
            records,
        })
    }
}

/// Decode one batch from the front of `bytes`
///
/// Returns the batch and the number of bytes it occupied
pub fn decode_batch(bytes: &[u8]) -> Result<(RecordBatch, usize)> {
    RecordBatch::decode_from(bytes)
}
