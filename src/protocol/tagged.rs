//! Tagged-field block
//!
//! ```text
//! ┌───────────────┬──────────┬──────────┬───────────┬─────┐
//! │ count (uvar)  │ tag(uvar)│ len(uvar)│ data[len] │ ... │
//! └───────────────┴──────────┴──────────┴───────────┴─────┘
//! ```
//!
//! Payloads are kept as opaque bytes so a decoded block re-encodes
//! byte-for-byte, including tags this crate does not understand.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use super::codec::{get_unsigned_varint, put_unsigned_varint, take, Wire};

/// A single `(tag, bytes)` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedField {
    pub tag: u32,
    pub data: Bytes,
}

/// Ordered list of tagged fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaggedFields(pub Vec<TaggedField>);

impl TaggedFields {
    /// An empty block (encodes as a single `0x00`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping insertion order
    pub fn push(&mut self, tag: u32, data: impl Into<Bytes>) {
        self.0.push(TaggedField {
            tag,
            data: data.into(),
        });
    }

    /// Payload of the first field with `tag`
    pub fn get(&self, tag: u32) -> Option<&Bytes> {
        self.0.iter().find(|f| f.tag == tag).map(|f| &f.data)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Wire for TaggedFields {
    fn encode(&self, buf: &mut BytesMut) {
        put_unsigned_varint(buf, self.0.len() as u32);
        for field in &self.0 {
            put_unsigned_varint(buf, field.tag);
            put_unsigned_varint(buf, field.data.len() as u32);
            buf.put_slice(&field.data);
        }
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let count = get_unsigned_varint(buf)? as usize;
        let mut fields = Vec::with_capacity(count.min(buf.len()));
        for _ in 0..count {
            let tag = get_unsigned_varint(buf)?;
            let len = get_unsigned_varint(buf)? as usize;
            let data = Bytes::copy_from_slice(take(buf, len)?);
            fields.push(TaggedField { tag, data });
        }
        Ok(Self(fields))
    }
}
