//! Length-prefixed string, array and byte containers
//!
//! Each container comes in a standard and a compact form:
//!
//! ```text
//! standard string   int16 length, -1 = null
//! compact string    uvarint length+1, 0 = null
//! standard array    int32 count, -1 = null
//! compact array     uvarint count+1, 0 = null
//! compact bytes     uvarint length+1, 0 = null
//! ```
//!
//! The `put_*`/`get_*` functions are what message schemas call directly; the
//! newtypes at the bottom wrap them as standalone [`Wire`] values.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KraftError, Result};
use super::codec::{get_unsigned_varint, put_unsigned_varint, take, Wire};

// =============================================================================
// Length Fields
// =============================================================================

/// Read a compact length field: `Ok(None)` for null, else the real length
fn get_compact_len(buf: &mut &[u8]) -> Result<Option<usize>> {
    match get_unsigned_varint(buf)? {
        0 => Ok(None),
        n => Ok(Some(n as usize - 1)),
    }
}

fn put_compact_len(buf: &mut BytesMut, len: Option<usize>) {
    match len {
        None => put_unsigned_varint(buf, 0),
        Some(n) => put_unsigned_varint(buf, n.min(MAX_COMPACT_LEN) as u32 + 1),
    }
}

/// Longest payload a standard (int16) string length can describe
pub const MAX_STRING_LEN: usize = i16::MAX as usize;

/// Longest payload a standard (int32) array count can describe
pub const MAX_ARRAY_LEN: usize = i32::MAX as usize;

/// Longest payload a compact (uvarint length+1) field can describe
pub const MAX_COMPACT_LEN: usize = u32::MAX as usize - 1;

/// Cut `s` to at most `max` bytes on a character boundary
///
/// Encoders never fail, so an oversized value is shortened rather than
/// written behind a wrapped length prefix.
fn clamp_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!("Truncating {}-byte string to {} bytes", s.len(), end);
    &s[..end]
}

/// Cut a slice to at most `max` elements
fn clamp_slice<T>(items: &[T], max: usize) -> &[T] {
    if items.len() > max {
        tracing::warn!("Truncating {}-element field to {}", items.len(), max);
        &items[..max]
    } else {
        items
    }
}

/// Upper bound for `Vec::with_capacity` from an untrusted count
fn capacity_hint(count: usize, remaining: usize) -> usize {
    count.min(remaining)
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| KraftError::InvalidUtf8)
}

// =============================================================================
// Strings
// =============================================================================

/// Standard nullable string: int16 length, -1 = null
pub fn put_nullable_string(buf: &mut BytesMut, value: Option<&str>) {
    match value {
        None => buf.put_i16(-1),
        Some(s) => {
            let s = clamp_str(s, MAX_STRING_LEN);
            buf.put_i16(s.len() as i16);
            buf.put_slice(s.as_bytes());
        }
    }
}

pub fn get_nullable_string(buf: &mut &[u8]) -> Result<Option<String>> {
    let len = i16::decode(buf)?;
    match len {
        -1 => Ok(None),
        n if n < 0 => Err(KraftError::InvalidLength(i64::from(n))),
        n => utf8(take(buf, n as usize)?).map(Some),
    }
}

/// Compact non-nullable string
pub fn put_compact_string(buf: &mut BytesMut, value: &str) {
    put_compact_nullable_string(buf, Some(value));
}

/// Compact non-nullable string; a null length is rejected
pub fn get_compact_string(buf: &mut &[u8]) -> Result<String> {
    get_compact_nullable_string(buf)?.ok_or(KraftError::InvalidLength(-1))
}

pub fn put_compact_nullable_string(buf: &mut BytesMut, value: Option<&str>) {
    let value = value.map(|s| clamp_str(s, MAX_COMPACT_LEN));
    put_compact_len(buf, value.map(str::len));
    if let Some(s) = value {
        buf.put_slice(s.as_bytes());
    }
}

pub fn get_compact_nullable_string(buf: &mut &[u8]) -> Result<Option<String>> {
    match get_compact_len(buf)? {
        None => Ok(None),
        Some(len) => utf8(take(buf, len)?).map(Some),
    }
}

// =============================================================================
// Bytes
// =============================================================================

/// Compact nullable bytes (used for `records` fields)
pub fn put_compact_nullable_bytes(buf: &mut BytesMut, value: Option<&[u8]>) {
    let value = value.map(|bytes| clamp_slice(bytes, MAX_COMPACT_LEN));
    put_compact_len(buf, value.map(<[u8]>::len));
    if let Some(bytes) = value {
        buf.put_slice(bytes);
    }
}

pub fn get_compact_nullable_bytes(buf: &mut &[u8]) -> Result<Option<Bytes>> {
    match get_compact_len(buf)? {
        None => Ok(None),
        Some(len) => Ok(Some(Bytes::copy_from_slice(take(buf, len)?))),
    }
}

// =============================================================================
// Arrays
// =============================================================================

/// Standard nullable array with a custom element encoder
pub fn put_array_with<T>(
    buf: &mut BytesMut,
    items: Option<&[T]>,
    mut put: impl FnMut(&mut BytesMut, &T),
) {
    match items {
        None => buf.put_i32(-1),
        Some(items) => {
            let items = clamp_slice(items, MAX_ARRAY_LEN);
            buf.put_i32(items.len() as i32);
            for item in items {
                put(buf, item);
            }
        }
    }
}

/// Standard nullable array with a custom element decoder
pub fn get_array_with<T>(
    buf: &mut &[u8],
    mut get: impl FnMut(&mut &[u8]) -> Result<T>,
) -> Result<Option<Vec<T>>> {
    let count = i32::decode(buf)?;
    match count {
        -1 => Ok(None),
        n if n < 0 => Err(KraftError::InvalidLength(i64::from(n))),
        n => {
            let count = n as usize;
            let mut items = Vec::with_capacity(capacity_hint(count, buf.len()));
            for _ in 0..count {
                items.push(get(buf)?);
            }
            Ok(Some(items))
        }
    }
}

/// Compact nullable array with a custom element encoder
pub fn put_compact_array_with<T>(
    buf: &mut BytesMut,
    items: Option<&[T]>,
    mut put: impl FnMut(&mut BytesMut, &T),
) {
    let items = items.map(|items| clamp_slice(items, MAX_COMPACT_LEN));
    put_compact_len(buf, items.map(<[T]>::len));
    for item in items.unwrap_or_default() {
        put(buf, item);
    }
}

/// Compact nullable array with a custom element decoder
pub fn get_compact_array_with<T>(
    buf: &mut &[u8],
    mut get: impl FnMut(&mut &[u8]) -> Result<T>,
) -> Result<Option<Vec<T>>> {
    match get_compact_len(buf)? {
        None => Ok(None),
        Some(count) => {
            let mut items = Vec::with_capacity(capacity_hint(count, buf.len()));
            for _ in 0..count {
                items.push(get(buf)?);
            }
            Ok(Some(items))
        }
    }
}

/// Compact non-nullable array of wire values
pub fn put_compact_array<T: Wire>(buf: &mut BytesMut, items: &[T]) {
    put_compact_array_with(buf, Some(items), |buf, item| item.encode(buf));
}

/// Compact non-nullable array of wire values; a null count is rejected
pub fn get_compact_array<T: Wire>(buf: &mut &[u8]) -> Result<Vec<T>> {
    get_compact_array_with(buf, T::decode)?.ok_or(KraftError::InvalidLength(-1))
}

pub fn put_compact_nullable_array<T: Wire>(buf: &mut BytesMut, items: Option<&[T]>) {
    put_compact_array_with(buf, items, |buf, item| item.encode(buf));
}

pub fn get_compact_nullable_array<T: Wire>(buf: &mut &[u8]) -> Result<Option<Vec<T>>> {
    get_compact_array_with(buf, T::decode)
}

// =============================================================================
// Standalone Wire Values
// =============================================================================

/// Standard nullable string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NullableString(pub Option<String>);

/// Compact non-null string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompactString(pub String);

/// Compact nullable string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompactNullableString(pub Option<String>);

/// Standard nullable array
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Array<T>(pub Option<Vec<T>>);

/// Compact nullable array
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompactArray<T>(pub Option<Vec<T>>);

/// Compact nullable byte string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompactBytes(pub Option<Bytes>);

impl Wire for NullableString {
    fn encode(&self, buf: &mut BytesMut) {
        put_nullable_string(buf, self.0.as_deref());
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_nullable_string(buf).map(Self)
    }
}

impl Wire for CompactString {
    fn encode(&self, buf: &mut BytesMut) {
        put_compact_string(buf, &self.0);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_compact_string(buf).map(Self)
    }
}

impl Wire for CompactNullableString {
    fn encode(&self, buf: &mut BytesMut) {
        put_compact_nullable_string(buf, self.0.as_deref());
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_compact_nullable_string(buf).map(Self)
    }
}

impl<T: Wire> Wire for Array<T> {
    fn encode(&self, buf: &mut BytesMut) {
        put_array_with(buf, self.0.as_deref(), |buf, item| item.encode(buf));
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_array_with(buf, T::decode).map(Self)
    }
}

impl<T: Wire> Wire for CompactArray<T> {
    fn encode(&self, buf: &mut BytesMut) {
        put_compact_nullable_array(buf, self.0.as_deref());
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_compact_nullable_array(buf).map(Self)
    }
}

impl Wire for CompactBytes {
    fn encode(&self, buf: &mut BytesMut) {
        put_compact_nullable_bytes(buf, self.0.as_deref());
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_compact_nullable_bytes(buf).map(Self)
    }
}
