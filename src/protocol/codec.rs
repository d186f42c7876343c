//! Primitive codec
//!
//! Encoding and decoding rules for every scalar wire type.
//!
//! ## Scalar Types
//! ```text
//! bool            1 byte, 0 = false
//! int8..int64     big-endian two's complement
//! uint32/uint64   big-endian
//! unsigned varint 7 bits per byte, least-significant group first,
//!                 high bit set on every byte except the last
//! varint          zigzag(v) as unsigned varint
//! uuid            16 raw bytes
//! ```
//!
//! Decoding works on a `&mut &[u8]` cursor: every successful decode advances
//! the slice by exactly the bytes it consumed, and a failed decode reports
//! `TruncatedInput` instead of reading past the end.

use bytes::{BufMut, Bytes, BytesMut};
pub use uuid::Uuid;

use crate::error::{KraftError, Result};

/// Maximum groups in an unsigned varint carrying 32 bits
pub const MAX_VARINT_GROUPS: usize = 5;

/// Maximum groups in an unsigned varint carrying 64 bits
pub const MAX_VARLONG_GROUPS: usize = 10;

// =============================================================================
// Wire Trait
// =============================================================================

/// A self-serializing wire value
///
/// Law: `decode_from(&v.to_bytes()) == Ok((v, v.to_bytes().len()))`
pub trait Wire: Sized {
    /// Append the encoded form of `self` to `buf`
    fn encode(&self, buf: &mut BytesMut);

    /// Decode a value from the front of `buf`, advancing it
    fn decode(buf: &mut &[u8]) -> Result<Self>;

    /// Encode into a fresh buffer
    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Number of bytes `encode` would append
    fn encoded_len(&self) -> usize {
        self.to_bytes().len()
    }

    /// Decode from a byte slice, returning the value and the bytes consumed
    fn decode_from(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = bytes;
        let value = Self::decode(&mut cursor)?;
        Ok((value, bytes.len() - cursor.len()))
    }
}

// =============================================================================
// Cursor Helpers
// =============================================================================

/// Split `n` bytes off the front of the cursor
pub fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if buf.len() < n {
        return Err(KraftError::truncated(n, buf.len()));
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

/// Split a fixed-size array off the front of the cursor
pub fn take_array<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N]> {
    let bytes = take(buf, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

// =============================================================================
// Fixed-Width Scalars
// =============================================================================

macro_rules! impl_wire_big_endian {
    ($($ty:ty => $put:ident),* $(,)?) => {
        $(
            impl Wire for $ty {
                fn encode(&self, buf: &mut BytesMut) {
                    buf.$put(*self);
                }

                fn decode(buf: &mut &[u8]) -> Result<Self> {
                    Ok(<$ty>::from_be_bytes(take_array(buf)?))
                }
            }
        )*
    };
}

impl_wire_big_endian!(
    i8 => put_i8,
    i16 => put_i16,
    i32 => put_i32,
    i64 => put_i64,
    u32 => put_u32,
    u64 => put_u64,
);

impl Wire for bool {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(u8::from(*self));
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let [byte] = take_array::<1>(buf)?;
        Ok(byte != 0)
    }
}

// =============================================================================
// Varints
// =============================================================================

/// Write an unsigned base-128 varint
pub fn put_unsigned_varlong(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Read an unsigned base-128 varint of at most `bits` significant bits
fn read_unsigned(buf: &mut &[u8], max_groups: usize, bits: u32) -> Result<u64> {
    let mut value: u64 = 0;
    for group in 0..max_groups {
        let [byte] = take_array::<1>(buf)?;
        let payload = u64::from(byte & 0x7f);
        let shift = 7 * group as u32;

        // The final group may only carry the bits that are left
        if group + 1 == max_groups && payload >> (bits - shift) != 0 {
            return Err(KraftError::MalformedVarint { max_groups });
        }

        value |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(KraftError::MalformedVarint { max_groups })
}

pub fn put_unsigned_varint(buf: &mut BytesMut, value: u32) {
    put_unsigned_varlong(buf, u64::from(value));
}

pub fn get_unsigned_varint(buf: &mut &[u8]) -> Result<u32> {
    read_unsigned(buf, MAX_VARINT_GROUPS, 32).map(|v| v as u32)
}

pub fn get_unsigned_varlong(buf: &mut &[u8]) -> Result<u64> {
    read_unsigned(buf, MAX_VARLONG_GROUPS, 64)
}

/// Zigzag-map a signed 32-bit value: 0, -1, 1, -2, ... => 0, 1, 2, 3, ...
pub fn zigzag_encode_i32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode_i32`]: even `u` => `u/2`, odd `u` => `-(u/2) - 1`
pub fn zigzag_decode_i32(value: u32) -> i32 {
    let half = (value >> 1) as i32;
    if value & 1 == 0 {
        half
    } else {
        -half - 1
    }
}

pub fn zigzag_encode_i64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode_i64(value: u64) -> i64 {
    let half = (value >> 1) as i64;
    if value & 1 == 0 {
        half
    } else {
        -half - 1
    }
}

pub fn put_varint(buf: &mut BytesMut, value: i32) {
    put_unsigned_varint(buf, zigzag_encode_i32(value));
}

pub fn get_varint(buf: &mut &[u8]) -> Result<i32> {
    get_unsigned_varint(buf).map(zigzag_decode_i32)
}

pub fn put_varlong(buf: &mut BytesMut, value: i64) {
    put_unsigned_varlong(buf, zigzag_encode_i64(value));
}

pub fn get_varlong(buf: &mut &[u8]) -> Result<i64> {
    get_unsigned_varlong(buf).map(zigzag_decode_i64)
}

/// Unsigned 32-bit varint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnsignedVarint(pub u32);

/// Unsigned 64-bit varint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnsignedVarlong(pub u64);

/// Signed 32-bit zigzag varint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Varint(pub i32);

/// Signed 64-bit zigzag varint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Varlong(pub i64);

impl Wire for UnsignedVarint {
    fn encode(&self, buf: &mut BytesMut) {
        put_unsigned_varint(buf, self.0);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_unsigned_varint(buf).map(Self)
    }
}

impl Wire for UnsignedVarlong {
    fn encode(&self, buf: &mut BytesMut) {
        put_unsigned_varlong(buf, self.0);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_unsigned_varlong(buf).map(Self)
    }
}

impl Wire for Varint {
    fn encode(&self, buf: &mut BytesMut) {
        put_varint(buf, self.0);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_varint(buf).map(Self)
    }
}

impl Wire for Varlong {
    fn encode(&self, buf: &mut BytesMut) {
        put_varlong(buf, self.0);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        get_varlong(buf).map(Self)
    }
}

// =============================================================================
// UUID
// =============================================================================

impl Wire for Uuid {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self.as_bytes());
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Uuid::from_bytes(take_array(buf)?))
    }
}

/// Parse canonical `8-4-4-4-12` UUID text
pub fn parse_uuid(text: &str) -> Result<Uuid> {
    Uuid::try_parse(text).map_err(|e| KraftError::InvalidUuid(format!("{}: {}", text, e)))
}
