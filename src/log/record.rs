//! Log records
//!
//! ```text
//! Record:
//! ┌──────────┬───────┬──────────┬──────────┬─────────┬──────────┬─────────┬─────────┐
//! │ len(svar)│ attr  │ ts_delta │ off_delta│ key     │ val_len  │ value   │ headers │
//! │          │ (1)   │ (svarl)  │ (svar)   │ (svar+) │ (svar)   │         │ (tagged)│
//! └──────────┴───────┴──────────┴──────────┴─────────┴──────────┴─────────┴─────────┘
//!
//! Value:
//! ┌───────────────┬──────────┬─────────────┬──────────────────┬─────────┐
//! │ frame_ver (1) │ type (1) │ version (1) │ type-specific    │ tagged  │
//! └───────────────┴──────────┴─────────────┴──────────────────┴─────────┘
//! ```
//!
//! `len` and `val_len` bound what follows them: a record whose declared
//! length runs past the buffer is reported as truncated before any field is
//! parsed.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KraftError, Result};
use crate::protocol::codec::{get_varint, get_varlong, put_varint, put_varlong, take, Uuid, Wire};
use crate::protocol::tagged::TaggedFields;
use crate::protocol::types::{
    get_compact_array, get_compact_string, put_compact_array, put_compact_string,
};

/// Value type discriminant of a topic record
pub const TOPIC_RECORD_TYPE: i8 = 2;

/// Value type discriminant of a partition record
pub const PARTITION_RECORD_TYPE: i8 = 3;

/// Value type discriminant of a feature-level record
pub const FEATURE_LEVEL_RECORD_TYPE: i8 = 12;

// =============================================================================
// Record Value Bodies
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRecord {
    pub name: String,
    pub topic_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRecord {
    pub partition_id: i32,
    pub topic_id: Uuid,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
    pub removing_replicas: Vec<i32>,
    pub adding_replicas: Vec<i32>,
    pub leader: i32,
    pub leader_epoch: i32,
    pub partition_epoch: i32,
    pub directories: Vec<Uuid>,
}

impl PartitionRecord {
    /// Partition led by `leader` with a single in-sync replica
    pub fn new(topic_id: Uuid, partition_id: i32, leader: i32) -> Self {
        Self {
            partition_id,
            topic_id,
            replicas: vec![leader],
            isr: vec![leader],
            removing_replicas: Vec::new(),
            adding_replicas: Vec::new(),
            leader,
            leader_epoch: 0,
            partition_epoch: 0,
            directories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLevelRecord {
    pub name: String,
    pub level: i16,
}

/// Type-specific body of a metadata record value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    Topic(TopicRecord),
    Partition(PartitionRecord),
    FeatureLevel(FeatureLevelRecord),
}

impl RecordBody {
    /// Wire discriminant for this body
    pub fn record_type(&self) -> i8 {
        match self {
            RecordBody::Topic(_) => TOPIC_RECORD_TYPE,
            RecordBody::Partition(_) => PARTITION_RECORD_TYPE,
            RecordBody::FeatureLevel(_) => FEATURE_LEVEL_RECORD_TYPE,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            RecordBody::Topic(topic) => {
                put_compact_string(buf, &topic.name);
                topic.topic_id.encode(buf);
            }
            RecordBody::Partition(p) => {
                p.partition_id.encode(buf);
                p.topic_id.encode(buf);
                put_compact_array(buf, &p.replicas);
                put_compact_array(buf, &p.isr);
                put_compact_array(buf, &p.removing_replicas);
                put_compact_array(buf, &p.adding_replicas);
                p.leader.encode(buf);
                p.leader_epoch.encode(buf);
                p.partition_epoch.encode(buf);
                put_compact_array(buf, &p.directories);
            }
            RecordBody::FeatureLevel(feature) => {
                put_compact_string(buf, &feature.name);
                feature.level.encode(buf);
            }
        }
    }

    fn decode(buf: &mut &[u8], record_type: i8) -> Result<Self> {
        match record_type {
            TOPIC_RECORD_TYPE => Ok(RecordBody::Topic(TopicRecord {
                name: get_compact_string(buf)?,
                topic_id: Uuid::decode(buf)?,
            })),
            PARTITION_RECORD_TYPE => Ok(RecordBody::Partition(PartitionRecord {
                partition_id: i32::decode(buf)?,
                topic_id: Uuid::decode(buf)?,
                replicas: get_compact_array(buf)?,
                isr: get_compact_array(buf)?,
                removing_replicas: get_compact_array(buf)?,
                adding_replicas: get_compact_array(buf)?,
                leader: i32::decode(buf)?,
                leader_epoch: i32::decode(buf)?,
                partition_epoch: i32::decode(buf)?,
                directories: get_compact_array(buf)?,
            })),
            FEATURE_LEVEL_RECORD_TYPE => Ok(RecordBody::FeatureLevel(FeatureLevelRecord {
                name: get_compact_string(buf)?,
                level: i16::decode(buf)?,
            })),
            other => Err(KraftError::UnknownRecordType(other)),
        }
    }
}

// =============================================================================
// Record Value
// =============================================================================

/// Framed metadata record value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordValue {
    pub frame_version: i8,
    pub version: i8,
    pub body: RecordBody,
    pub tagged_fields: TaggedFields,
}

impl RecordValue {
    pub fn new(body: RecordBody) -> Self {
        let version = match body {
            RecordBody::Topic(_) | RecordBody::FeatureLevel(_) => 0,
            RecordBody::Partition(_) => 1,
        };
        Self {
            frame_version: 1,
            version,
            body,
            tagged_fields: TaggedFields::new(),
        }
    }

    pub fn record_type(&self) -> i8 {
        self.body.record_type()
    }
}

impl Wire for RecordValue {
    fn encode(&self, buf: &mut BytesMut) {
        self.frame_version.encode(buf);
        self.record_type().encode(buf);
        self.version.encode(buf);
        self.body.encode(buf);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let frame_version = i8::decode(buf)?;
        let record_type = i8::decode(buf)?;
        let version = i8::decode(buf)?;
        let body = RecordBody::decode(buf, record_type)?;
        let tagged_fields = TaggedFields::decode(buf)?;
        Ok(Self {
            frame_version,
            version,
            body,
            tagged_fields,
        })
    }
}

// =============================================================================
// Record
// =============================================================================

/// Signed-varint length prefixed bytes, -1 = null
fn put_varint_bytes(buf: &mut BytesMut, value: Option<&[u8]>) {
    match value {
        None => put_varint(buf, -1),
        Some(bytes) => {
            put_varint(buf, bytes.len() as i32);
            buf.put_slice(bytes);
        }
    }
}

fn get_varint_bytes(buf: &mut &[u8]) -> Result<Option<Bytes>> {
    match get_varint(buf)? {
        -1 => Ok(None),
        n if n < 0 => Err(KraftError::InvalidLength(i64::from(n))),
        n => Ok(Some(Bytes::copy_from_slice(take(buf, n as usize)?))),
    }
}

/// Read a non-negative signed-varint length
fn get_length(buf: &mut &[u8]) -> Result<usize> {
    match get_varint(buf)? {
        n if n < 0 => Err(KraftError::InvalidLength(i64::from(n))),
        n => Ok(n as usize),
    }
}

/// A single record inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub attributes: i8,
    pub timestamp_delta: i64,
    pub offset_delta: i32,
    pub key: Option<Bytes>,
    pub value: RecordValue,
    pub headers: TaggedFields,
}

impl Record {
    pub fn new(offset_delta: i32, value: RecordValue) -> Self {
        Self {
            attributes: 0,
            timestamp_delta: 0,
            offset_delta,
            key: None,
            value,
            headers: TaggedFields::new(),
        }
    }
}

impl Wire for Record {
    fn encode(&self, buf: &mut BytesMut) {
        let value = self.value.to_bytes();

        let mut body = BytesMut::new();
        self.attributes.encode(&mut body);
        put_varlong(&mut body, self.timestamp_delta);
        put_varint(&mut body, self.offset_delta);
        put_varint_bytes(&mut body, self.key.as_deref());
        put_varint_bytes(&mut body, Some(value.as_ref()));
        self.headers.encode(&mut body);

        put_varint(buf, body.len() as i32);
        buf.put_slice(&body);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let length = get_length(buf)?;
        let mut body = take(buf, length)?;

        let attributes = i8::decode(&mut body)?;
        let timestamp_delta = get_varlong(&mut body)?;
        let offset_delta = get_varint(&mut body)?;
        let key = get_varint_bytes(&mut body)?;

        let value_len = get_length(&mut body)?;
        let mut value_bytes = take(&mut body, value_len)?;
        let value = RecordValue::decode(&mut value_bytes)?;

        let headers = TaggedFields::decode(&mut body)?;

        Ok(Self {
            attributes,
            timestamp_delta,
            offset_delta,
            key,
            value,
            headers,
        })
    }
}
