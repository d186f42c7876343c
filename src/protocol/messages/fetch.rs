//! Fetch (key 1), flexible topic-id layout (versions 13-16)
//!
//! ```text
//! Request:  replica_id(4, v<=14) max_wait_ms min_bytes max_bytes
//!           isolation_level(1) session_id session_epoch
//!           [topic_id [partition current_leader_epoch fetch_offset(8)
//!                      last_fetched_epoch log_start_offset(8)
//!                      partition_max_bytes tagged] tagged]
//!           [topic_id [partition] tagged]  rack_id  tagged
//!
//! Response: throttle_time_ms error_code session_id
//!           [topic_id [partition_index error_code high_watermark(8)
//!                      last_stable_offset(8) log_start_offset(8)
//!                      [producer_id first_offset tagged]?
//!                      preferred_read_replica records? tagged] tagged]
//!           tagged
//! ```

use bytes::{Bytes, BytesMut};

use crate::error::Result;
use crate::protocol::codec::{Uuid, Wire};
use crate::protocol::tagged::TaggedFields;
use crate::protocol::types::{
    get_compact_array, get_compact_nullable_array, get_compact_nullable_bytes,
    get_compact_string, put_compact_array, put_compact_nullable_array,
    put_compact_nullable_bytes, put_compact_string,
};
use super::Versioned;

/// Last version whose request body starts with `replica_id`
const LAST_REPLICA_ID_VERSION: i16 = 14;

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPartition {
    pub partition: i32,
    pub current_leader_epoch: i32,
    pub fetch_offset: i64,
    pub last_fetched_epoch: i32,
    pub log_start_offset: i64,
    pub partition_max_bytes: i32,
    pub tagged_fields: TaggedFields,
}

impl FetchPartition {
    pub fn new(partition: i32, fetch_offset: i64) -> Self {
        Self {
            partition,
            current_leader_epoch: -1,
            fetch_offset,
            last_fetched_epoch: -1,
            log_start_offset: -1,
            partition_max_bytes: 1024 * 1024,
            tagged_fields: TaggedFields::new(),
        }
    }
}

impl Wire for FetchPartition {
    fn encode(&self, buf: &mut BytesMut) {
        self.partition.encode(buf);
        self.current_leader_epoch.encode(buf);
        self.fetch_offset.encode(buf);
        self.last_fetched_epoch.encode(buf);
        self.log_start_offset.encode(buf);
        self.partition_max_bytes.encode(buf);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            partition: i32::decode(buf)?,
            current_leader_epoch: i32::decode(buf)?,
            fetch_offset: i64::decode(buf)?,
            last_fetched_epoch: i32::decode(buf)?,
            log_start_offset: i64::decode(buf)?,
            partition_max_bytes: i32::decode(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTopic {
    pub topic_id: Uuid,
    pub partitions: Vec<FetchPartition>,
    pub tagged_fields: TaggedFields,
}

impl FetchTopic {
    pub fn new(topic_id: Uuid, partitions: Vec<FetchPartition>) -> Self {
        Self {
            topic_id,
            partitions,
            tagged_fields: TaggedFields::new(),
        }
    }
}

impl Wire for FetchTopic {
    fn encode(&self, buf: &mut BytesMut) {
        self.topic_id.encode(buf);
        put_compact_array(buf, &self.partitions);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            topic_id: Uuid::decode(buf)?,
            partitions: get_compact_array(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgottenTopic {
    pub topic_id: Uuid,
    pub partitions: Vec<i32>,
    pub tagged_fields: TaggedFields,
}

impl Wire for ForgottenTopic {
    fn encode(&self, buf: &mut BytesMut) {
        self.topic_id.encode(buf);
        put_compact_array(buf, &self.partitions);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            topic_id: Uuid::decode(buf)?,
            partitions: get_compact_array(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub replica_id: i32,
    pub max_wait_ms: i32,
    pub min_bytes: i32,
    pub max_bytes: i32,
    pub isolation_level: i8,
    pub session_id: i32,
    pub session_epoch: i32,
    pub topics: Vec<FetchTopic>,
    pub forgotten_topics_data: Vec<ForgottenTopic>,
    pub rack_id: String,
    pub tagged_fields: TaggedFields,
}

impl FetchRequest {
    pub fn new(topics: Vec<FetchTopic>) -> Self {
        Self {
            replica_id: -1,
            max_wait_ms: 500,
            min_bytes: 1,
            max_bytes: 50 * 1024 * 1024,
            isolation_level: 0,
            session_id: 0,
            session_epoch: -1,
            topics,
            forgotten_topics_data: Vec::new(),
            rack_id: String::new(),
            tagged_fields: TaggedFields::new(),
        }
    }
}

impl Versioned for FetchRequest {
    fn encode_versioned(&self, buf: &mut BytesMut, version: i16) {
        if version <= LAST_REPLICA_ID_VERSION {
            self.replica_id.encode(buf);
        }
        self.max_wait_ms.encode(buf);
        self.min_bytes.encode(buf);
        self.max_bytes.encode(buf);
        self.isolation_level.encode(buf);
        self.session_id.encode(buf);
        self.session_epoch.encode(buf);
        put_compact_array(buf, &self.topics);
        put_compact_array(buf, &self.forgotten_topics_data);
        put_compact_string(buf, &self.rack_id);
        self.tagged_fields.encode(buf);
    }

    fn decode_versioned(buf: &mut &[u8], version: i16) -> Result<Self> {
        let replica_id = if version <= LAST_REPLICA_ID_VERSION {
            i32::decode(buf)?
        } else {
            -1
        };
        Ok(Self {
            replica_id,
            max_wait_ms: i32::decode(buf)?,
            min_bytes: i32::decode(buf)?,
            max_bytes: i32::decode(buf)?,
            isolation_level: i8::decode(buf)?,
            session_id: i32::decode(buf)?,
            session_epoch: i32::decode(buf)?,
            topics: get_compact_array(buf)?,
            forgotten_topics_data: get_compact_array(buf)?,
            rack_id: get_compact_string(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortedTransaction {
    pub producer_id: i64,
    pub first_offset: i64,
    pub tagged_fields: TaggedFields,
}

impl Wire for AbortedTransaction {
    fn encode(&self, buf: &mut BytesMut) {
        self.producer_id.encode(buf);
        self.first_offset.encode(buf);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            producer_id: i64::decode(buf)?,
            first_offset: i64::decode(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionData {
    pub partition_index: i32,
    pub error_code: i16,
    pub high_watermark: i64,
    pub last_stable_offset: i64,
    pub log_start_offset: i64,
    pub aborted_transactions: Option<Vec<AbortedTransaction>>,
    pub preferred_read_replica: i32,
    pub records: Option<Bytes>,
    pub tagged_fields: TaggedFields,
}

impl PartitionData {
    /// Partition entry carrying only an error code and empty records
    pub fn error(partition_index: i32, error_code: i16) -> Self {
        Self::with_records(partition_index, error_code, Bytes::new())
    }

    pub fn with_records(partition_index: i32, error_code: i16, records: Bytes) -> Self {
        Self {
            partition_index,
            error_code,
            high_watermark: 0,
            last_stable_offset: 0,
            log_start_offset: 0,
            aborted_transactions: Some(Vec::new()),
            preferred_read_replica: -1,
            records: Some(records),
            tagged_fields: TaggedFields::new(),
        }
    }
}

impl Wire for PartitionData {
    fn encode(&self, buf: &mut BytesMut) {
        self.partition_index.encode(buf);
        self.error_code.encode(buf);
        self.high_watermark.encode(buf);
        self.last_stable_offset.encode(buf);
        self.log_start_offset.encode(buf);
        put_compact_nullable_array(buf, self.aborted_transactions.as_deref());
        self.preferred_read_replica.encode(buf);
        put_compact_nullable_bytes(buf, self.records.as_deref());
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            partition_index: i32::decode(buf)?,
            error_code: i16::decode(buf)?,
            high_watermark: i64::decode(buf)?,
            last_stable_offset: i64::decode(buf)?,
            log_start_offset: i64::decode(buf)?,
            aborted_transactions: get_compact_nullable_array(buf)?,
            preferred_read_replica: i32::decode(buf)?,
            records: get_compact_nullable_bytes(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchableTopicResponse {
    pub topic_id: Uuid,
    pub partitions: Vec<PartitionData>,
    pub tagged_fields: TaggedFields,
}

impl Wire for FetchableTopicResponse {
    fn encode(&self, buf: &mut BytesMut) {
        self.topic_id.encode(buf);
        put_compact_array(buf, &self.partitions);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            topic_id: Uuid::decode(buf)?,
            partitions: get_compact_array(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchResponse {
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub session_id: i32,
    pub responses: Vec<FetchableTopicResponse>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for FetchResponse {
    fn encode_versioned(&self, buf: &mut BytesMut, _version: i16) {
        self.throttle_time_ms.encode(buf);
        self.error_code.encode(buf);
        self.session_id.encode(buf);
        put_compact_array(buf, &self.responses);
        self.tagged_fields.encode(buf);
    }

    fn decode_versioned(buf: &mut &[u8], _version: i16) -> Result<Self> {
        Ok(Self {
            throttle_time_ms: i32::decode(buf)?,
            error_code: i16::decode(buf)?,
            session_id: i32::decode(buf)?,
            responses: get_compact_array(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}
