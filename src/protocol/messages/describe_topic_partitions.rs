//! DescribeTopicPartitions (key 75), version 0 only
//!
//! ```text
//! Request:  [name tagged]  response_partition_limit(4)  cursor?  tagged
//! Response: throttle_time_ms(4)  [topic]  next_cursor?  tagged
//!
//! topic:     error_code name? topic_id is_internal [partition]
//!            topic_authorized_operations tagged
//! partition: error_code partition_index leader_id leader_epoch
//!            [replica] [isr] [elr]? [last_known_elr]? [offline] tagged
//! cursor?:   int8 -1 = null, 1 = present, then topic_name partition_index tagged
//! ```

use bytes::BytesMut;

use crate::error::Result;
use crate::protocol::codec::{Uuid, Wire};
use crate::protocol::tagged::TaggedFields;
use crate::protocol::types::{
    get_compact_array, get_compact_nullable_array, get_compact_nullable_string,
    get_compact_string, put_compact_array, put_compact_nullable_array,
    put_compact_nullable_string, put_compact_string,
};
use super::Versioned;

// =============================================================================
// Shared Structures
// =============================================================================

/// Pagination cursor (request `cursor` / response `next_cursor`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub topic_name: String,
    pub partition_index: i32,
    pub tagged_fields: TaggedFields,
}

impl Wire for Cursor {
    fn encode(&self, buf: &mut BytesMut) {
        put_compact_string(buf, &self.topic_name);
        self.partition_index.encode(buf);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            topic_name: get_compact_string(buf)?,
            partition_index: i32::decode(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

fn put_nullable_cursor(buf: &mut BytesMut, cursor: Option<&Cursor>) {
    match cursor {
        None => (-1i8).encode(buf),
        Some(cursor) => {
            1i8.encode(buf);
            cursor.encode(buf);
        }
    }
}

fn get_nullable_cursor(buf: &mut &[u8]) -> Result<Option<Cursor>> {
    match i8::decode(buf)? {
        -1 => Ok(None),
        _ => Cursor::decode(buf).map(Some),
    }
}

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRequest {
    pub name: String,
    pub tagged_fields: TaggedFields,
}

impl TopicRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tagged_fields: TaggedFields::new(),
        }
    }
}

impl Wire for TopicRequest {
    fn encode(&self, buf: &mut BytesMut) {
        put_compact_string(buf, &self.name);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            name: get_compact_string(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeTopicPartitionsRequest {
    pub topics: Vec<TopicRequest>,
    pub response_partition_limit: i32,
    pub cursor: Option<Cursor>,
    pub tagged_fields: TaggedFields,
}

impl DescribeTopicPartitionsRequest {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: names.into_iter().map(TopicRequest::new).collect(),
            response_partition_limit: 2000,
            cursor: None,
            tagged_fields: TaggedFields::new(),
        }
    }
}

impl Versioned for DescribeTopicPartitionsRequest {
    fn encode_versioned(&self, buf: &mut BytesMut, _version: i16) {
        put_compact_array(buf, &self.topics);
        self.response_partition_limit.encode(buf);
        put_nullable_cursor(buf, self.cursor.as_ref());
        self.tagged_fields.encode(buf);
    }

    fn decode_versioned(buf: &mut &[u8], _version: i16) -> Result<Self> {
        Ok(Self {
            topics: get_compact_array(buf)?,
            response_partition_limit: i32::decode(buf)?,
            cursor: get_nullable_cursor(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionDescription {
    pub error_code: i16,
    pub partition_index: i32,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub replica_nodes: Vec<i32>,
    pub isr_nodes: Vec<i32>,
    pub eligible_leader_replicas: Option<Vec<i32>>,
    pub last_known_elr: Option<Vec<i32>>,
    pub offline_replicas: Vec<i32>,
    pub tagged_fields: TaggedFields,
}

impl Wire for PartitionDescription {
    fn encode(&self, buf: &mut BytesMut) {
        self.error_code.encode(buf);
        self.partition_index.encode(buf);
        self.leader_id.encode(buf);
        self.leader_epoch.encode(buf);
        put_compact_array(buf, &self.replica_nodes);
        put_compact_array(buf, &self.isr_nodes);
        put_compact_nullable_array(buf, self.eligible_leader_replicas.as_deref());
        put_compact_nullable_array(buf, self.last_known_elr.as_deref());
        put_compact_array(buf, &self.offline_replicas);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            error_code: i16::decode(buf)?,
            partition_index: i32::decode(buf)?,
            leader_id: i32::decode(buf)?,
            leader_epoch: i32::decode(buf)?,
            replica_nodes: get_compact_array(buf)?,
            isr_nodes: get_compact_array(buf)?,
            eligible_leader_replicas: get_compact_nullable_array(buf)?,
            last_known_elr: get_compact_nullable_array(buf)?,
            offline_replicas: get_compact_array(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescription {
    pub error_code: i16,
    pub name: Option<String>,
    pub topic_id: Uuid,
    pub is_internal: bool,
    pub partitions: Vec<PartitionDescription>,
    pub topic_authorized_operations: i32,
    pub tagged_fields: TaggedFields,
}

impl Wire for TopicDescription {
    fn encode(&self, buf: &mut BytesMut) {
        self.error_code.encode(buf);
        put_compact_nullable_string(buf, self.name.as_deref());
        self.topic_id.encode(buf);
        self.is_internal.encode(buf);
        put_compact_array(buf, &self.partitions);
        self.topic_authorized_operations.encode(buf);
        self.tagged_fields.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        Ok(Self {
            error_code: i16::decode(buf)?,
            name: get_compact_nullable_string(buf)?,
            topic_id: Uuid::decode(buf)?,
            is_internal: bool::decode(buf)?,
            partitions: get_compact_array(buf)?,
            topic_authorized_operations: i32::decode(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescribeTopicPartitionsResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<TopicDescription>,
    pub next_cursor: Option<Cursor>,
    pub tagged_fields: TaggedFields,
}

impl Versioned for DescribeTopicPartitionsResponse {
    fn encode_versioned(&self, buf: &mut BytesMut, _version: i16) {
        self.throttle_time_ms.encode(buf);
        put_compact_array(buf, &self.topics);
        put_nullable_cursor(buf, self.next_cursor.as_ref());
        self.tagged_fields.encode(buf);
    }

    fn decode_versioned(buf: &mut &[u8], _version: i16) -> Result<Self> {
        Ok(Self {
            throttle_time_ms: i32::decode(buf)?,
            topics: get_compact_array(buf)?,
            next_cursor: get_nullable_cursor(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}
