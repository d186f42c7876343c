//! Request and response schemas
//!
//! Each message knows how to encode and decode itself for a given API
//! version. Nested structures that do not change across versions implement
//! plain [`Wire`](super::Wire).

mod api_versions;
mod describe_topic_partitions;
mod fetch;

use bytes::{Bytes, BytesMut};

use crate::error::Result;

pub use api_versions::{ApiVersion, ApiVersionsRequest, ApiVersionsResponse};
pub use describe_topic_partitions::{
    Cursor, DescribeTopicPartitionsRequest, DescribeTopicPartitionsResponse,
    PartitionDescription, TopicDescription, TopicRequest,
};
pub use fetch::{
    AbortedTransaction, FetchPartition, FetchRequest, FetchResponse, FetchTopic,
    FetchableTopicResponse, ForgottenTopic, PartitionData,
};

/// A message whose layout depends on the API version
pub trait Versioned: Sized {
    fn encode_versioned(&self, buf: &mut BytesMut, version: i16);

    fn decode_versioned(buf: &mut &[u8], version: i16) -> Result<Self>;

    fn to_bytes_versioned(&self, version: i16) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_versioned(&mut buf, version);
        buf.freeze()
    }
}
