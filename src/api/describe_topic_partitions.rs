//! DescribeTopicPartitions (key 75) handler

use crate::metadata::{MetadataIndex, PartitionDescriptor};
use crate::protocol::messages::{
    DescribeTopicPartitionsRequest, DescribeTopicPartitionsResponse, PartitionDescription,
    TopicDescription,
};
use crate::protocol::{ApiKey, RequestHeader, TaggedFields, Uuid};

use super::{is_version_supported, ApiResponse, ErrorCode};

/// Operations bitfield reported for every known topic
/// (READ, WRITE, CREATE, DELETE, ALTER, DESCRIBE, DESCRIBE_CONFIGS, ALTER_CONFIGS)
pub const TOPIC_AUTHORIZED_OPERATIONS: i32 = 0x0DF8;

/// Only v0 exists, so every answer uses the v0 layout
const RESPONSE_VERSION: i16 = 0;

/// Answer a DescribeTopicPartitions request from `index`
///
/// Topics are answered in request order. The next cursor is always null:
/// every partition of every requested topic fits in one response.
pub fn handle_describe_topic_partitions(
    header: &RequestHeader,
    request: &DescribeTopicPartitionsRequest,
    index: &MetadataIndex,
) -> ApiResponse {
    let supported = is_version_supported(ApiKey::DescribeTopicPartitions, header.api_version);
    if !supported {
        tracing::debug!(
            "DescribeTopicPartitions v{} unsupported",
            header.api_version
        );
    }

    let topics = request
        .topics
        .iter()
        .map(|topic| {
            if supported {
                describe_topic(&topic.name, index)
            } else {
                error_topic(&topic.name, ErrorCode::UnsupportedVersion)
            }
        })
        .collect();

    let response = DescribeTopicPartitionsResponse {
        throttle_time_ms: 0,
        topics,
        next_cursor: None,
        tagged_fields: TaggedFields::new(),
    };
    ApiResponse::DescribeTopicPartitions(response, RESPONSE_VERSION)
}

fn describe_topic(name: &str, index: &MetadataIndex) -> TopicDescription {
    let Some(topic_id) = index.topic_uuid(name) else {
        tracing::debug!("Unknown topic {}", name);
        return error_topic(name, ErrorCode::UnknownTopicOrPartition);
    };

    TopicDescription {
        error_code: ErrorCode::None.code(),
        name: Some(name.to_string()),
        topic_id,
        is_internal: false,
        partitions: index
            .partitions(&topic_id)
            .iter()
            .map(describe_partition)
            .collect(),
        topic_authorized_operations: TOPIC_AUTHORIZED_OPERATIONS,
        tagged_fields: TaggedFields::new(),
    }
}

fn describe_partition(partition: &PartitionDescriptor) -> PartitionDescription {
    PartitionDescription {
        error_code: partition.error_code,
        partition_index: partition.partition_id,
        leader_id: partition.leader_id,
        leader_epoch: partition.leader_epoch,
        replica_nodes: partition.replicas.clone(),
        isr_nodes: partition.isr.clone(),
        eligible_leader_replicas: Some(Vec::new()),
        last_known_elr: Some(Vec::new()),
        ..PartitionDescription::default()
    }
}

/// Entry for a topic that cannot be described: nil id, no partitions
fn error_topic(name: &str, error: ErrorCode) -> TopicDescription {
    TopicDescription {
        error_code: error.code(),
        name: Some(name.to_string()),
        topic_id: Uuid::nil(),
        is_internal: false,
        partitions: Vec::new(),
        topic_authorized_operations: 0,
        tagged_fields: TaggedFields::new(),
    }
}
