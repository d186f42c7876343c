//! Fetch (key 1) handler

use crate::metadata::MetadataIndex;
use crate::protocol::messages::{
    FetchRequest, FetchResponse, FetchTopic, FetchableTopicResponse, PartitionData,
};
use crate::protocol::{ApiKey, RequestHeader, TaggedFields};
use crate::storage::PartitionLogs;

use super::{is_version_supported, ApiResponse, ErrorCode};

/// Answer a Fetch request
///
/// ## Per topic:
/// - unsupported version: every requested partition (and the response
///   itself) gets `UNSUPPORTED_VERSION`
/// - unknown topic id: every requested partition gets `UNKNOWN_TOPIC_ID`
/// - known topic: the partition's log bytes verbatim, empty if none exist
///
/// The session id is echoed back; no fetch session state is kept.
pub fn handle_fetch(
    header: &RequestHeader,
    request: &FetchRequest,
    index: &MetadataIndex,
    logs: &PartitionLogs,
) -> ApiResponse {
    let version = header.api_version;
    let supported = is_version_supported(ApiKey::Fetch, version);
    if !supported {
        tracing::debug!("Fetch v{} unsupported", version);
    }

    let responses = request
        .topics
        .iter()
        .map(|topic| {
            if !supported {
                error_topic(topic, ErrorCode::UnsupportedVersion)
            } else if !index.contains_topic_id(&topic.topic_id) {
                tracing::debug!("Unknown topic id {}", topic.topic_id);
                error_topic(topic, ErrorCode::UnknownTopicId)
            } else {
                fetch_topic(topic, logs)
            }
        })
        .collect();

    let response = FetchResponse {
        throttle_time_ms: 0,
        error_code: if supported {
            ErrorCode::None.code()
        } else {
            ErrorCode::UnsupportedVersion.code()
        },
        session_id: request.session_id,
        responses,
        tagged_fields: TaggedFields::new(),
    };
    ApiResponse::Fetch(response, version)
}

fn fetch_topic(topic: &FetchTopic, logs: &PartitionLogs) -> FetchableTopicResponse {
    let partitions = topic
        .partitions
        .iter()
        .map(|p| {
            let records = logs.get(&topic.topic_id, p.partition).unwrap_or_default();
            tracing::trace!(
                "Fetch {}:{} -> {} bytes",
                topic.topic_id,
                p.partition,
                records.len()
            );
            PartitionData::with_records(p.partition, ErrorCode::None.code(), records)
        })
        .collect();

    FetchableTopicResponse {
        topic_id: topic.topic_id,
        partitions,
        tagged_fields: TaggedFields::new(),
    }
}

fn error_topic(topic: &FetchTopic, error: ErrorCode) -> FetchableTopicResponse {
    FetchableTopicResponse {
        topic_id: topic.topic_id,
        partitions: topic
            .partitions
            .iter()
            .map(|p| PartitionData::error(p.partition, error.code()))
            .collect(),
        tagged_fields: TaggedFields::new(),
    }
}
