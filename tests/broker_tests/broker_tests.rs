//! Tests for request dispatch through the Broker
//!
//! These tests verify:
//! - ApiVersions supported / unsupported answers
//! - DescribeTopicPartitions for known and unknown topics
//! - Fetch for known topics, unknown topic ids and unsupported versions
//! - Unsupported versions answered even when the body is unreadable
//! - Snapshot refresh (index and partition logs together)
//! - Connection-fatal errors

#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use kraftlog::api::{ErrorCode, TOPIC_AUTHORIZED_OPERATIONS};
use kraftlog::log::replay_metadata_log;
use kraftlog::protocol::messages::{
    ApiVersionsRequest, ApiVersionsResponse, DescribeTopicPartitionsRequest,
    DescribeTopicPartitionsResponse, FetchPartition, FetchRequest, FetchResponse, FetchTopic,
};
use kraftlog::protocol::{ApiKey, RequestHeader, Uuid, Wire};
use kraftlog::storage::{PartitionLogs, METADATA_LOG_DIR};
use kraftlog::{Broker, Config, KraftError};
use tempfile::TempDir;

use common::{decode_response, metadata_log, request_body, uuid};

// =============================================================================
// Helper Functions
// =============================================================================

const ORDERS: u128 = 0x71a5;
const EVENTS: u128 = 0x0e7e;

/// Broker with "orders" (partitions 0, 1) and "events" (partition 0);
/// only orders-0 has record bytes
fn setup_broker() -> Broker {
    let log = metadata_log(&[
        ("orders", uuid(ORDERS), &[0, 1]),
        ("events", uuid(EVENTS), &[0]),
    ]);
    let index = replay_metadata_log(&log).unwrap();

    let mut logs = PartitionLogs::new();
    logs.insert(uuid(ORDERS), 0, Bytes::from_static(b"orders-0 records"));

    Broker::from_parts(index, logs)
}

fn write_file(path: &Path, data: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

fn write_segment(root: &Path, dir: &str, data: &[u8]) {
    write_file(&root.join(dir).join("00000000000000000000.log"), data);
}

/// Broker opened from disk with only "orders" (partition 0) known
fn setup_disk_broker() -> (TempDir, Broker) {
    let temp = TempDir::new().unwrap();
    write_segment(
        temp.path(),
        METADATA_LOG_DIR,
        &metadata_log(&[("orders", uuid(ORDERS), &[0])]),
    );
    write_segment(temp.path(), "orders-0", b"orders-0 records");

    let config = Config::builder().log_dir(temp.path()).build();
    let broker = Broker::open(&config).unwrap();
    (temp, broker)
}

fn api_versions(broker: &Broker, version: i16) -> (i32, ApiVersionsResponse) {
    let body = request_body(ApiKey::ApiVersions, version, 11, &ApiVersionsRequest::default());
    let frame = broker.handle_frame(&body).unwrap();
    let response_version = if (0..=4).contains(&version) { version } else { 0 };
    decode_response(&frame, ApiKey::ApiVersions, response_version)
}

fn describe(broker: &Broker, version: i16, names: &[&str]) -> DescribeTopicPartitionsResponse {
    let request = DescribeTopicPartitionsRequest::new(names.iter().copied());
    let body = request_body(ApiKey::DescribeTopicPartitions, version, 12, &request);
    let frame = broker.handle_frame(&body).unwrap();
    decode_response(&frame, ApiKey::DescribeTopicPartitions, 0).1
}

fn fetch(broker: &Broker, version: i16, topic_id: Uuid, partitions: &[i32]) -> FetchResponse {
    let mut request = FetchRequest::new(vec![FetchTopic::new(
        topic_id,
        partitions.iter().map(|p| FetchPartition::new(*p, 1000)).collect(),
    )]);
    request.session_id = 77;
    let body = request_body(ApiKey::Fetch, version, 13, &request);
    let frame = broker.handle_frame(&body).unwrap();
    decode_response(&frame, ApiKey::Fetch, version).1
}

// =============================================================================
// ApiVersions Tests
// =============================================================================

#[test]
fn test_api_versions_unsupported_version() {
    let broker = setup_broker();
    let (correlation_id, response) = api_versions(&broker, 99);

    assert_eq!(correlation_id, 11);
    assert_eq!(response.error_code, ErrorCode::UnsupportedVersion.code());
    assert!(response.api_keys.is_empty());
}

#[test]
fn test_api_versions_supported_version() {
    let broker = setup_broker();
    let (correlation_id, response) = api_versions(&broker, 4);

    assert_eq!(correlation_id, 11);
    assert_eq!(response.error_code, 0);
    assert_eq!(response.throttle_time_ms, 0);

    let bounds = |key: i16| response.find(key).map(|v| (v.min_version, v.max_version));
    assert_eq!(bounds(18), Some((0, 4)));
    assert_eq!(bounds(75), Some((0, 0)));
    assert_eq!(bounds(1), Some((13, 16)));
}

#[test]
fn test_api_versions_every_supported_version() {
    let broker = setup_broker();
    for version in 0..=4 {
        let (_, response) = api_versions(&broker, version);
        assert_eq!(response.error_code, 0, "version {}", version);
        assert_eq!(response.api_keys.len(), 3, "version {}", version);
    }
}

// =============================================================================
// DescribeTopicPartitions Tests
// =============================================================================

#[test]
fn test_describe_unknown_topic() {
    let broker = setup_broker();
    let response = describe(&broker, 0, &["foo"]);

    assert_eq!(response.topics.len(), 1);
    let topic = &response.topics[0];
    assert_eq!(topic.error_code, ErrorCode::UnknownTopicOrPartition.code());
    assert_eq!(topic.name.as_deref(), Some("foo"));
    assert_eq!(topic.topic_id, Uuid::nil());
    assert!(topic.partitions.is_empty());
    assert!(response.next_cursor.is_none());
}

#[test]
fn test_describe_known_topic() {
    let broker = setup_broker();
    let response = describe(&broker, 0, &["orders"]);

    let topic = &response.topics[0];
    assert_eq!(topic.error_code, 0);
    assert_eq!(topic.topic_id, uuid(ORDERS));
    assert!(!topic.is_internal);
    assert_eq!(topic.topic_authorized_operations, TOPIC_AUTHORIZED_OPERATIONS);

    let partitions: Vec<(i32, i16, i32)> = topic
        .partitions
        .iter()
        .map(|p| (p.partition_index, p.error_code, p.leader_id))
        .collect();
    assert_eq!(partitions, vec![(0, 0, 1), (1, 0, 1)]);
}

#[test]
fn test_describe_mixed_topics_in_request_order() {
    let broker = setup_broker();
    let response = describe(&broker, 0, &["events", "foo", "orders"]);

    let summary: Vec<(Option<&str>, i16, usize)> = response
        .topics
        .iter()
        .map(|t| (t.name.as_deref(), t.error_code, t.partitions.len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Some("events"), 0, 1),
            (Some("foo"), 3, 0),
            (Some("orders"), 0, 2),
        ]
    );
}

#[test]
fn test_describe_unsupported_version() {
    let broker = setup_broker();
    let response = describe(&broker, 3, &["orders"]);

    assert_eq!(response.topics[0].error_code, ErrorCode::UnsupportedVersion.code());
    assert!(response.topics[0].partitions.is_empty());
}

/// Non-flexible Fetch body naming topic "foo", partition 0
///
/// v4 layout when `version < 7`; v11 layout (session fields, partition
/// epochs, rack id) otherwise.
fn legacy_fetch_body(version: i16, correlation_id: i32, session_id: i32) -> Bytes {
    let mut buf = BytesMut::new();
    RequestHeader::new(ApiKey::Fetch, version, correlation_id)
        .with_client_id("legacy-client")
        .encode(&mut buf);

    buf.put_i32(-1); // replica_id
    buf.put_i32(500); // max_wait_ms
    buf.put_i32(1); // min_bytes
    buf.put_i32(1 << 20); // max_bytes
    buf.put_i8(0); // isolation_level
    if version >= 7 {
        buf.put_i32(session_id);
        buf.put_i32(-1); // session_epoch
    }

    buf.put_i32(1);
    buf.put_i16(3);
    buf.put_slice(b"foo");
    buf.put_i32(1);
    buf.put_i32(0); // partition
    if version >= 9 {
        buf.put_i32(-1); // current_leader_epoch
    }
    buf.put_i64(0); // fetch_offset
    if version >= 5 {
        buf.put_i64(-1); // log_start_offset
    }
    buf.put_i32(1 << 20); // partition_max_bytes

    if version >= 7 {
        buf.put_i32(0); // forgotten_topics_data
    }
    if version >= 11 {
        buf.put_i16(0); // rack_id
    }
    buf.freeze()
}

// =============================================================================
// Fetch Tests
// =============================================================================

#[test]
fn test_fetch_unknown_topic_id() {
    let broker = setup_broker();
    let response = fetch(&broker, 16, uuid(0xdead), &[0, 1, 5]);

    assert_eq!(response.error_code, 0);
    assert_eq!(response.session_id, 77);
    let topic = &response.responses[0];
    assert_eq!(topic.topic_id, uuid(0xdead));
    assert_eq!(topic.partitions.len(), 3);
    for partition in &topic.partitions {
        assert_eq!(partition.error_code, ErrorCode::UnknownTopicId.code());
        assert_eq!(partition.records, Some(Bytes::new()));
    }
}

#[test]
fn test_fetch_known_topic_returns_records_verbatim() {
    let broker = setup_broker();
    let response = fetch(&broker, 16, uuid(ORDERS), &[0, 1]);

    let partitions = &response.responses[0].partitions;
    assert_eq!(partitions[0].partition_index, 0);
    assert_eq!(partitions[0].error_code, 0);
    assert_eq!(partitions[0].records.as_deref(), Some(&b"orders-0 records"[..]));

    // Known partition without a log: empty, non-null
    assert_eq!(partitions[1].error_code, 0);
    assert_eq!(partitions[1].records, Some(Bytes::new()));
}

#[test]
fn test_fetch_v13_with_replica_id() {
    let broker = setup_broker();
    let response = fetch(&broker, 13, uuid(ORDERS), &[0]);
    assert_eq!(response.responses[0].partitions[0].error_code, 0);
}

#[test]
fn test_fetch_unsupported_version() {
    let broker = setup_broker();
    let response = fetch(&broker, 12, uuid(ORDERS), &[0, 1]);

    assert_eq!(response.error_code, ErrorCode::UnsupportedVersion.code());
    for partition in &response.responses[0].partitions {
        assert_eq!(partition.error_code, ErrorCode::UnsupportedVersion.code());
    }
}

#[test]
fn test_fetch_v4_body_gets_error_response() {
    let broker = setup_broker();
    let body = legacy_fetch_body(4, 21, 0);

    let frame = broker.handle_frame(&body).unwrap();
    let (correlation_id, response): (i32, FetchResponse) =
        decode_response(&frame, ApiKey::Fetch, 4);

    assert_eq!(correlation_id, 21);
    assert_eq!(response.error_code, ErrorCode::UnsupportedVersion.code());
    assert_eq!(response.session_id, 0);
    assert!(response.responses.is_empty());
}

#[test]
fn test_fetch_v11_body_echoes_session_id() {
    let broker = setup_broker();
    let body = legacy_fetch_body(11, 22, 4242);

    let frame = broker.handle_frame(&body).unwrap();
    let (correlation_id, response): (i32, FetchResponse) =
        decode_response(&frame, ApiKey::Fetch, 11);

    assert_eq!(correlation_id, 22);
    assert_eq!(response.error_code, ErrorCode::UnsupportedVersion.code());
    assert_eq!(response.session_id, 4242);
}

#[test]
fn test_describe_unreadable_body_gets_error_response() {
    let broker = setup_broker();
    let mut buf = BytesMut::new();
    RequestHeader::new(ApiKey::DescribeTopicPartitions, 2, 23).encode(&mut buf);
    buf.put_u8(0x05); // four topics follow, none present

    let frame = broker.handle_frame(&buf).unwrap();
    let (correlation_id, response): (i32, DescribeTopicPartitionsResponse) =
        decode_response(&frame, ApiKey::DescribeTopicPartitions, 0);

    assert_eq!(correlation_id, 23);
    assert!(response.topics.is_empty());
    assert!(response.next_cursor.is_none());
}

#[test]
fn test_fetch_empty_request() {
    let broker = setup_broker();
    let request = FetchRequest::new(vec![]);
    let body = request_body(ApiKey::Fetch, 16, 3, &request);
    let frame = broker.handle_frame(&body).unwrap();
    let (correlation_id, response): (i32, FetchResponse) =
        decode_response(&frame, ApiKey::Fetch, 16);

    assert_eq!(correlation_id, 3);
    assert!(response.responses.is_empty());
}

// =============================================================================
// Refresh & Error Tests
// =============================================================================

#[test]
fn test_refresh_swaps_snapshot() {
    let broker = setup_broker();
    let before = broker.metadata();

    let log = metadata_log(&[("payments", uuid(0x9a), &[0])]);
    broker.refresh(&log).unwrap();

    assert_eq!(describe(&broker, 0, &["orders"]).topics[0].error_code, 3);
    assert_eq!(describe(&broker, 0, &["payments"]).topics[0].error_code, 0);
    assert_eq!(before.index().topic_uuid("orders"), Some(uuid(ORDERS)));
}

#[test]
fn test_refresh_loads_logs_of_new_topics() {
    let (temp, broker) = setup_disk_broker();
    let before = broker.metadata();

    write_segment(temp.path(), "payments-0", b"payments-0 records");
    let log = metadata_log(&[
        ("orders", uuid(ORDERS), &[0]),
        ("payments", uuid(0x9a), &[0]),
    ]);
    broker.refresh(&log).unwrap();

    let response = fetch(&broker, 16, uuid(0x9a), &[0]);
    let partition = &response.responses[0].partitions[0];
    assert_eq!(partition.error_code, 0);
    assert_eq!(partition.records.as_deref(), Some(&b"payments-0 records"[..]));

    // The replaced snapshot is untouched
    assert!(before.partition_logs().get(&uuid(0x9a), 0).is_none());
    assert!(before.index().topic_uuid("payments").is_none());
}

#[test]
fn test_reload_reads_log_directory() {
    let (temp, broker) = setup_disk_broker();

    write_segment(temp.path(), "events-0", b"events-0 records");
    write_segment(
        temp.path(),
        METADATA_LOG_DIR,
        &metadata_log(&[("events", uuid(EVENTS), &[0])]),
    );
    broker.reload().unwrap();

    assert_eq!(describe(&broker, 0, &["orders"]).topics[0].error_code, 3);
    let response = fetch(&broker, 16, uuid(EVENTS), &[0]);
    assert_eq!(
        response.responses[0].partitions[0].records.as_deref(),
        Some(&b"events-0 records"[..])
    );
}

#[test]
fn test_reload_requires_log_directory() {
    let broker = setup_broker();
    assert!(matches!(broker.reload(), Err(KraftError::Config(_))));
}

#[test]
fn test_refresh_in_memory_keeps_partition_logs() {
    let broker = setup_broker();
    broker.refresh(&metadata_log(&[("orders", uuid(ORDERS), &[0])])).unwrap();

    let response = fetch(&broker, 16, uuid(ORDERS), &[0]);
    assert_eq!(
        response.responses[0].partitions[0].records.as_deref(),
        Some(&b"orders-0 records"[..])
    );
}

#[test]
fn test_failed_refresh_keeps_snapshot() {
    let broker = setup_broker();
    let log = metadata_log(&[("payments", uuid(0x9a), &[0])]);

    assert!(broker.refresh(&log[..log.len() - 1]).is_err());
    assert_eq!(describe(&broker, 0, &["orders"]).topics[0].error_code, 0);
}

#[test]
fn test_unknown_api_key() {
    let broker = setup_broker();
    let mut header = RequestHeader::new(ApiKey::ApiVersions, 0, 1);
    header.api_key = 19;

    let err = broker.handle_frame(&header.to_bytes()).unwrap_err();
    assert!(matches!(err, KraftError::UnknownApiKey(19)));
}

#[test]
fn test_truncated_request_body() {
    let broker = setup_broker();
    let request = DescribeTopicPartitionsRequest::new(["orders"]);
    let body = request_body(ApiKey::DescribeTopicPartitions, 0, 1, &request);

    let err = broker.handle_frame(&body[..body.len() - 2]).unwrap_err();
    assert!(matches!(err, KraftError::TruncatedInput { .. }));
}

#[test]
fn test_truncated_header() {
    let broker = setup_broker();
    let err = broker.handle_frame(&[0x00, 0x12, 0x00]).unwrap_err();
    assert!(matches!(err, KraftError::TruncatedInput { .. }));
}
