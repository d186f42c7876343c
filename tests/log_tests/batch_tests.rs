//! Tests for record batch and record decoding
//!
//! These tests verify:
//! - Batch header layout and consumed-byte accounting
//! - Record value dispatch for Topic / Partition / FeatureLevel
//! - Truncation detection via record and batch lengths
//! - Unknown record types surface as errors
//! - BatchReader walks consecutive batches and stops on error

#[path = "../common/mod.rs"]
mod common;

use bytes::{BufMut, Bytes, BytesMut};
use kraftlog::log::{
    decode_batch, BatchReader, FeatureLevelRecord, PartitionRecord, Record, RecordBatch,
    RecordBody, RecordValue, TopicRecord, BATCH_HEADER_SIZE, LOG_OVERHEAD,
};
use kraftlog::protocol::codec::{put_varint, put_varlong};
use kraftlog::protocol::{parse_uuid, Wire};
use kraftlog::KraftError;

use common::{batch_bytes, feature_value, partition_value, topic_value, uuid};

// =============================================================================
// Helper Functions
// =============================================================================

/// Encode a record whose value bytes are given verbatim
fn raw_record(offset_delta: i32, value: &[u8]) -> Bytes {
    let mut body = BytesMut::new();
    body.put_i8(0);
    put_varlong(&mut body, 0);
    put_varint(&mut body, offset_delta);
    put_varint(&mut body, -1);
    put_varint(&mut body, value.len() as i32);
    body.put_slice(value);
    body.put_u8(0);

    let mut record = BytesMut::new();
    put_varint(&mut record, body.len() as i32);
    record.put_slice(&body);
    record.freeze()
}

/// Encode a batch around already encoded records
fn raw_batch(base_offset: i64, records: &[Bytes]) -> Bytes {
    let mut body = BytesMut::new();
    body.put_i32(0); // partition leader epoch
    body.put_i8(2); // magic
    body.put_u32(0); // crc
    body.put_i16(0); // attributes
    body.put_i32(records.len() as i32 - 1);
    body.put_i64(0); // base timestamp
    body.put_i64(0); // max timestamp
    body.put_i64(-1); // producer id
    body.put_i16(-1); // producer epoch
    body.put_i32(-1); // base sequence
    body.put_i32(records.len() as i32);
    for record in records {
        body.put_slice(record);
    }

    let mut batch = BytesMut::new();
    batch.put_i64(base_offset);
    batch.put_i32(body.len() as i32);
    batch.put_slice(&body);
    batch.freeze()
}

// =============================================================================
// Batch Layout Tests
// =============================================================================

#[test]
fn test_empty_batch_is_header_only() {
    let bytes = RecordBatch::new(0, vec![]).to_bytes();
    assert_eq!(bytes.len(), BATCH_HEADER_SIZE);

    let batch_length = i32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    assert_eq!(batch_length as usize, BATCH_HEADER_SIZE - LOG_OVERHEAD);
}

#[test]
fn test_decode_batch_consumes_exactly_one_batch() {
    let first = batch_bytes(0, vec![feature_value("metadata.version", 20)]);
    let second = batch_bytes(1, vec![topic_value("orders", uuid(1))]);

    let mut log = BytesMut::new();
    log.extend_from_slice(&first);
    log.extend_from_slice(&second);

    let (batch, consumed) = decode_batch(&log).unwrap();
    assert_eq!(consumed, first.len());
    assert_eq!(batch.base_offset, 0);
    assert_eq!(batch.records.len(), 1);
}

#[test]
fn test_batch_round_trip_all_record_types() {
    let topic_id = parse_uuid("550e8400-e29b-41d4-a716-446655440000").unwrap();
    let mut partition = PartitionRecord::new(topic_id, 3, 2);
    partition.replicas = vec![1, 2, 3];
    partition.isr = vec![2, 3];
    partition.leader_epoch = 7;
    partition.directories = vec![uuid(99)];

    let mut batch = RecordBatch::new(
        100,
        vec![
            Record::new(0, RecordValue::new(RecordBody::FeatureLevel(FeatureLevelRecord {
                name: "metadata.version".to_string(),
                level: 20,
            }))),
            Record::new(1, RecordValue::new(RecordBody::Topic(TopicRecord {
                name: "orders".to_string(),
                topic_id,
            }))),
            Record::new(2, RecordValue::new(RecordBody::Partition(partition))),
        ],
    );
    batch.partition_leader_epoch = 1;
    batch.crc = 0xdead_beef;
    batch.base_timestamp = 1_726_045_943_832;
    batch.max_timestamp = 1_726_045_943_832;

    let bytes = batch.to_bytes();
    let (decoded, consumed) = decode_batch(&bytes).unwrap();

    assert_eq!(decoded, batch);
    assert_eq!(consumed, bytes.len());
    assert_eq!(decoded.last_offset(), 102);
}

#[test]
fn test_null_record_count_is_empty() {
    let mut bytes = RecordBatch::new(0, vec![]).to_bytes().to_vec();
    let len = bytes.len();
    bytes[len - 4..].copy_from_slice(&[0xff, 0xff, 0xff, 0xff]);

    let (batch, _) = decode_batch(&bytes).unwrap();
    assert!(batch.records.is_empty());
}

#[test]
fn test_batch_negative_length() {
    let mut bytes = BytesMut::new();
    bytes.put_i64(0);
    bytes.put_i32(-5);
    let err = decode_batch(&bytes).unwrap_err();
    assert!(matches!(err, KraftError::InvalidLength(-5)));
}

#[test]
fn test_batch_truncated_tail() {
    let bytes = batch_bytes(0, vec![topic_value("orders", uuid(1))]);
    let err = decode_batch(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, KraftError::TruncatedInput { .. }));
}

// =============================================================================
// Record Tests
// =============================================================================

#[test]
fn test_topic_record_value_layout() {
    let id = uuid(0x0102);
    let value = topic_value("saz", id);
    let bytes = value.to_bytes();

    // frame version, type, version, compact name, uuid, tagged fields
    assert_eq!(&bytes[..4], &[0x01, 0x02, 0x00, 0x04]);
    assert_eq!(&bytes[4..7], b"saz");
    assert_eq!(&bytes[7..23], id.as_bytes());
    assert_eq!(&bytes[23..], &[0x00]);
}

#[test]
fn test_record_value_type_dispatch() {
    let values = [
        topic_value("orders", uuid(1)),
        partition_value(uuid(1), 0),
        feature_value("metadata.version", 20),
    ];
    let types: Vec<i8> = values.iter().map(RecordValue::record_type).collect();
    assert_eq!(types, vec![2, 3, 12]);

    for value in values {
        assert_eq!(RecordValue::decode_from(&value.to_bytes()).unwrap().0, value);
    }
}

#[test]
fn test_unknown_record_type() {
    let record = raw_record(0, &[0x01, 0x63, 0x00, 0x00]);
    let err = Record::decode_from(&record).unwrap_err();
    assert!(matches!(err, KraftError::UnknownRecordType(99)));
}

#[test]
fn test_record_length_truncation() {
    let record = Record::new(0, topic_value("orders", uuid(1))).to_bytes();
    let err = Record::decode_from(&record[..record.len() - 1]).unwrap_err();
    assert!(matches!(err, KraftError::TruncatedInput { .. }));
}

#[test]
fn test_value_length_bounds_value() {
    // The value claims 30 bytes but the record body only holds 4
    let mut body = BytesMut::new();
    body.put_i8(0);
    put_varlong(&mut body, 0);
    put_varint(&mut body, 0);
    put_varint(&mut body, -1);
    put_varint(&mut body, 30);
    body.put_slice(&[0x01, 0x02, 0x00, 0x01]);
    let mut record = BytesMut::new();
    put_varint(&mut record, body.len() as i32);
    record.put_slice(&body);

    let err = Record::decode_from(&record).unwrap_err();
    assert!(matches!(
        err,
        KraftError::TruncatedInput {
            needed: 30,
            remaining: 4
        }
    ));
}

#[test]
fn test_record_key_and_deltas() {
    let mut record = Record::new(5, topic_value("orders", uuid(1)));
    record.key = Some(Bytes::from_static(b"k"));
    record.timestamp_delta = -3;

    let bytes = record.to_bytes();
    assert_eq!(Record::decode_from(&bytes).unwrap(), (record, bytes.len()));
}

// =============================================================================
// BatchReader Tests
// =============================================================================

#[test]
fn test_reader_walks_all_batches() {
    let mut log = BytesMut::new();
    for i in 0..3 {
        log.extend_from_slice(&batch_bytes(i, vec![feature_value("metadata.version", 20)]));
    }

    let mut reader = BatchReader::new(&log);
    let mut offsets = Vec::new();
    while let Some(batch) = reader.next_batch().unwrap() {
        offsets.push(batch.base_offset);
    }
    assert_eq!(offsets, vec![0, 1, 2]);
    assert_eq!(reader.position(), log.len());
}

#[test]
fn test_reader_empty_buffer() {
    assert_eq!(BatchReader::new(&[]).count(), 0);
}

#[test]
fn test_reader_stops_after_first_error() {
    let mut log = BytesMut::new();
    log.extend_from_slice(&batch_bytes(0, vec![topic_value("orders", uuid(1))]));
    log.extend_from_slice(&raw_batch(1, &[raw_record(0, &[0x01, 0x63, 0x00, 0x00])]));
    log.extend_from_slice(&batch_bytes(2, vec![topic_value("later", uuid(2))]));

    let results: Vec<_> = BatchReader::new(&log).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(KraftError::UnknownRecordType(99))));
}

#[test]
fn test_raw_batch_matches_encoder() {
    let value = topic_value("orders", uuid(1));
    let encoded = batch_bytes(7, vec![value.clone()]);
    let raw = raw_batch(7, &[raw_record(0, &value.to_bytes())]);
    assert_eq!(encoded, raw);
}
