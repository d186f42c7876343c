//! Tests for the metadata index and shared snapshot
//!
//! These tests verify:
//! - Builder semantics for Topic / Partition / FeatureLevel records
//! - Query behavior for unknown names and ids
//! - Snapshot swap visibility and isolation

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;

use kraftlog::metadata::{MetadataIndex, MetadataIndexBuilder, SharedMetadata};

use common::{feature_value, partition_value, topic_value, uuid};

// =============================================================================
// Helper Functions
// =============================================================================

fn index_with(topics: &[(&str, u128, &[i32])]) -> MetadataIndex {
    let mut builder = MetadataIndexBuilder::new();
    for (name, id, partitions) in topics {
        builder.apply(&topic_value(name, uuid(*id)));
        for p in partitions.iter() {
            builder.apply(&partition_value(uuid(*id), *p));
        }
    }
    builder.build()
}

// =============================================================================
// Builder Tests
// =============================================================================

#[test]
fn test_empty_index() {
    let index = MetadataIndex::empty();
    assert!(index.is_empty());
    assert_eq!(index.topic_uuid("orders"), None);
    assert!(index.partitions(&uuid(1)).is_empty());
    assert!(!index.contains_topic_id(&uuid(1)));
}

#[test]
fn test_topic_record_last_writer_wins() {
    let mut builder = MetadataIndexBuilder::new();
    builder.apply(&topic_value("orders", uuid(1)));
    builder.apply(&topic_value("orders", uuid(2)));
    let index = builder.build();

    assert_eq!(index.topic_uuid("orders"), Some(uuid(2)));
    assert_eq!(index.topic_count(), 1);
}

#[test]
fn test_rebound_name_forgets_old_topic_id() {
    let mut builder = MetadataIndexBuilder::new();
    builder.apply(&topic_value("orders", uuid(1)));
    builder.apply(&partition_value(uuid(1), 0));
    builder.apply(&topic_value("orders", uuid(2)));
    let index = builder.build();

    assert!(!index.contains_topic_id(&uuid(1)));
    assert_eq!(index.topic_name(&uuid(1)), None);
    assert!(index.contains_topic_id(&uuid(2)));
    assert_eq!(index.topic_name(&uuid(2)), Some("orders"));
}

#[test]
fn test_renamed_topic_id_forgets_old_name() {
    let mut builder = MetadataIndexBuilder::new();
    builder.apply(&topic_value("orders", uuid(1)));
    builder.apply(&topic_value("sales", uuid(1)));
    let index = builder.build();

    assert_eq!(index.topic_uuid("orders"), None);
    assert_eq!(index.topic_uuid("sales"), Some(uuid(1)));
    assert_eq!(index.topic_count(), 1);
}

#[test]
fn test_duplicate_partitions_accumulate() {
    let mut builder = MetadataIndexBuilder::new();
    builder.apply(&topic_value("orders", uuid(1)));
    builder.apply(&partition_value(uuid(1), 0));
    builder.apply(&partition_value(uuid(1), 0));
    let index = builder.build();

    let ids: Vec<i32> = index.partitions(&uuid(1)).iter().map(|p| p.partition_id).collect();
    assert_eq!(ids, vec![0, 0]);
}

#[test]
fn test_partition_before_topic_record() {
    let mut builder = MetadataIndexBuilder::new();
    builder.apply(&partition_value(uuid(1), 0));
    builder.apply(&topic_value("orders", uuid(1)));
    let index = builder.build();

    assert_eq!(index.partitions(&uuid(1)).len(), 1);
    assert!(index.contains_topic_id(&uuid(1)));
}

#[test]
fn test_partitions_without_topic_are_not_a_known_topic() {
    let mut builder = MetadataIndexBuilder::new();
    builder.apply(&partition_value(uuid(7), 0));
    let index = builder.build();

    assert_eq!(index.partitions(&uuid(7)).len(), 1);
    assert!(!index.contains_topic_id(&uuid(7)));
}

#[test]
fn test_feature_levels() {
    let mut builder = MetadataIndexBuilder::new();
    builder.apply(&feature_value("metadata.version", 19));
    builder.apply(&feature_value("metadata.version", 20));
    let index = builder.build();

    assert_eq!(index.feature_level("metadata.version"), Some(20));
    assert_eq!(index.feature_level("kraft.version"), None);
    assert_eq!(index.topic_count(), 0);
}

#[test]
fn test_topics_sorted_by_name() {
    let index = index_with(&[("zeta", 1, &[]), ("alpha", 2, &[0])]);
    let names: Vec<&str> = index.topics().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_swap_visibility() {
    let shared = SharedMetadata::new(index_with(&[("orders", 1, &[0])]));
    let before = shared.snapshot();

    let previous = shared.replace(index_with(&[("payments", 2, &[0, 1])]));
    let after = shared.snapshot();

    // Old readers keep their consistent view
    assert!(Arc::ptr_eq(&before, &previous));
    assert_eq!(before.index().topic_uuid("orders"), Some(uuid(1)));
    assert_eq!(before.index().topic_uuid("payments"), None);

    assert_eq!(after.index().topic_uuid("orders"), None);
    assert_eq!(after.index().partitions(&uuid(2)).len(), 2);
}

#[test]
fn test_snapshot_concurrent_readers() {
    let shared = Arc::new(SharedMetadata::new(index_with(&[("orders", 1, &[0, 1])])));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let snapshot = shared.snapshot();
                    let index = snapshot.index();
                    // Either snapshot is internally consistent
                    match index.topic_uuid("orders") {
                        Some(id) => assert_eq!(index.partitions(&id).len(), 2),
                        None => assert_eq!(index.partitions(&uuid(2)).len(), 3),
                    }
                }
            })
        })
        .collect();

    shared.replace(index_with(&[("payments", 2, &[0, 1, 2])]));

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(shared.snapshot().index().topic_uuid("payments"), Some(uuid(2)));
}
