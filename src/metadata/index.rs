//! Metadata index implementation
//!
//! HashMap-based projection of topic and partition identity, built once by a
//! `MetadataIndexBuilder` and read-only afterwards.

use std::collections::HashMap;

use crate::log::{PartitionRecord, RecordBody, RecordValue};
use crate::protocol::Uuid;

/// Partition as seen by request handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    pub partition_id: i32,
    pub error_code: i16,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

impl From<&PartitionRecord> for PartitionDescriptor {
    fn from(record: &PartitionRecord) -> Self {
        Self {
            partition_id: record.partition_id,
            error_code: 0,
            leader_id: record.leader,
            leader_epoch: record.leader_epoch,
            replicas: record.replicas.clone(),
            isr: record.isr.clone(),
        }
    }
}

/// Immutable topic/partition index
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    topic_name_to_uuid: HashMap<String, Uuid>,
    topic_uuid_to_name: HashMap<Uuid, String>,
    uuid_to_partitions: HashMap<Uuid, Vec<PartitionDescriptor>>,
    feature_levels: HashMap<String, i16>,
}

impl MetadataIndex {
    /// An index with no topics
    pub fn empty() -> Self {
        Self::default()
    }

    /// UUID currently bound to `name`
    pub fn topic_uuid(&self, name: &str) -> Option<Uuid> {
        self.topic_name_to_uuid.get(name).copied()
    }

    /// Name announced for `topic_id`
    pub fn topic_name(&self, topic_id: &Uuid) -> Option<&str> {
        self.topic_uuid_to_name.get(topic_id).map(String::as_str)
    }

    /// Whether a topic record announced `topic_id`
    pub fn contains_topic_id(&self, topic_id: &Uuid) -> bool {
        self.topic_uuid_to_name.contains_key(topic_id)
    }

    /// Partition descriptors for `topic_id` in replay order (empty if none)
    pub fn partitions(&self, topic_id: &Uuid) -> &[PartitionDescriptor] {
        self.uuid_to_partitions
            .get(topic_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Finalized level of a feature, if recorded
    pub fn feature_level(&self, name: &str) -> Option<i16> {
        self.feature_levels.get(name).copied()
    }

    /// `(name, uuid)` pairs sorted by name
    pub fn topics(&self) -> Vec<(&str, Uuid)> {
        let mut topics: Vec<_> = self
            .topic_name_to_uuid
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
            .collect();
        topics.sort_by(|a, b| a.0.cmp(b.0));
        topics
    }

    pub fn topic_count(&self) -> usize {
        self.topic_name_to_uuid.len()
    }

    pub fn partition_count(&self) -> usize {
        self.uuid_to_partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.topic_name_to_uuid.is_empty() && self.uuid_to_partitions.is_empty()
    }
}

/// Accumulates record values in log order
#[derive(Debug, Default)]
pub struct MetadataIndexBuilder {
    index: MetadataIndex,
}

impl MetadataIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one record value
    ///
    /// - Topic: binds name <-> uuid, later records for a name (or uuid) win
    /// - Partition: appends a descriptor (duplicates are kept)
    /// - FeatureLevel: records the level, later records win
    pub fn apply(&mut self, value: &RecordValue) {
        match &value.body {
            RecordBody::Topic(topic) => {
                tracing::debug!("Adding topic {} ({})", topic.name, topic.topic_id);
                self.bind_topic(&topic.name, topic.topic_id);
            }
            RecordBody::Partition(partition) => {
                tracing::debug!(
                    "Adding partition {} to topic {}",
                    partition.partition_id,
                    partition.topic_id
                );
                self.index
                    .uuid_to_partitions
                    .entry(partition.topic_id)
                    .or_default()
                    .push(PartitionDescriptor::from(partition));
            }
            RecordBody::FeatureLevel(feature) => {
                self.index
                    .feature_levels
                    .insert(feature.name.clone(), feature.level);
            }
        }
    }

    /// Bind `name` <-> `topic_id`, dropping whichever old bindings it replaces
    ///
    /// A superseded uuid no longer counts as a known topic id.
    fn bind_topic(&mut self, name: &str, topic_id: Uuid) {
        let index = &mut self.index;

        if let Some(old_id) = index.topic_name_to_uuid.insert(name.to_string(), topic_id) {
            if old_id != topic_id {
                tracing::debug!("Topic {} rebound from {}", name, old_id);
                index.topic_uuid_to_name.remove(&old_id);
            }
        }

        if let Some(old_name) = index.topic_uuid_to_name.insert(topic_id, name.to_string()) {
            if old_name != name && index.topic_name_to_uuid.get(&old_name) == Some(&topic_id) {
                index.topic_name_to_uuid.remove(&old_name);
            }
        }
    }

    /// Freeze the accumulated state
    pub fn build(self) -> MetadataIndex {
        self.index
    }
}
