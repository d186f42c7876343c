//! Shared metadata snapshot
//!
//! Handlers hold an `Arc<MetadataSnapshot>` for the duration of one request.
//! A refresh builds a complete new snapshot off to the side and swaps the
//! pointer; readers holding the old snapshot keep a consistent view.
//!
//! The index and the partition logs it keys into are published together, so
//! a request never sees topics from one generation and bytes from another.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::storage::PartitionLogs;

use super::MetadataIndex;

/// One published generation of broker state
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshot {
    index: MetadataIndex,
    partition_logs: PartitionLogs,
}

impl MetadataSnapshot {
    pub fn new(index: MetadataIndex, partition_logs: PartitionLogs) -> Self {
        Self {
            index,
            partition_logs,
        }
    }

    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Record bytes served by Fetch
    pub fn partition_logs(&self) -> &PartitionLogs {
        &self.partition_logs
    }
}

impl From<MetadataIndex> for MetadataSnapshot {
    fn from(index: MetadataIndex) -> Self {
        Self::new(index, PartitionLogs::new())
    }
}

/// Process-wide slot holding the current snapshot
///
/// ## Concurrency:
/// - `snapshot()`: short read lock, clones the `Arc`
/// - `replace()`: short write lock, swaps the `Arc`
/// - No snapshot is ever mutated after it is published
#[derive(Debug)]
pub struct SharedMetadata {
    current: RwLock<Arc<MetadataSnapshot>>,
}

impl SharedMetadata {
    pub fn new(snapshot: impl Into<MetadataSnapshot>) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot.into())),
        }
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<MetadataSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publish `snapshot`, returning the one it replaced
    pub fn replace(&self, snapshot: impl Into<MetadataSnapshot>) -> Arc<MetadataSnapshot> {
        let next = Arc::new(snapshot.into());
        std::mem::replace(&mut *self.current.write(), next)
    }
}

impl Default for SharedMetadata {
    fn default() -> Self {
        Self::new(MetadataSnapshot::default())
    }
}
