//! Metadata log replay
//!
//! Rebuilds the metadata index from the cluster metadata log.

use crate::error::Result;
use crate::metadata::{MetadataIndex, MetadataIndexBuilder};
use super::BatchReader;

/// Counters gathered during a replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of record batches decoded
    pub batches: u64,

    /// Number of records applied
    pub records: u64,

    /// Byte length of the replayed log
    pub bytes: usize,
}

/// Replays a metadata log into a fresh index
pub struct MetadataReplay;

impl MetadataReplay {
    /// Replay every batch in `log` from offset 0
    ///
    /// Any decode failure aborts the whole replay; no partially built index
    /// is ever returned.
    pub fn replay(log: &[u8]) -> Result<(MetadataIndex, ReplayStats)> {
        let mut builder = MetadataIndexBuilder::new();
        let mut stats = ReplayStats {
            bytes: log.len(),
            ..ReplayStats::default()
        };

        for batch in BatchReader::new(log) {
            let batch = batch?;
            stats.batches += 1;
            for record in &batch.records {
                builder.apply(&record.value);
                stats.records += 1;
            }
        }

        let index = builder.build();
        tracing::info!(
            "Metadata replay: {} batches, {} records, {} topics, {} partitions",
            stats.batches,
            stats.records,
            index.topic_count(),
            index.partition_count()
        );
        Ok((index, stats))
    }
}

/// Replay a metadata log and return the resulting index
pub fn replay_metadata_log(log: &[u8]) -> Result<MetadataIndex> {
    MetadataReplay::replay(log).map(|(index, _)| index)
}
