//! Log Module
//!
//! Decoder (and encoder) for the record-batch log segment format used by the
//! cluster metadata log.
//!
//! ## Responsibilities
//! - Parse record batches and their delta-encoded records
//! - Dispatch record values to Topic / Partition / FeatureLevel bodies
//! - Replay the metadata log into a `MetadataIndex`
//!
//! ## Segment Layout
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Batch 1                                 │
//! │ ┌──────────────┬─────────┬────────────┐ │
//! │ │ Header (61)  │Record 1 │ Record ... │ │
//! │ └──────────────┴─────────┴────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Batch 2                                 │
//! │ ...                                     │
//! └─────────────────────────────────────────┘
//! ```

mod record;
mod batch;
mod reader;
mod replay;

pub use record::{
    FeatureLevelRecord, PartitionRecord, Record, RecordBody, RecordValue, TopicRecord,
    FEATURE_LEVEL_RECORD_TYPE, PARTITION_RECORD_TYPE, TOPIC_RECORD_TYPE,
};
pub use batch::{decode_batch, RecordBatch, BATCH_HEADER_SIZE, LOG_OVERHEAD};
pub use reader::BatchReader;
pub use replay::{replay_metadata_log, MetadataReplay, ReplayStats};
