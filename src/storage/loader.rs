//! Log directory loader
//!
//! Reads the on-disk pieces of a KRaft log directory into memory. Files are
//! only ever read; nothing here writes, truncates, or locks a segment.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};

use crate::error::{KraftError, Result};
use crate::metadata::MetadataIndex;
use crate::protocol::Uuid;

/// Directory holding the cluster metadata log
pub const METADATA_LOG_DIR: &str = "__cluster_metadata-0";

/// Width of the zero-padded base offset in a segment file name
const SEGMENT_NAME_DIGITS: usize = 20;

/// Segment file extension
const SEGMENT_EXTENSION: &str = "log";

/// Record bytes per `(topic id, partition)`, built once at startup
#[derive(Debug, Default, Clone)]
pub struct PartitionLogs {
    logs: HashMap<(Uuid, i32), Bytes>,
}

impl PartitionLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record bytes of one partition, if a log was found for it
    pub fn get(&self, topic_id: &Uuid, partition: i32) -> Option<Bytes> {
        self.logs.get(&(*topic_id, partition)).cloned()
    }

    /// Register bytes for a partition, replacing any previous entry
    pub fn insert(&mut self, topic_id: Uuid, partition: i32, bytes: impl Into<Bytes>) {
        self.logs.insert((topic_id, partition), bytes.into());
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Read-only view over a KRaft log directory
///
/// ## Layout:
/// ```text
/// {root}/
///   ├── __cluster_metadata-0/
///   │     └── 00000000000000000000.log
///   └── {topic}-{partition}/
///         ├── 00000000000000000000.log
///         └── 00000000000000001234.log
/// ```
#[derive(Debug, Clone)]
pub struct LogDirectory {
    root: PathBuf,
}

impl LogDirectory {
    /// Open an existing log directory
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(KraftError::Config(format!(
                "log directory {} does not exist",
                path.display()
            )));
        }

        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Root path of the directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the first metadata log segment
    pub fn metadata_log_path(&self) -> PathBuf {
        self.root
            .join(METADATA_LOG_DIR)
            .join(segment_file_name(0))
    }

    /// Contents of the metadata log
    ///
    /// A missing segment reads as an empty log, which replays to an empty
    /// index.
    pub fn metadata_log_bytes(&self) -> Result<Bytes> {
        let path = self.metadata_log_path();
        match fs::read(&path) {
            Ok(data) => {
                tracing::debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Metadata log {} not found", path.display());
                Ok(Bytes::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load the record bytes of every partition the index knows about
    ///
    /// Segments of `{topic}-{partition}/` are concatenated in file name
    /// order. Partitions without a directory are skipped.
    pub fn load_partition_logs(&self, index: &MetadataIndex) -> Result<PartitionLogs> {
        let mut logs = PartitionLogs::new();

        for (name, topic_id) in index.topics() {
            for partition in index.partitions(&topic_id) {
                let dir = self.partition_dir(name, partition.partition_id);
                if !dir.is_dir() {
                    continue;
                }

                let data = Self::read_segments(&dir)?;
                tracing::debug!(
                    "Loaded {} bytes for {}-{}",
                    data.len(),
                    name,
                    partition.partition_id
                );
                logs.insert(topic_id, partition.partition_id, data);
            }
        }

        Ok(logs)
    }

    /// Directory of one partition
    pub fn partition_dir(&self, topic: &str, partition: i32) -> PathBuf {
        self.root.join(format!("{}-{}", topic, partition))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Concatenate every segment file in `dir`, lowest base offset first
    fn read_segments(dir: &Path) -> Result<Bytes> {
        let mut segments: Vec<PathBuf> = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_segment_file(&path) {
                segments.push(path);
            }
        }

        // Zero padding makes name order equal offset order
        segments.sort();

        let mut data = BytesMut::new();
        for segment in &segments {
            data.extend_from_slice(&fs::read(segment)?);
        }
        Ok(data.freeze())
    }
}

/// "00000000000000000042.log" for base offset 42
fn segment_file_name(base_offset: u64) -> String {
    format!(
        "{:0width$}.{}",
        base_offset,
        SEGMENT_EXTENSION,
        width = SEGMENT_NAME_DIGITS
    )
}

/// Matches `\d{20}\.log`
fn is_segment_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let Some(stem) = name.strip_suffix(".log") else {
        return false;
    };
    stem.len() == SEGMENT_NAME_DIGITS && stem.bytes().all(|b| b.is_ascii_digit())
}
