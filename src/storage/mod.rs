//! Storage Module
//!
//! Read-only access to a KRaft log directory.
//!
//! ## Responsibilities
//! - Read the cluster metadata log for replay
//! - Discover and read per-partition log segments for Fetch
//!
//! Record bytes are served verbatim; segments are never decoded here.

mod loader;

pub use loader::{LogDirectory, PartitionLogs, METADATA_LOG_DIR};
