//! Metadata Module
//!
//! In-memory projection of the cluster metadata log.
//!
//! ## Responsibilities
//! - Map topic name -> topic UUID (last writer wins)
//! - Map topic UUID -> partition descriptors (replay order)
//! - Publish the index (with its partition logs) as an immutable,
//!   atomically swappable snapshot
//!
//! ## Lifecycle
//! Built once by a full replay from offset 0, then frozen. Refreshing means
//! replaying again and swapping the whole snapshot.

mod index;
mod shared;

pub use index::{MetadataIndex, MetadataIndexBuilder, PartitionDescriptor};
pub use shared::{MetadataSnapshot, SharedMetadata};
