//! # kraftlog
//!
//! A read-only broker speaking a subset of the Kafka wire protocol:
//! - ApiVersions, DescribeTopicPartitions and Fetch
//! - Topic and partition metadata rebuilt by replaying the KRaft
//!   cluster metadata log
//! - Partition record bytes served verbatim from the log directory
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │              (one thread per connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ length-prefixed frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Broker                                 │
//! │          (header decode, dispatch by API key)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │  Metadata   │          │ PartitionLogs │
//!   │ (snapshot)  │          │   (bytes)     │
//!   └──────▲──────┘          └───────▲───────┘
//!          │ replay                  │ read
//!   ┌──────┴──────┐          ┌───────┴───────┐
//!   │ Metadata log│          │  {topic}-{p}/ │
//!   │  (batches)  │          │   segments    │
//!   └─────────────┘          └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod log;
pub mod metadata;
pub mod storage;
pub mod api;
pub mod broker;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KraftError, Result};
pub use config::Config;
pub use broker::Broker;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kraftlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
