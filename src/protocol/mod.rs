//! Protocol Module
//!
//! Kafka wire protocol codec for the subset of APIs this broker serves.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬───────────────────┬─────────────────────────────┐
//! │ Len (4)  │  Request header   │       Request body          │
//! └──────────┴───────────────────┴─────────────────────────────┘
//! ┌──────────┬───────────────────┬─────────────────────────────┐
//! │ Len (4)  │  Response header  │       Response body         │
//! └──────────┴───────────────────┴─────────────────────────────┘
//! ```
//!
//! ### APIs
//! - 1:  Fetch                    (versions 13-16)
//! - 18: ApiVersions              (versions 0-4)
//! - 75: DescribeTopicPartitions  (version 0)
//!
//! All multi-byte integers are big-endian unless they are varints.

pub mod codec;
pub mod types;
pub mod tagged;
pub mod header;
pub mod frame;
pub mod messages;

pub use codec::{parse_uuid, Uuid, Wire};
pub use tagged::{TaggedField, TaggedFields};
pub use header::{ApiKey, RequestHeader, ResponseHeader, ResponseHeaderVersion};
pub use frame::{decode_frame, encode_frame, read_frame, write_frame};
pub use messages::Versioned;
