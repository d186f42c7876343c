//! API Module
//!
//! Request handlers for the APIs this broker serves.
//!
//! ## Responsibilities
//! - Advertise the supported version window of each API
//! - Turn a decoded request into a typed response value
//!
//! Handlers never fail: protocol-level problems (unsupported version, unknown
//! topic) are reported as error codes inside the response. Only malformed
//! bytes surface as `Err`, and those are caught before a handler runs.

mod api_versions;
mod describe_topic_partitions;
mod fetch;

use std::ops::RangeInclusive;

use bytes::BytesMut;

use crate::protocol::messages::{
    ApiVersionsResponse, DescribeTopicPartitionsResponse, FetchResponse,
};
use crate::protocol::{ApiKey, Versioned};

pub use api_versions::handle_api_versions;
pub use describe_topic_partitions::{handle_describe_topic_partitions, TOPIC_AUTHORIZED_OPERATIONS};
pub use fetch::handle_fetch;

// =============================================================================
// Error Codes
// =============================================================================

/// Kafka error codes produced by the handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum ErrorCode {
    None = 0,
    UnknownTopicOrPartition = 3,
    UnsupportedVersion = 35,
    UnknownTopicId = 100,
}

impl ErrorCode {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::None),
            3 => Some(ErrorCode::UnknownTopicOrPartition),
            35 => Some(ErrorCode::UnsupportedVersion),
            100 => Some(ErrorCode::UnknownTopicId),
            _ => None,
        }
    }
}

// =============================================================================
// Supported Versions
// =============================================================================

/// Version window advertised for one API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedApi {
    pub key: ApiKey,
    pub min_version: i16,
    pub max_version: i16,
}

impl SupportedApi {
    pub fn versions(&self) -> RangeInclusive<i16> {
        self.min_version..=self.max_version
    }
}

/// Every API served, in the order ApiVersions advertises them
pub const SUPPORTED_APIS: &[SupportedApi] = &[
    SupportedApi {
        key: ApiKey::ApiVersions,
        min_version: 0,
        max_version: 4,
    },
    SupportedApi {
        key: ApiKey::Fetch,
        min_version: 13,
        max_version: 16,
    },
    SupportedApi {
        key: ApiKey::DescribeTopicPartitions,
        min_version: 0,
        max_version: 0,
    },
];

/// Version window for `key`
pub fn supported_versions(key: ApiKey) -> Option<RangeInclusive<i16>> {
    SUPPORTED_APIS
        .iter()
        .find(|api| api.key == key)
        .map(SupportedApi::versions)
}

pub fn is_version_supported(key: ApiKey, version: i16) -> bool {
    supported_versions(key).is_some_and(|range| range.contains(&version))
}

// =============================================================================
// Responses
// =============================================================================

/// A handler's answer together with the version its body is encoded at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    ApiVersions(ApiVersionsResponse, i16),
    DescribeTopicPartitions(DescribeTopicPartitionsResponse, i16),
    Fetch(FetchResponse, i16),
}

impl ApiResponse {
    pub fn api_key(&self) -> ApiKey {
        match self {
            ApiResponse::ApiVersions(..) => ApiKey::ApiVersions,
            ApiResponse::DescribeTopicPartitions(..) => ApiKey::DescribeTopicPartitions,
            ApiResponse::Fetch(..) => ApiKey::Fetch,
        }
    }

    /// Encode the response body (no header)
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            ApiResponse::ApiVersions(body, version) => body.encode_versioned(buf, *version),
            ApiResponse::DescribeTopicPartitions(body, version) => {
                body.encode_versioned(buf, *version)
            }
            ApiResponse::Fetch(body, version) => body.encode_versioned(buf, *version),
        }
    }
}
