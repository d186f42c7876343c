//! Request and response headers
//!
//! ```text
//! Request header v1: api_key(2) api_version(2) correlation_id(4) client_id(nullable string)
//! Request header v2: v1 + tagged fields
//! Response header v0: correlation_id(4)
//! Response header v1: correlation_id(4) + tagged fields
//! ```

use bytes::BytesMut;

use crate::error::Result;
use super::codec::Wire;
use super::tagged::TaggedFields;
use super::types::{get_nullable_string, put_nullable_string};

/// API keys understood by this broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum ApiKey {
    Fetch = 1,
    ApiVersions = 18,
    DescribeTopicPartitions = 75,
}

impl ApiKey {
    pub fn from_i16(key: i16) -> Option<Self> {
        match key {
            1 => Some(ApiKey::Fetch),
            18 => Some(ApiKey::ApiVersions),
            75 => Some(ApiKey::DescribeTopicPartitions),
            _ => None,
        }
    }

    /// First version using the flexible (compact + tagged fields) encoding
    pub fn first_flexible_version(self) -> i16 {
        match self {
            ApiKey::Fetch => 12,
            ApiKey::ApiVersions => 3,
            ApiKey::DescribeTopicPartitions => 0,
        }
    }

    pub fn is_flexible(self, version: i16) -> bool {
        version >= self.first_flexible_version()
    }

    /// ApiVersions always answers with header v0 so any client can read
    /// the error code; everything else here uses header v1.
    pub fn response_header_version(self) -> ResponseHeaderVersion {
        match self {
            ApiKey::ApiVersions => ResponseHeaderVersion::V0,
            ApiKey::Fetch | ApiKey::DescribeTopicPartitions => ResponseHeaderVersion::V1,
        }
    }
}

/// Whether a request header carries a tagged-field block
fn request_has_tagged_fields(api_key: i16, api_version: i16) -> bool {
    ApiKey::from_i16(api_key).map_or(true, |key| key.is_flexible(api_version))
}

// =============================================================================
// Request Header
// =============================================================================

/// Request header (v2 for flexible versions, v1 otherwise)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub api_key: i16,
    pub api_version: i16,
    pub correlation_id: i32,
    pub client_id: Option<String>,
    pub tagged_fields: TaggedFields,
}

impl RequestHeader {
    pub fn new(api_key: ApiKey, api_version: i16, correlation_id: i32) -> Self {
        Self {
            api_key: api_key as i16,
            api_version,
            correlation_id,
            client_id: None,
            tagged_fields: TaggedFields::new(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

impl Wire for RequestHeader {
    fn encode(&self, buf: &mut BytesMut) {
        self.api_key.encode(buf);
        self.api_version.encode(buf);
        self.correlation_id.encode(buf);
        put_nullable_string(buf, self.client_id.as_deref());
        if request_has_tagged_fields(self.api_key, self.api_version) {
            self.tagged_fields.encode(buf);
        }
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let api_key = i16::decode(buf)?;
        let api_version = i16::decode(buf)?;
        let correlation_id = i32::decode(buf)?;
        let client_id = get_nullable_string(buf)?;
        let tagged_fields = if request_has_tagged_fields(api_key, api_version) {
            TaggedFields::decode(buf)?
        } else {
            TaggedFields::new()
        };
        Ok(Self {
            api_key,
            api_version,
            correlation_id,
            client_id,
            tagged_fields,
        })
    }
}

// =============================================================================
// Response Header
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHeaderVersion {
    V0,
    V1,
}

/// Response header variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseHeader {
    V0 {
        correlation_id: i32,
    },
    V1 {
        correlation_id: i32,
        tagged_fields: TaggedFields,
    },
}

impl ResponseHeader {
    pub fn new(version: ResponseHeaderVersion, correlation_id: i32) -> Self {
        match version {
            ResponseHeaderVersion::V0 => ResponseHeader::V0 { correlation_id },
            ResponseHeaderVersion::V1 => ResponseHeader::V1 {
                correlation_id,
                tagged_fields: TaggedFields::new(),
            },
        }
    }

    pub fn correlation_id(&self) -> i32 {
        match self {
            ResponseHeader::V0 { correlation_id } | ResponseHeader::V1 { correlation_id, .. } => {
                *correlation_id
            }
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            ResponseHeader::V0 { correlation_id } => correlation_id.encode(buf),
            ResponseHeader::V1 {
                correlation_id,
                tagged_fields,
            } => {
                correlation_id.encode(buf);
                tagged_fields.encode(buf);
            }
        }
    }

    pub fn decode(buf: &mut &[u8], version: ResponseHeaderVersion) -> Result<Self> {
        let correlation_id = i32::decode(buf)?;
        Ok(match version {
            ResponseHeaderVersion::V0 => ResponseHeader::V0 { correlation_id },
            ResponseHeaderVersion::V1 => ResponseHeader::V1 {
                correlation_id,
                tagged_fields: TaggedFields::decode(buf)?,
            },
        })
    }
}
