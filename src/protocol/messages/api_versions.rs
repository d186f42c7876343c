//! ApiVersions (key 18)
//!
//! ```text
//! Request v0-2:  (empty)
//! Request v3-4:  client_software_name  client_software_version  tagged
//!
//! Response v0:   error_code  [api_key min max]
//! Response v1-2: error_code  [api_key min max]  throttle_time_ms
//! Response v3-4: error_code  [api_key min max tagged]  throttle_time_ms  tagged
//! ```

use bytes::BytesMut;

use crate::error::Result;
use crate::protocol::codec::Wire;
use crate::protocol::tagged::TaggedFields;
use crate::protocol::types::{
    get_array_with, get_compact_array_with, get_compact_string, put_array_with,
    put_compact_array_with, put_compact_string,
};
use super::Versioned;

const FIRST_FLEXIBLE_VERSION: i16 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiVersionsRequest {
    pub client_software_name: String,
    pub client_software_version: String,
    pub tagged_fields: TaggedFields,
}

impl Versioned for ApiVersionsRequest {
    fn encode_versioned(&self, buf: &mut BytesMut, version: i16) {
        if version >= FIRST_FLEXIBLE_VERSION {
            put_compact_string(buf, &self.client_software_name);
            put_compact_string(buf, &self.client_software_version);
            self.tagged_fields.encode(buf);
        }
    }

    fn decode_versioned(buf: &mut &[u8], version: i16) -> Result<Self> {
        if version < FIRST_FLEXIBLE_VERSION {
            return Ok(Self::default());
        }
        Ok(Self {
            client_software_name: get_compact_string(buf)?,
            client_software_version: get_compact_string(buf)?,
            tagged_fields: TaggedFields::decode(buf)?,
        })
    }
}

/// One `{api_key, min_version, max_version}` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
    pub tagged_fields: TaggedFields,
}

impl ApiVersion {
    pub fn new(api_key: i16, min_version: i16, max_version: i16) -> Self {
        Self {
            api_key,
            min_version,
            max_version,
            tagged_fields: TaggedFields::new(),
        }
    }

    fn encode_entry(&self, buf: &mut BytesMut, flexible: bool) {
        self.api_key.encode(buf);
        self.min_version.encode(buf);
        self.max_version.encode(buf);
        if flexible {
            self.tagged_fields.encode(buf);
        }
    }

    fn decode_entry(buf: &mut &[u8], flexible: bool) -> Result<Self> {
        Ok(Self {
            api_key: i16::decode(buf)?,
            min_version: i16::decode(buf)?,
            max_version: i16::decode(buf)?,
            tagged_fields: if flexible {
                TaggedFields::decode(buf)?
            } else {
                TaggedFields::new()
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiVersionsResponse {
    pub error_code: i16,
    pub api_keys: Vec<ApiVersion>,
    pub throttle_time_ms: i32,
    pub tagged_fields: TaggedFields,
}

impl ApiVersionsResponse {
    /// Entry for `api_key`, if advertised
    pub fn find(&self, api_key: i16) -> Option<&ApiVersion> {
        self.api_keys.iter().find(|v| v.api_key == api_key)
    }
}

impl Versioned for ApiVersionsResponse {
    fn encode_versioned(&self, buf: &mut BytesMut, version: i16) {
        let flexible = version >= FIRST_FLEXIBLE_VERSION;
        self.error_code.encode(buf);
        if flexible {
            put_compact_array_with(buf, Some(self.api_keys.as_slice()), |buf, v| {
                v.encode_entry(buf, true)
            });
        } else {
            put_array_with(buf, Some(self.api_keys.as_slice()), |buf, v| {
                v.encode_entry(buf, false)
            });
        }
        if version >= 1 {
            self.throttle_time_ms.encode(buf);
        }
        if flexible {
            self.tagged_fields.encode(buf);
        }
    }

    fn decode_versioned(buf: &mut &[u8], version: i16) -> Result<Self> {
        let flexible = version >= FIRST_FLEXIBLE_VERSION;
        let error_code = i16::decode(buf)?;
        let api_keys = if flexible {
            get_compact_array_with(buf, |buf| ApiVersion::decode_entry(buf, true))?
        } else {
            get_array_with(buf, |buf| ApiVersion::decode_entry(buf, false))?
        };
        let throttle_time_ms = if version >= 1 { i32::decode(buf)? } else { 0 };
        let tagged_fields = if flexible {
            TaggedFields::decode(buf)?
        } else {
            TaggedFields::new()
        };
        Ok(Self {
            error_code,
            api_keys: api_keys.unwrap_or_default(),
            throttle_time_ms,
            tagged_fields,
        })
    }
}
