//! ApiVersions (key 18) handler

use crate::protocol::messages::{ApiVersion, ApiVersionsResponse};
use crate::protocol::{ApiKey, RequestHeader};

use super::{is_version_supported, ApiResponse, ErrorCode, SUPPORTED_APIS};

/// Layout used when the requested version is unsupported
///
/// v0 is the one layout every client can parse before it knows which
/// versions the broker speaks.
const FALLBACK_VERSION: i16 = 0;

/// Answer an ApiVersions request
///
/// The request body carries only client software info, so it is not needed
/// here and is never parsed.
pub fn handle_api_versions(header: &RequestHeader) -> ApiResponse {
    let version = header.api_version;

    if !is_version_supported(ApiKey::ApiVersions, version) {
        tracing::debug!("ApiVersions v{} unsupported", version);
        let response = ApiVersionsResponse {
            error_code: ErrorCode::UnsupportedVersion.code(),
            ..ApiVersionsResponse::default()
        };
        return ApiResponse::ApiVersions(response, FALLBACK_VERSION);
    }

    let api_keys = SUPPORTED_APIS
        .iter()
        .map(|api| ApiVersion::new(api.key as i16, api.min_version, api.max_version))
        .collect();

    let response = ApiVersionsResponse {
        error_code: ErrorCode::None.code(),
        api_keys,
        throttle_time_ms: 0,
        ..ApiVersionsResponse::default()
    };
    ApiResponse::ApiVersions(response, version)
}
