//! Broker Module
//!
//! Routes decoded requests to the API handlers.
//!
//! ## Responsibilities
//! - Decode the request header and pick a handler by API key
//! - Decode the request body at the right version
//! - Encode response header + body into one length-prefixed frame
//! - Own the published metadata snapshot and the partition logs
//!
//! ## Request Flow
//! ```text
//! frame body ──► RequestHeader ──► ApiKey ──► handler(snapshot) ──► ApiResponse
//!                                                                      │
//!  length-prefixed frame ◄── ResponseHeader v0/v1 + body ◄─────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;

use crate::api::{self, ApiResponse};
use crate::config::Config;
use crate::error::{KraftError, Result};
use crate::log::MetadataReplay;
use crate::metadata::{MetadataIndex, MetadataSnapshot, SharedMetadata};
use crate::protocol::messages::{DescribeTopicPartitionsRequest, FetchRequest};
use crate::protocol::{encode_frame, ApiKey, RequestHeader, ResponseHeader, Versioned, Wire};
use crate::storage::{LogDirectory, PartitionLogs};

/// Read-only request dispatcher
///
/// ## Concurrency:
/// - Shared between connection threads behind an `Arc`
/// - Each request works against one snapshot from start to finish
/// - `refresh()` publishes a new snapshot without blocking in-flight requests
#[derive(Debug, Default)]
pub struct Broker {
    /// Currently published index and partition logs
    metadata: SharedMetadata,

    /// Source of partition logs on refresh (`None` for brokers built in memory)
    log_dir: Option<LogDirectory>,
}

impl Broker {
    /// Load a broker from the log directory named in `config`
    ///
    /// On startup:
    /// 1. Read the cluster metadata log
    /// 2. Replay it into a metadata index
    /// 3. Read the log segments of every known partition
    pub fn open(config: &Config) -> Result<Self> {
        let dir = LogDirectory::open(&config.log_dir)?;
        let snapshot = load_snapshot(&dir)?;

        Ok(Self {
            metadata: SharedMetadata::new(snapshot),
            log_dir: Some(dir),
        })
    }

    /// Build a broker from an already replayed index
    pub fn from_parts(index: MetadataIndex, partition_logs: PartitionLogs) -> Self {
        Self {
            metadata: SharedMetadata::new(MetadataSnapshot::new(index, partition_logs)),
            log_dir: None,
        }
    }

    /// Current snapshot
    pub fn metadata(&self) -> Arc<MetadataSnapshot> {
        self.metadata.snapshot()
    }

    /// Replay `log` and publish the result
    ///
    /// Partition logs are re-read from the log directory for the new index.
    /// A broker built with `from_parts` keeps its current partition logs.
    /// On any failure the current snapshot stays published.
    pub fn refresh(&self, log: &[u8]) -> Result<()> {
        let (index, stats) = MetadataReplay::replay(log)?;
        let partition_logs = match &self.log_dir {
            Some(dir) => dir.load_partition_logs(&index)?,
            None => self.metadata.snapshot().partition_logs().clone(),
        };

        self.metadata.replace(MetadataSnapshot::new(index, partition_logs));
        tracing::info!("Metadata refreshed ({} records)", stats.records);
        Ok(())
    }

    /// Re-read the whole log directory and publish the result
    pub fn reload(&self) -> Result<()> {
        let dir = self.log_dir.as_ref().ok_or_else(|| {
            KraftError::Config("broker was not opened from a log directory".to_string())
        })?;
        self.metadata.replace(load_snapshot(dir)?);
        Ok(())
    }

    /// Handle one request frame body, returning a complete response frame
    ///
    /// Errors mean the request could not be decoded (or names an API this
    /// broker does not know); the caller should close the connection.
    pub fn handle_frame(&self, body: &[u8]) -> Result<Bytes> {
        let mut buf = body;
        let header = RequestHeader::decode(&mut buf)?;
        tracing::trace!("Request header: {:?}", header);

        let key =
            ApiKey::from_i16(header.api_key).ok_or(KraftError::UnknownApiKey(header.api_key))?;

        let response = self.dispatch(key, &header, &mut buf)?;
        if !buf.is_empty() {
            tracing::trace!("Ignoring {} trailing request bytes", buf.len());
        }

        let response_header =
            ResponseHeader::new(key.response_header_version(), header.correlation_id);
        Ok(encode_frame(|out| {
            response_header.encode(out);
            response.encode(out);
        }))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn dispatch(
        &self,
        key: ApiKey,
        header: &RequestHeader,
        buf: &mut &[u8],
    ) -> Result<ApiResponse> {
        let version = header.api_version;
        let supported = api::is_version_supported(key, version);
        let snapshot = self.metadata.snapshot();

        match key {
            ApiKey::ApiVersions => Ok(api::handle_api_versions(header)),
            ApiKey::DescribeTopicPartitions => {
                let request = if supported {
                    DescribeTopicPartitionsRequest::decode_versioned(buf, version)?
                } else {
                    decode_unsupported(key, buf, version, |_| {
                        DescribeTopicPartitionsRequest::new(Vec::<String>::new())
                    })
                };
                tracing::trace!("DescribeTopicPartitions request: {:?}", request);
                Ok(api::handle_describe_topic_partitions(
                    header,
                    &request,
                    snapshot.index(),
                ))
            }
            ApiKey::Fetch => {
                let request = if supported {
                    FetchRequest::decode_versioned(buf, version)?
                } else {
                    decode_unsupported(key, buf, version, |body| {
                        let mut request = FetchRequest::new(Vec::new());
                        request.session_id = peek_fetch_session_id(body, version);
                        request
                    })
                };
                tracing::trace!("Fetch request: {:?}", request);
                Ok(api::handle_fetch(
                    header,
                    &request,
                    snapshot.index(),
                    snapshot.partition_logs(),
                ))
            }
        }
    }
}

/// Replay the metadata log of `dir` and load the partition logs it names
fn load_snapshot(dir: &LogDirectory) -> Result<MetadataSnapshot> {
    let log = dir.metadata_log_bytes()?;
    let (index, stats) = MetadataReplay::replay(&log)?;
    tracing::debug!(
        "Replayed {} bytes from {}",
        stats.bytes,
        dir.metadata_log_path().display()
    );

    let partition_logs = dir.load_partition_logs(&index)?;
    tracing::info!(
        "Loaded {} partition logs from {}",
        partition_logs.len(),
        dir.root().display()
    );

    Ok(MetadataSnapshot::new(index, partition_logs))
}

/// Version to parse a request body at
///
/// Out-of-window versions are read with the nearest supported layout so the
/// handler can still name the topics it rejects.
fn body_version(key: ApiKey, version: i16) -> i16 {
    match api::supported_versions(key) {
        Some(range) => version.clamp(*range.start(), *range.end()),
        None => version,
    }
}

/// Best-effort body of a request whose version is outside the window
///
/// The body is tried at the nearest supported layout. When that does not
/// parse, `fallback` builds a request from the raw body instead; the reply is
/// still an UNSUPPORTED_VERSION response rather than a closed connection.
fn decode_unsupported<T: Versioned>(
    key: ApiKey,
    buf: &mut &[u8],
    version: i16,
    fallback: impl FnOnce(&[u8]) -> T,
) -> T {
    let mut attempt = *buf;
    match T::decode_versioned(&mut attempt, body_version(key, version)) {
        Ok(request) => {
            *buf = attempt;
            request
        }
        Err(e) => {
            tracing::debug!("Unreadable {:?} v{} body: {}", key, version, e);
            let request = fallback(buf);
            *buf = &[];
            request
        }
    }
}

/// Session id of a Fetch body in a layout this broker does not parse
///
/// From v7 the session id follows a fixed-width prefix: replica id (up to
/// v14), max wait, min bytes, max bytes, isolation level. Earlier versions
/// carry none.
fn peek_fetch_session_id(body: &[u8], version: i16) -> i32 {
    let offset = match version {
        7..=14 => 17,
        15..=16 => 13,
        _ => return 0,
    };
    let mut cursor = body.get(offset..).unwrap_or_default();
    i32::decode(&mut cursor).unwrap_or(0)
}
