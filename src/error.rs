//! Error types for kraftlog
//!
//! Provides a unified error type for all operations.
//!
//! Protocol-level outcomes such as `UNSUPPORTED_VERSION` are not errors here:
//! they travel as error codes inside response values (see `api::ErrorCode`).

use thiserror::Error;

/// Result type alias using KraftError
pub type Result<T> = std::result::Result<T, KraftError>;

/// Unified error type for kraftlog operations
#[derive(Debug, Error)]
pub enum KraftError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },

    #[error("Malformed varint: more than {max_groups} groups or value overflow")]
    MalformedVarint { max_groups: usize },

    #[error("Invalid length field: {0}")]
    InvalidLength(i64),

    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Unknown record type: {0}")]
    UnknownRecordType(i8),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Unknown API key: {0}")]
    UnknownApiKey(i16),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KraftError {
    /// Shorthand for a `TruncatedInput` error
    pub(crate) fn truncated(needed: usize, remaining: usize) -> Self {
        KraftError::TruncatedInput { needed, remaining }
    }
}
