//! Error types for hostmeta-core

use thiserror::Error;

/// Errors produced while decoding an attribute string
///
/// Every variant means "skip this record"; none of them is fatal to a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A decoded field contains characters that are unsafe downstream
    #[error("unsafe value in {field}: {value:?}")]
    Validation {
        /// Attribute field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// The raw text does not follow the grammar
    #[error("malformed encoding: {0:?}")]
    MalformedEncoding(String),

    /// Key is not in the key-name table (strict mode only)
    #[error("unknown attribute key: {0:?}")]
    UnknownKey(String),
}

/// Errors returned by datasource operations
#[derive(Error, Debug, Clone)]
pub enum DatasourceError {
    /// Backend request failed (timeout, connection, protocol error)
    #[error("transport error: {0}")]
    Transport(String),

    /// Hostname does not belong to any configured zone
    #[error("failed to determine zone from hostname: {0}")]
    ZoneResolution(String),

    /// Single-host lookup returned no answers
    #[error("host not found: {0}")]
    NotFound(String),

    /// Invalid datasource configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DatasourceError {
    /// Check if the caller can skip the affected zone or host and continue
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DatasourceError::Transport(_))
    }
}
