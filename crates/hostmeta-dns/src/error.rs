//! Error types for hostmeta-dns

use std::time::Duration;

use hostmeta_core::DatasourceError;
use thiserror::Error;

/// Errors that can occur while talking to a DNS server
#[derive(Error, Debug, Clone)]
pub enum DnsError {
    /// Dial, read or write exceeded the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Socket error
    #[error("I/O error: {0}")]
    Io(String),

    /// Message encoding or decoding failed
    #[error("protocol error: {0}")]
    Proto(String),

    /// Server answered with a non-success response code
    #[error("server responded with {0}")]
    Rcode(String),

    /// TSIG key setup or signing failed
    #[error("TSIG error: {0}")]
    Tsig(String),

    /// Response did not look like a valid answer
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Zone held no usable TXT records
    #[error("no TXT records found: {0}")]
    NoRecords(String),
}

impl From<std::io::Error> for DnsError {
    fn from(e: std::io::Error) -> Self {
        DnsError::Io(e.to_string())
    }
}

impl From<hickory_proto::error::ProtoError> for DnsError {
    fn from(e: hickory_proto::error::ProtoError) -> Self {
        DnsError::Proto(e.to_string())
    }
}

impl From<DnsError> for DatasourceError {
    fn from(e: DnsError) -> Self {
        DatasourceError::Transport(e.to_string())
    }
}
