//! Error types for hostmeta-etcd

use std::time::Duration;

use hostmeta_core::DatasourceError;
use thiserror::Error;

/// Errors that can occur while reading from etcd
#[derive(Error, Debug, Clone)]
pub enum EtcdError {
    /// Client connection or request failure
    #[error("etcd request failure: {0}")]
    Client(String),

    /// Request exceeded the configured timeout
    #[error("etcd request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<etcd_client::Error> for EtcdError {
    fn from(e: etcd_client::Error) -> Self {
        EtcdError::Client(e.to_string())
    }
}

impl From<EtcdError> for DatasourceError {
    fn from(e: EtcdError) -> Self {
        DatasourceError::Transport(e.to_string())
    }
}
