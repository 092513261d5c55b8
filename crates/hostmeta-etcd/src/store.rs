//! Key-value store access

use std::time::Duration;

use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, GetOptions, KvClientPrefix};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::EtcdConfig;
use crate::error::EtcdError;

/// Prefix scans against a key-value store
///
/// Keys are relative to the store's namespace on the way in and on the way
/// out.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Return every `(key, value)` pair whose key starts with `prefix`
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, EtcdError>;
}

/// etcd-backed store confined to one namespace
pub struct EtcdStore {
    /// KV service handle scoped to `<prefix>/`
    kv: Mutex<KvClientPrefix>,
    /// Configured namespace prefix
    namespace: String,
    /// Request timeout
    timeout: Duration,
}

impl std::fmt::Debug for EtcdStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdStore")
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl EtcdStore {
    /// Connect to the configured cluster
    ///
    /// # Errors
    /// Returns `EtcdError::Timeout` if the cluster cannot be reached in time,
    /// or `EtcdError::Client` if the connection is refused.
    #[instrument(skip(config), fields(endpoints = ?config.endpoints))]
    pub async fn connect(config: &EtcdConfig) -> Result<Self, EtcdError> {
        let timeout = config.timeout;
        let options = ConnectOptions::new()
            .with_connect_timeout(timeout)
            .with_timeout(timeout);

        let client = tokio::time::timeout(
            timeout,
            Client::connect(&config.endpoints, Some(options)),
        )
        .await
        .map_err(|_| EtcdError::Timeout(timeout))??;

        debug!(namespace = %config.prefix, "connected to etcd");

        let root = format!("{}/", config.prefix.trim_end_matches('/'));
        Ok(Self {
            kv: Mutex::new(KvClientPrefix::new(client.kv_client(), root.into_bytes())),
            namespace: config.prefix.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl KvStore for EtcdStore {
    #[instrument(skip(self))]
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, EtcdError> {
        let mut kv = self.kv.lock().await;

        let response = tokio::time::timeout(
            self.timeout,
            kv.get(prefix, Some(GetOptions::new().with_prefix())),
        )
        .await
        .map_err(|_| EtcdError::Timeout(self.timeout))??;

        Ok(decode_pairs(
            response.kvs().iter().map(|pair| (pair.key(), pair.value())),
        ))
    }
}

/// Decode raw pairs as UTF-8, skipping any pair that is not
fn decode_pairs<'a>(raw: impl Iterator<Item = (&'a [u8], &'a [u8])>) -> Vec<(String, String)> {
    raw.filter_map(|(key, value)| {
        let Ok(key) = std::str::from_utf8(key) else {
            warn!(key = %String::from_utf8_lossy(key), "skipping key with invalid UTF-8");
            return None;
        };
        let Ok(value) = std::str::from_utf8(value) else {
            warn!(key = %key, "skipping value with invalid UTF-8");
            return None;
        };

        Some((key.to_string(), value.to_string()))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pairs_skips_invalid_utf8() {
        let raw: Vec<(&[u8], &[u8])> = vec![
            (b"zoneA/host1/0", b"ROLE=web;SRV=http"),
            (b"zoneA/\xffhost/0", b"ROLE=web;SRV=http"),
            (b"zoneA/host2/0", b"ROLE=db;SRV=\xc3\x28"),
            (b"zoneA/host3/0", b"ROLE=db;SRV=pg"),
        ];

        let pairs = decode_pairs(raw.into_iter());

        assert_eq!(
            pairs,
            vec![
                ("zoneA/host1/0".to_string(), "ROLE=web;SRV=http".to_string()),
                ("zoneA/host3/0".to_string(), "ROLE=db;SRV=pg".to_string()),
            ]
        );
    }
}
