//! etcd datasource

use std::collections::BTreeMap;

use async_trait::async_trait;
use hostmeta_core::{Datasource, DatasourceError, Record, resolve_zone};
use tracing::{debug, instrument, warn};

use crate::config::EtcdConfig;
use crate::error::EtcdError;
use crate::store::{EtcdStore, KvStore};

/// etcd-backed host record source
pub struct EtcdDatasource {
    /// Backend configuration
    config: EtcdConfig,
    /// Namespaced key-value store
    store: Box<dyn KvStore>,
}

impl std::fmt::Debug for EtcdDatasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdDatasource")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EtcdDatasource {
    /// Connect to the configured etcd cluster
    ///
    /// # Errors
    /// Returns `DatasourceError::Transport` if the cluster is unreachable.
    pub async fn connect(config: EtcdConfig) -> Result<Self, DatasourceError> {
        let store = EtcdStore::connect(&config).await?;
        Ok(Self::with_store(config, Box::new(store)))
    }

    /// Create a datasource on top of an existing store
    pub fn with_store(config: EtcdConfig, store: Box<dyn KvStore>) -> Self {
        Self { config, store }
    }

    /// Backend configuration
    pub fn config(&self) -> &EtcdConfig {
        &self.config
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<Record>, EtcdError> {
        let pairs = self.store.get_prefix(prefix).await?;
        Ok(group_records(&pairs))
    }
}

#[async_trait]
impl Datasource for EtcdDatasource {
    #[instrument(skip(self))]
    async fn get_all_records(&self) -> Result<Vec<Record>, DatasourceError> {
        let mut records = Vec::new();

        for zone in &self.config.zones {
            match self.scan(&zone_prefix(zone)).await {
                Ok(zone_records) => {
                    debug!(zone = %zone, count = zone_records.len(), "zone loaded");
                    records.extend(zone_records);
                }
                Err(e) => warn!(zone = %zone, error = %e, "skipping zone"),
            }
        }

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_host_records(&self, host: &str) -> Result<Vec<Record>, DatasourceError> {
        let zone = resolve_zone(host, &self.config.zones)
            .ok_or_else(|| DatasourceError::ZoneResolution(host.to_string()))?;
        let prefix = format!("{}{}/", zone_prefix(zone), host.trim_matches('.'));

        let records = self.scan(&prefix).await?;
        if records.is_empty() {
            return Err(DatasourceError::NotFound(host.to_string()));
        }

        Ok(records)
    }

    fn close(self: Box<Self>) {
        debug!(endpoints = ?self.config.endpoints, "closing etcd datasource");
    }

    fn datasource_type(&self) -> &'static str {
        "etcd"
    }
}

/// Key prefix of a zone; the zone name is used as configured
fn zone_prefix(zone: &str) -> String {
    format!("{zone}/")
}

/// Split a `<zone>/<hostname>/<index>` key into hostname and set index
fn parse_key(key: &str) -> Option<(&str, u64)> {
    let mut segments = key.split('/');
    let (_zone, host, index) = (segments.next()?, segments.next()?, segments.next()?);

    if segments.next().is_some() || host.trim_matches('.').is_empty() {
        return None;
    }

    Some((host, index.parse().ok()?))
}

/// Fold key-value pairs into records ordered by hostname, then set index
fn group_records(pairs: &[(String, String)]) -> Vec<Record> {
    let mut sets: BTreeMap<(&str, u64), &str> = BTreeMap::new();

    for (key, value) in pairs {
        match parse_key(key) {
            Some(slot) => {
                sets.insert(slot, value);
            }
            None => warn!(key = %key, "skipping host attributes set"),
        }
    }

    sets.into_iter()
        .map(|((host, _), value)| Record::new(host, value))
        .collect()
}
