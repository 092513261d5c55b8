//! Datasource construction from configuration

use hostmeta_core::{Datasource, DatasourceError};
use hostmeta_dns::DnsDatasource;
use hostmeta_etcd::EtcdDatasource;

use crate::config::{Config, DatasourceKind};

/// Build the datasource selected by `config.datasource`
///
/// # Errors
/// Returns `DatasourceError::Config` if the selected backend has no zones or
/// invalid settings, and `DatasourceError::Transport` if etcd is unreachable.
pub async fn create_datasource(config: &Config) -> Result<Box<dyn Datasource>, DatasourceError> {
    match config.datasource {
        DatasourceKind::Dns => {
            require_zones(&config.dns.zones)?;
            let datasource = DnsDatasource::new(config.dns.clone())?;
            tracing::info!(
                server = %config.dns.server,
                notransfer = config.dns.notransfer.enabled,
                tsig = config.dns.tsig.enabled,
                "using DNS datasource"
            );
            Ok(Box::new(datasource))
        }
        DatasourceKind::Etcd => {
            require_zones(&config.etcd.zones)?;
            let datasource = EtcdDatasource::connect(config.etcd.clone()).await?;
            tracing::info!(endpoints = ?config.etcd.endpoints, "using etcd datasource");
            Ok(Box::new(datasource))
        }
    }
}

fn require_zones(zones: &[String]) -> Result<(), DatasourceError> {
    if zones.iter().all(|z| z.trim_matches('.').is_empty()) {
        return Err(DatasourceError::Config("no zones configured".to_string()));
    }
    Ok(())
}
