//! DNS datasource
//!
//! Reads host records from TXT records, either by transferring whole zones or,
//! where AXFR is not allowed, from one sentinel TXT record per zone.

use std::sync::Arc;

use async_trait::async_trait;
use hickory_proto::rr::{Name, RData, Record as ResourceRecord, RecordType};
use hostmeta_core::{Datasource, DatasourceError, Record, normalize_name, resolve_zone};
use tracing::{debug, instrument, warn};

use crate::config::DnsConfig;
use crate::error::DnsError;
use crate::transport::{DnsTransport, TcpUdpTransport};
use crate::tsig::TsigKey;

/// DNS-backed host record source
pub struct DnsDatasource {
    /// Backend configuration
    config: DnsConfig,
    /// Network transport
    transport: Arc<dyn DnsTransport>,
}

impl std::fmt::Debug for DnsDatasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsDatasource")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DnsDatasource {
    /// Create a datasource talking to the configured server
    ///
    /// # Errors
    /// Returns `DatasourceError::Config` if TSIG is enabled with an invalid
    /// key name, secret or algorithm.
    pub fn new(config: DnsConfig) -> Result<Self, DatasourceError> {
        let mut transport = TcpUdpTransport::new(&config.server, config.timeout);

        if config.tsig.enabled {
            let key = TsigKey::new(&config.tsig.key, &config.tsig.algo, &config.tsig.secret)
                .map_err(|e| DatasourceError::Config(e.to_string()))?;
            transport = transport.with_tsig(key);
        }

        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a datasource on top of an existing transport
    pub fn with_transport(config: DnsConfig, transport: Arc<dyn DnsTransport>) -> Self {
        Self { config, transport }
    }

    /// Backend configuration
    pub fn config(&self) -> &DnsConfig {
        &self.config
    }

    /// Transfer a zone and keep its host TXT records
    async fn transfer_zone(&self, zone: &str) -> Result<Vec<Record>, DnsError> {
        let marker = normalize_name(&make_fqdn(&self.config.notransfer.host, zone));
        let rrs = self
            .transport
            .transfer(&parse_name(&make_fqdn("", zone))?)
            .await?;

        let records: Vec<Record> = rrs
            .iter()
            .filter(|rr| rr.record_type() == RecordType::TXT)
            .filter(|rr| normalize_name(&rr.name().to_string()) != marker)
            .filter_map(host_record)
            .collect();

        if records.is_empty() {
            return Err(DnsError::NoRecords(zone.to_string()));
        }

        Ok(records)
    }

    /// Query a zone's sentinel record and unpack its host entries
    async fn sentinel_records(&self, zone: &str) -> Result<Vec<Record>, DnsError> {
        let name = parse_name(&make_fqdn(&self.config.notransfer.host, zone))?;
        let rrs = self.transport.query_txt(&name).await?;

        let values: Vec<String> = rrs
            .iter()
            .filter(|rr| rr.record_type() == RecordType::TXT)
            .filter_map(txt_value)
            .collect();
        if values.is_empty() {
            return Err(DnsError::NoRecords(name.to_string()));
        }

        Ok(values
            .iter()
            .flat_map(|value| self.split_sentinel(value))
            .collect())
    }

    /// Split a sentinel TXT value into `hostname<sep>attributes` entries
    fn split_sentinel(&self, value: &str) -> Vec<Record> {
        let notransfer = &self.config.notransfer;
        let mut records = Vec::new();

        for entry in value.split(notransfer.separator.as_str()) {
            if entry.is_empty() {
                continue;
            }

            match entry.split_once(notransfer.host_separator.as_str()) {
                Some((host, attrs)) if !host.trim_end_matches('.').is_empty() => {
                    records.push(Record::new(host, attrs));
                }
                _ => warn!(entry, "skipping malformed no-transfer entry"),
            }
        }

        records
    }

    async fn zone_records(&self, zone: &str) -> Result<Vec<Record>, DnsError> {
        if self.config.notransfer.enabled {
            self.sentinel_records(zone).await
        } else {
            self.transfer_zone(zone).await
        }
    }
}

#[async_trait]
impl Datasource for DnsDatasource {
    #[instrument(skip(self), fields(notransfer = self.config.notransfer.enabled))]
    async fn get_all_records(&self) -> Result<Vec<Record>, DatasourceError> {
        let mut records = Vec::new();

        for zone in &self.config.zones {
            match self.zone_records(zone).await {
                Ok(zone_records) => {
                    debug!(zone = %zone, count = zone_records.len(), "zone loaded");
                    records.extend(zone_records);
                }
                Err(e) => warn!(zone = %zone, error = %e, "skipping zone"),
            }
        }

        Ok(records)
    }

    #[instrument(skip(self), fields(notransfer = self.config.notransfer.enabled))]
    async fn get_host_records(&self, host: &str) -> Result<Vec<Record>, DatasourceError> {
        let records: Vec<Record> = if self.config.notransfer.enabled {
            let zone = resolve_zone(host, &self.config.zones)
                .ok_or_else(|| DatasourceError::ZoneResolution(host.to_string()))?;
            let wanted = normalize_name(host);

            self.sentinel_records(zone)
                .await?
                .into_iter()
                .filter(|record| normalize_name(&record.hostname) == wanted)
                .collect()
        } else {
            let name = parse_name(&make_fqdn(host, "")).map_err(DatasourceError::from)?;

            self.transport
                .query_txt(&name)
                .await?
                .iter()
                .filter(|rr| rr.record_type() == RecordType::TXT)
                .filter_map(host_record)
                .collect()
        };

        if records.is_empty() {
            return Err(DatasourceError::NotFound(host.to_string()));
        }

        Ok(records)
    }

    fn close(self: Box<Self>) {
        debug!(server = %self.config.server, "closing DNS datasource");
    }

    fn datasource_type(&self) -> &'static str {
        "dns"
    }
}

/// Fully qualified name of `host` inside `zone`
///
/// An empty `host` yields the zone apex, an empty `zone` qualifies `host` as is.
#[must_use]
pub fn make_fqdn(host: &str, zone: &str) -> String {
    let host = host.trim_matches('.');
    let zone = zone.trim_matches('.');

    match (host.is_empty(), zone.is_empty()) {
        (_, true) => format!("{host}."),
        (true, false) => format!("{zone}."),
        (false, false) => format!("{host}.{zone}."),
    }
}

fn parse_name(fqdn: &str) -> Result<Name, DnsError> {
    Ok(Name::from_ascii(fqdn)?)
}

/// Concatenated character-strings of a TXT record
fn txt_value(rr: &ResourceRecord) -> Option<String> {
    match rr.data() {
        Some(RData::TXT(txt)) => Some(
            txt.txt_data()
                .iter()
                .map(|part| String::from_utf8_lossy(part))
                .collect(),
        ),
        _ => None,
    }
}

/// Fold a TXT record into a host record named after its owner
fn host_record(rr: &ResourceRecord) -> Option<Record> {
    let record = Record::new(rr.name().to_string(), txt_value(rr)?);
    (!record.hostname.is_empty()).then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_fqdn() {
        assert_eq!(make_fqdn("ansible-dns-inventory", "example.com."), "ansible-dns-inventory.example.com.");
        assert_eq!(make_fqdn(".web1", ".example.com"), "web1.example.com.");
        assert_eq!(make_fqdn("", "example.com"), "example.com.");
        assert_eq!(make_fqdn("web1.example.com", ""), "web1.example.com.");
    }

    #[test]
    fn test_split_sentinel() {
        let ds = DnsDatasource::new(DnsConfig::default()).unwrap();

        let records =
            ds.split_sentinel("web1:OS=linux;ROLE=web;SRV=http|garbage|:OS=x|web2.:OS=linux;ROLE=db;SRV=pg|");

        assert_eq!(
            records,
            vec![
                Record::new("web1", "OS=linux;ROLE=web;SRV=http"),
                Record::new("web2", "OS=linux;ROLE=db;SRV=pg"),
            ]
        );
    }

    #[test]
    fn test_invalid_tsig_secret_is_config_error() {
        let mut config = DnsConfig::default();
        config.tsig.enabled = true;
        config.tsig.secret = "%%%".to_string();

        let result = DnsDatasource::new(config);

        assert!(matches!(result, Err(DatasourceError::Config(_))));
    }
}
