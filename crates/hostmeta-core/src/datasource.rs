//! Datasource trait and shared zone helpers

use async_trait::async_trait;

use crate::error::DatasourceError;
use crate::types::Record;

/// Read-only source of raw host records
///
/// Exactly one implementation is active per process, chosen at startup.
#[async_trait]
pub trait Datasource: Send + Sync {
    /// Fetch the records of every host in every configured zone
    ///
    /// Zones that fail are logged and skipped.
    async fn get_all_records(&self) -> Result<Vec<Record>, DatasourceError>;

    /// Fetch the records of a single host
    async fn get_host_records(&self, host: &str) -> Result<Vec<Record>, DatasourceError>;

    /// Release backend resources
    fn close(self: Box<Self>);

    /// Backend name for logging
    fn datasource_type(&self) -> &'static str;
}

/// Lowercase a DNS-style name and strip leading/trailing dots
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim_matches('.').to_ascii_lowercase()
}

/// Find the configured zone a host belongs to
///
/// Picks the longest zone that equals the host or is a suffix of it on a
/// label boundary.
#[must_use]
pub fn resolve_zone<'a>(host: &str, zones: &'a [String]) -> Option<&'a str> {
    let host = normalize_name(host);

    zones
        .iter()
        .map(|zone| (zone, normalize_name(zone)))
        .filter(|(_, zone)| {
            !zone.is_empty()
                && (host == *zone
                    || host
                        .strip_suffix(zone.as_str())
                        .is_some_and(|rest| rest.ends_with('.')))
        })
        .max_by_key(|(_, zone)| zone.len())
        .map(|(zone, _)| zone.as_str())
}
