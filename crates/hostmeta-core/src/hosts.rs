//! Turn raw datasource records into per-host attribute sets

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::codec::AttributeCodec;
use crate::types::{Attributes, Record};

/// Hosts mapped to their expanded attribute sets
pub type HostAttributes = BTreeMap<String, Vec<Attributes>>;

/// Decode and expand every record, grouping the results by hostname
///
/// Records that fail to decode are logged and skipped. Records whose role or
/// srv expand to nothing contribute no entries.
#[must_use]
pub fn collect_hosts(records: &[Record], codec: &AttributeCodec) -> HostAttributes {
    let mut hosts = HostAttributes::new();

    for record in records {
        let attrs = match codec.decode(&record.attributes) {
            Ok(attrs) => attrs,
            Err(e) => {
                warn!(host = %record.hostname, error = %e, "skipping host");
                continue;
            }
        };

        let expanded = attrs.expand();
        if expanded.is_empty() {
            debug!(host = %record.hostname, "no role/srv combination, dropping attribute set");
            continue;
        }

        hosts
            .entry(record.hostname.clone())
            .or_default()
            .extend(expanded);
    }

    hosts
}

/// Merge the variables of all attribute sets of one host
///
/// Later sets overwrite keys of earlier ones. Sets with malformed variables
/// are logged and skipped.
#[must_use]
pub fn collect_vars(
    host: &str,
    attrs: &[Attributes],
    codec: &AttributeCodec,
) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    for set in attrs.iter().filter(|a| a.has_vars()) {
        if let Err(e) = codec.decode_vars_into(&set.vars, &mut vars) {
            warn!(host, error = %e, "skipping host variables");
        }
    }

    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_hosts_skips_bad_records() {
        let codec = AttributeCodec::default();
        let records = vec![
            Record::new("web1", "OS=linux;ROLE=web,db;SRV=http"),
            Record::new("bad", "OS=li nux;ROLE=web;SRV=http"),
            Record::new("norole", "OS=linux;SRV=http"),
            Record::new("web1", "OS=linux;ROLE=cache;SRV=redis"),
        ];

        let hosts = collect_hosts(&records, &codec);

        assert_eq!(hosts.len(), 1);
        let roles: Vec<&str> = hosts["web1"].iter().map(|a| a.role.as_str()).collect();
        assert_eq!(roles, vec!["web", "db", "cache"]);
    }

    #[test]
    fn test_collect_vars_merges_sets() {
        let codec = AttributeCodec::default();
        let records = vec![
            Record::new("db1", "ROLE=db;SRV=pg;VARS=port=5432,tier=1"),
            Record::new("db1", "ROLE=db;SRV=backup;VARS=tier=2"),
        ];

        let hosts = collect_hosts(&records, &codec);
        let vars = collect_vars("db1", &hosts["db1"], &codec);

        assert_eq!(vars["port"], "5432");
        assert_eq!(vars["tier"], "2");
    }
}
