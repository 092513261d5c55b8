//! Configuration loading and types

use std::path::{Path, PathBuf};

use hostmeta_core::CodecConfig;
use hostmeta_dns::DnsConfig;
use hostmeta_etcd::EtcdConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the hostmeta binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend to read host records from
    #[serde(default)]
    pub datasource: DatasourceKind,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// DNS backend settings
    #[serde(default)]
    pub dns: DnsConfig,
    /// etcd backend settings
    #[serde(default)]
    pub etcd: EtcdConfig,
    /// Attribute string grammar
    #[serde(default)]
    pub txt: CodecConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datasource: DatasourceKind::default(),
            log_level: default_log_level(),
            dns: DnsConfig::default(),
            etcd: EtcdConfig::default(),
            txt: CodecConfig::default(),
        }
    }
}

/// Available datasource backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceKind {
    /// DNS TXT records
    #[default]
    Dns,
    /// etcd key space
    Etcd,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("HOSTMETA_CONFIG") {
            return Self::load(Path::new(&path));
        }

        let mut paths = vec![
            PathBuf::from("hostmeta.toml"),
            PathBuf::from("/etc/hostmeta/hostmeta.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("hostmeta/hostmeta.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        // Logging is not up yet, so this goes straight to stderr
        eprintln!("hostmeta: no config file found, using defaults");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
datasource = "etcd"
log_level = "debug"

[dns]
server = "10.0.0.53:53"
timeout = "5s"
zones = ["example.com."]

[dns.notransfer]
enabled = true

[dns.tsig]
enabled = true
algo = "hmac-sha512"

[etcd]
endpoints = ["10.0.0.10:2379", "10.0.0.11:2379"]
prefix = "INVENTORY"
timeout = "2m"
zones = ["example.com"]

[txt]
field_separator = "|"
strict_keys = true

[txt.keys]
os = "os"
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        assert_eq!(config.datasource, DatasourceKind::Etcd);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.dns.server, "10.0.0.53:53");
        assert_eq!(config.dns.timeout, std::time::Duration::from_secs(5));
        assert!(config.dns.notransfer.enabled);
        assert_eq!(config.dns.notransfer.host, "ansible-dns-inventory");
        assert_eq!(config.dns.tsig.algo, "hmac-sha512");
        assert_eq!(config.dns.tsig.key, "axfr.");
        assert_eq!(config.etcd.endpoints.len(), 2);
        assert_eq!(config.etcd.prefix, "INVENTORY");
        assert_eq!(config.etcd.timeout, std::time::Duration::from_secs(120));
        assert_eq!(config.txt.field_separator, "|");
        assert_eq!(config.txt.kv_separator, "=");
        assert!(config.txt.strict_keys);
        assert_eq!(config.txt.keys.os, "os");
        assert_eq!(config.txt.keys.role, "ROLE");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.datasource, DatasourceKind::Dns);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.dns.server, "127.0.0.1:53");
        assert_eq!(config.etcd.prefix, "ANSIBLE_INVENTORY");
        assert_eq!(config.txt.field_separator, ";");
    }

    #[test]
    fn test_unknown_datasource_rejected() {
        let result: Result<Config, _> = toml::from_str(r#"datasource = "ldap""#);

        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("hostmeta-test-{}.toml", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.datasource, DatasourceKind::Etcd);
        assert!(Config::load(&path).is_err());
    }
}
