//! DNS datasource configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// DNS backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// DNS server address (`host:port`)
    #[serde(default = "default_server")]
    pub server: String,
    /// Per-request dial/read/write timeout, e.g. `"30s"` or `"1m 30s"`
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Zones to read host records from
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,
    /// No-transfer mode settings
    #[serde(default)]
    pub notransfer: NoTransferConfig,
    /// TSIG settings for zone transfers
    #[serde(default)]
    pub tsig: TsigConfig,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            timeout: default_timeout(),
            zones: default_zones(),
            notransfer: NoTransferConfig::default(),
            tsig: TsigConfig::default(),
        }
    }
}

fn default_server() -> String {
    "127.0.0.1:53".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_zones() -> Vec<String> {
    vec!["server.local.".to_string()]
}

/// No-transfer mode: all hosts of a zone packed into one sentinel TXT record
///
/// The sentinel is also the inventory marker that zone transfers skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoTransferConfig {
    /// Use sentinel queries instead of AXFR
    #[serde(default)]
    pub enabled: bool,
    /// Sentinel host name, relative to each zone
    #[serde(default = "default_notransfer_host")]
    pub host: String,
    /// Separator between `hostname:attributes` entries
    #[serde(default = "default_notransfer_separator")]
    pub separator: String,
    /// Separator between an entry's hostname and its attributes
    #[serde(default = "default_notransfer_host_separator")]
    pub host_separator: String,
}

impl Default for NoTransferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_notransfer_host(),
            separator: default_notransfer_separator(),
            host_separator: default_notransfer_host_separator(),
        }
    }
}

fn default_notransfer_host() -> String {
    "ansible-dns-inventory".to_string()
}

fn default_notransfer_separator() -> String {
    "|".to_string()
}

fn default_notransfer_host_separator() -> String {
    ":".to_string()
}

/// TSIG signing of zone transfer requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsigConfig {
    /// Sign AXFR requests
    #[serde(default)]
    pub enabled: bool,
    /// Key name
    #[serde(default = "default_tsig_key")]
    pub key: String,
    /// Base64-encoded shared secret
    #[serde(default = "default_tsig_secret")]
    pub secret: String,
    /// HMAC algorithm name (`hmac-sha256` etc.)
    #[serde(default = "default_tsig_algo")]
    pub algo: String,
}

impl Default for TsigConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key: default_tsig_key(),
            secret: default_tsig_secret(),
            algo: default_tsig_algo(),
        }
    }
}

fn default_tsig_key() -> String {
    "axfr.".to_string()
}

fn default_tsig_secret() -> String {
    "c2VjcmV0Cg==".to_string()
}

fn default_tsig_algo() -> String {
    "hmac-sha256".to_string()
}
