//! etcd datasource configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// etcd backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtcdConfig {
    /// Cluster endpoints
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    /// Namespace prefix all keys live under
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Dial and request timeout, e.g. `"30s"` or `"1m 30s"`
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Zones to read host records from
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            prefix: default_prefix(),
            timeout: default_timeout(),
            zones: default_zones(),
        }
    }
}

fn default_endpoints() -> Vec<String> {
    vec!["127.0.0.1:2379".to_string()]
}

fn default_prefix() -> String {
    "ANSIBLE_INVENTORY".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_zones() -> Vec<String> {
    vec!["server.local.".to_string()]
}
