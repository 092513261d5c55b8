//! Configuration types for the attribute codec

use serde::{Deserialize, Serialize};

/// Delimiters and key names of the TXT attribute grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Separator between `key=value` items
    #[serde(default = "default_field_separator")]
    pub field_separator: String,
    /// Separator between an item's key and value
    #[serde(default = "default_kv_separator")]
    pub kv_separator: String,
    /// Separator between variable pairs inside the vars field
    #[serde(default = "default_vars_separator")]
    pub vars_separator: String,
    /// Separator between a variable's key and value
    #[serde(default = "default_vars_kv_separator")]
    pub vars_kv_separator: String,
    /// Reject items whose key is not in the key-name table
    #[serde(default)]
    pub strict_keys: bool,
    /// Recognized attribute key names
    #[serde(default)]
    pub keys: KeyNames,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            field_separator: default_field_separator(),
            kv_separator: default_kv_separator(),
            vars_separator: default_vars_separator(),
            vars_kv_separator: default_vars_kv_separator(),
            strict_keys: false,
            keys: KeyNames::default(),
        }
    }
}

fn default_field_separator() -> String {
    ";".to_string()
}

fn default_kv_separator() -> String {
    "=".to_string()
}

fn default_vars_separator() -> String {
    ",".to_string()
}

fn default_vars_kv_separator() -> String {
    "=".to_string()
}

/// Key labels used in encoded attribute strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyNames {
    /// Operating system key
    #[serde(default = "default_os_key")]
    pub os: String,
    /// Environment key
    #[serde(default = "default_env_key")]
    pub env: String,
    /// Role key
    #[serde(default = "default_role_key")]
    pub role: String,
    /// Service key
    #[serde(default = "default_srv_key")]
    pub srv: String,
    /// Host variables key
    #[serde(default = "default_vars_key")]
    pub vars: String,
}

impl Default for KeyNames {
    fn default() -> Self {
        Self {
            os: default_os_key(),
            env: default_env_key(),
            role: default_role_key(),
            srv: default_srv_key(),
            vars: default_vars_key(),
        }
    }
}

fn default_os_key() -> String {
    "OS".to_string()
}

fn default_env_key() -> String {
    "ENV".to_string()
}

fn default_role_key() -> String {
    "ROLE".to_string()
}

fn default_srv_key() -> String {
    "SRV".to_string()
}

fn default_vars_key() -> String {
    "VARS".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: CodecConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.field_separator, ";");
        assert_eq!(config.keys.role, "ROLE");
        assert!(!config.strict_keys);
    }

    #[test]
    fn test_partial_key_override() {
        let config: CodecConfig =
            serde_json::from_str(r#"{"field_separator": "|", "keys": {"os": "SYS"}}"#).unwrap();

        assert_eq!(config.field_separator, "|");
        assert_eq!(config.keys.os, "SYS");
        assert_eq!(config.keys.env, "ENV");
    }
}
