//! TXT attribute grammar codec
//!
//! Attribute strings look like `OS=linux;ENV=prod;ROLE=web,db;SRV=http;VARS=a=1,b=2`.
//! All delimiters and key names come from [`CodecConfig`].

use std::collections::BTreeMap;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::types::Attributes;

/// Punctuation allowed in every attribute field
const SAFE_PUNCT: &[char] = &['.', '_', '-'];
/// Extra punctuation allowed in role and srv lists
const LIST_PUNCT: &[char] = &[','];
/// Extra punctuation allowed in the vars field
const VARS_PUNCT: &[char] = &[',', '=', '/', ':', '@', '+'];

/// Encoder/decoder for host attribute strings
#[derive(Debug, Clone)]
pub struct AttributeCodec {
    config: CodecConfig,
    /// Characters of the configured variable separators
    vars_chars: Vec<char>,
}

impl AttributeCodec {
    /// Create a codec for the given grammar
    pub fn new(config: CodecConfig) -> Self {
        let vars_chars = config
            .vars_separator
            .chars()
            .chain(config.vars_kv_separator.chars())
            .collect();

        Self { config, vars_chars }
    }

    /// Grammar this codec was built with
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode an attribute string
    ///
    /// Empty items are skipped and absent fields stay empty. Unknown keys are
    /// ignored unless `strict_keys` is set.
    ///
    /// # Errors
    /// Returns `CodecError::MalformedEncoding` for an item without a key/value
    /// separator, `CodecError::UnknownKey` for an unknown key in strict mode and
    /// `CodecError::Validation` if any field holds unsafe characters.
    pub fn decode(&self, raw: &str) -> Result<Attributes, CodecError> {
        let cfg = &self.config;
        let keys = &cfg.keys;
        let mut attrs = Attributes::default();

        for item in raw.split(cfg.field_separator.as_str()) {
            if item.is_empty() {
                continue;
            }

            let (key, value) = item
                .split_once(cfg.kv_separator.as_str())
                .ok_or_else(|| CodecError::MalformedEncoding(item.to_string()))?;

            if key == keys.os {
                attrs.os = value.to_string();
            } else if key == keys.env {
                attrs.env = value.to_string();
            } else if key == keys.role {
                attrs.role = value.to_string();
            } else if key == keys.srv {
                attrs.srv = value.to_string();
            } else if key == keys.vars {
                attrs.vars = value.to_string();
            } else if cfg.strict_keys {
                return Err(CodecError::UnknownKey(key.to_string()));
            }
        }

        self.validate(&attrs)?;

        Ok(attrs)
    }

    /// Decode an attribute string and expand it into single role/srv sets
    ///
    /// # Errors
    /// Same as [`AttributeCodec::decode`].
    pub fn decode_expanded(&self, raw: &str) -> Result<Vec<Attributes>, CodecError> {
        Ok(self.decode(raw)?.expand())
    }

    /// Encode attributes back into the TXT grammar
    ///
    /// Empty fields are omitted.
    #[must_use]
    pub fn encode(&self, attrs: &Attributes) -> String {
        let cfg = &self.config;
        let keys = &cfg.keys;

        [
            (&keys.os, &attrs.os),
            (&keys.env, &attrs.env),
            (&keys.role, &attrs.role),
            (&keys.srv, &attrs.srv),
            (&keys.vars, &attrs.vars),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}{}{value}", cfg.kv_separator))
        .collect::<Vec<_>>()
        .join(cfg.field_separator.as_str())
    }

    /// Parse an encoded vars string into a map
    ///
    /// # Errors
    /// Returns `CodecError::MalformedEncoding` for a pair without a separator.
    pub fn decode_vars(&self, raw: &str) -> Result<BTreeMap<String, String>, CodecError> {
        let mut vars = BTreeMap::new();
        self.decode_vars_into(raw, &mut vars)?;
        Ok(vars)
    }

    /// Parse an encoded vars string and merge it into `vars`
    ///
    /// Later keys overwrite earlier ones. On error `vars` is left untouched.
    ///
    /// # Errors
    /// Returns `CodecError::MalformedEncoding` for a pair without a separator.
    pub fn decode_vars_into(
        &self,
        raw: &str,
        vars: &mut BTreeMap<String, String>,
    ) -> Result<(), CodecError> {
        let cfg = &self.config;
        let mut pairs = Vec::new();

        for pair in raw.split(cfg.vars_separator.as_str()) {
            if pair.is_empty() {
                continue;
            }

            // Only the first separator splits; the rest belongs to the value.
            let (key, value) = pair
                .split_once(cfg.vars_kv_separator.as_str())
                .ok_or_else(|| CodecError::MalformedEncoding(pair.to_string()))?;
            pairs.push((key.to_string(), value.to_string()));
        }

        vars.extend(pairs);
        Ok(())
    }

    /// Check every field against the safe character rules
    fn validate(&self, attrs: &Attributes) -> Result<(), CodecError> {
        let fields: [(&'static str, &str, &[char]); 4] = [
            ("os", attrs.os.as_str(), &[]),
            ("env", attrs.env.as_str(), &[]),
            ("role", attrs.role.as_str(), LIST_PUNCT),
            ("srv", attrs.srv.as_str(), LIST_PUNCT),
        ];

        for (field, value, extra) in fields {
            if !self.is_safe(value, extra) {
                return Err(CodecError::Validation {
                    field,
                    value: value.to_string(),
                });
            }
        }

        let vars_safe = attrs.vars.chars().all(|c| {
            safe_char(c, VARS_PUNCT) || self.vars_chars.contains(&c)
        }) && !self.contains_field_separator(&attrs.vars);
        if !vars_safe {
            return Err(CodecError::Validation {
                field: "vars",
                value: attrs.vars.clone(),
            });
        }

        Ok(())
    }

    fn is_safe(&self, value: &str, extra: &[char]) -> bool {
        value.chars().all(|c| safe_char(c, extra)) && !self.contains_field_separator(value)
    }

    fn contains_field_separator(&self, value: &str) -> bool {
        !self.config.field_separator.is_empty() && value.contains(&self.config.field_separator)
    }
}

impl Default for AttributeCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

fn safe_char(c: char, extra: &[char]) -> bool {
    c.is_ascii_alphanumeric() || SAFE_PUNCT.contains(&c) || extra.contains(&c)
}

impl Attributes {
    /// Expand comma-separated role and srv lists into their cartesian product
    ///
    /// Roles form the outer loop and services the inner one, both in source
    /// order. Empty list elements are dropped; if either list ends up empty
    /// the result is empty.
    #[must_use]
    pub fn expand(&self) -> Vec<Attributes> {
        let roles = split_list(&self.role);
        let srvs = split_list(&self.srv);

        roles
            .iter()
            .flat_map(|role| srvs.iter().map(move |srv| self.with_role_srv(role, srv)))
            .collect()
    }
}

fn split_list(list: &str) -> Vec<&str> {
    list.split(',').filter(|item| !item.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> AttributeCodec {
        AttributeCodec::new(CodecConfig::default())
    }

    #[test]
    fn test_decode_and_expand_role_list() {
        let expanded = codec()
            .decode_expanded("OS=linux;ENV=prod;ROLE=web,db;SRV=http")
            .unwrap();

        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].role, "web");
        assert_eq!(expanded[1].role, "db");
        for attrs in &expanded {
            assert_eq!(attrs.os, "linux");
            assert_eq!(attrs.env, "prod");
            assert_eq!(attrs.srv, "http");
        }
    }

    #[test]
    fn test_expand_is_role_major() {
        let attrs = Attributes {
            role: "a,b".to_string(),
            srv: "x,y".to_string(),
            ..Default::default()
        };

        let pairs: Vec<(String, String)> = attrs
            .expand()
            .into_iter()
            .map(|a| (a.role, a.srv))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "x".to_string()),
                ("a".to_string(), "y".to_string()),
                ("b".to_string(), "x".to_string()),
                ("b".to_string(), "y".to_string()),
            ]
        );
    }

    #[test]
    fn test_expand_drops_missing_role_or_srv() {
        let no_srv = codec().decode("OS=linux;ROLE=web").unwrap();
        let empty_items = codec().decode("ROLE=,;SRV=http").unwrap();

        assert!(no_srv.expand().is_empty());
        assert!(empty_items.expand().is_empty());
    }

    #[test]
    fn test_missing_env_is_not_an_error() {
        let attrs = codec().decode("OS=linux;ROLE=web;SRV=http").unwrap();

        assert_eq!(attrs.env, "");
    }

    #[test]
    fn test_trailing_separator_is_ignored() {
        let attrs = codec().decode("OS=linux;ROLE=web;SRV=http;").unwrap();

        assert_eq!(attrs.srv, "http");
    }

    #[test]
    fn test_vars_keep_embedded_separators() {
        let attrs = codec()
            .decode("ROLE=web;SRV=http;VARS=port=8080,url=http://repo.local/x")
            .unwrap();

        assert_eq!(attrs.vars, "port=8080,url=http://repo.local/x");
    }

    #[test]
    fn test_unsafe_value_is_rejected() {
        let spaced = codec().decode("OS=lin ux;ROLE=web;SRV=http");
        let embedded_kv = codec().decode("OS=linux;ROLE=web=db;SRV=http");

        assert!(matches!(
            spaced,
            Err(CodecError::Validation { field: "os", .. })
        ));
        assert!(matches!(
            embedded_kv,
            Err(CodecError::Validation { field: "role", .. })
        ));
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let result = codec().decode("OS=linux\n;ROLE=web;SRV=http");

        assert!(matches!(result, Err(CodecError::Validation { .. })));
    }

    #[test]
    fn test_item_without_value_is_malformed() {
        let result = codec().decode("OS=linux;ROLE;SRV=http");

        assert_eq!(
            result,
            Err(CodecError::MalformedEncoding("ROLE".to_string()))
        );
    }

    #[test]
    fn test_unknown_keys() {
        let lenient = codec().decode("OS=linux;COLOR=blue;ROLE=web;SRV=http");
        let strict = AttributeCodec::new(CodecConfig {
            strict_keys: true,
            ..CodecConfig::default()
        })
        .decode("OS=linux;COLOR=blue;ROLE=web;SRV=http");

        assert_eq!(lenient.unwrap().os, "linux");
        assert_eq!(strict, Err(CodecError::UnknownKey("COLOR".to_string())));
    }

    #[test]
    fn test_custom_key_names() {
        let mut config = CodecConfig::default();
        config.keys.role = "R".to_string();
        config.keys.srv = "S".to_string();
        config.field_separator = "|".to_string();

        let expanded = AttributeCodec::new(config).decode_expanded("R=web|S=http").unwrap();

        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].role, "web");
    }

    #[test]
    fn test_decode_vars_first_split_only() {
        let vars = codec().decode_vars("a=1,b=x=y,,c=").unwrap();

        assert_eq!(vars.len(), 3);
        assert_eq!(vars["a"], "1");
        assert_eq!(vars["b"], "x=y");
        assert_eq!(vars["c"], "");
    }

    #[test]
    fn test_decode_vars_into_last_write_wins() {
        let codec = codec();
        let mut vars = BTreeMap::new();

        codec.decode_vars_into("a=1,b=2", &mut vars).unwrap();
        codec.decode_vars_into("b=3", &mut vars).unwrap();

        assert_eq!(vars["a"], "1");
        assert_eq!(vars["b"], "3");
    }

    #[test]
    fn test_decode_vars_malformed_leaves_map_untouched() {
        let codec = codec();
        let mut vars = BTreeMap::new();

        let result = codec.decode_vars_into("a=1,broken", &mut vars);

        assert!(matches!(result, Err(CodecError::MalformedEncoding(_))));
        assert!(vars.is_empty());
    }

    #[test]
    fn test_encode_round_trip() {
        let codec = codec();
        let attrs = Attributes {
            os: "linux".to_string(),
            env: "prod".to_string(),
            role: "web,db".to_string(),
            srv: "http".to_string(),
            vars: "a=1,b=2".to_string(),
        };

        let encoded = codec.encode(&attrs);

        assert_eq!(encoded, "OS=linux;ENV=prod;ROLE=web,db;SRV=http;VARS=a=1,b=2");
        assert_eq!(codec.decode(&encoded).unwrap(), attrs);
    }

    #[test]
    fn test_encode_skips_empty_fields() {
        let attrs = Attributes {
            role: "web".to_string(),
            srv: "http".to_string(),
            ..Default::default()
        };

        assert_eq!(codec().encode(&attrs), "ROLE=web;SRV=http");
    }
}
