//! Record and attribute type definitions

use serde::{Deserialize, Serialize};

// ============================================================================
// Datasource records
// ============================================================================

/// One raw host entry handed from a datasource to the codec
///
/// Produced from one DNS TXT answer or one reassembled etcd value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unqualified hostname without a trailing root dot
    pub hostname: String,
    /// Still-encoded attribute string
    pub attributes: String,
}

impl Record {
    /// Create a new record, stripping any trailing dots from the hostname
    pub fn new(hostname: impl AsRef<str>, attributes: impl Into<String>) -> Self {
        Self {
            hostname: hostname.as_ref().trim_end_matches('.').to_string(),
            attributes: attributes.into(),
        }
    }
}

// ============================================================================
// Host attributes
// ============================================================================

/// Decoded host attribute set
///
/// Before expansion `role` and `srv` may be comma-separated lists.
/// `vars` stays encoded until [`crate::AttributeCodec::decode_vars`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes {
    /// Operating system
    pub os: String,
    /// Environment
    pub env: String,
    /// Host role
    pub role: String,
    /// Service
    pub srv: String,
    /// Encoded host variables
    pub vars: String,
}

impl Attributes {
    /// Copy of these attributes with a single role and srv
    #[must_use]
    pub fn with_role_srv(&self, role: &str, srv: &str) -> Self {
        Self {
            role: role.to_string(),
            srv: srv.to_string(),
            ..self.clone()
        }
    }

    /// Check if the set carries any variables
    #[must_use]
    pub fn has_vars(&self) -> bool {
        !self.vars.is_empty()
    }
}
