//! hostmeta-core: records, attribute codec and the datasource trait
//!
//! Backend-agnostic half of hostmeta. Datasources produce [`Record`]s, the
//! [`AttributeCodec`] turns them into expanded [`Attributes`].

pub mod codec;
pub mod config;
pub mod datasource;
pub mod error;
pub mod hosts;
pub mod types;

pub use codec::AttributeCodec;
pub use config::{CodecConfig, KeyNames};
pub use datasource::{Datasource, normalize_name, resolve_zone};
pub use error::{CodecError, DatasourceError};
pub use hosts::{HostAttributes, collect_hosts, collect_vars};
pub use types::{Attributes, Record};
