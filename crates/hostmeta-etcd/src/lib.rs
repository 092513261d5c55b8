//! hostmeta-etcd: etcd datasource
//!
//! Host attribute sets live under `<namespace>/<zone>/<hostname>/<index>`,
//! one key per set.

pub mod config;
pub mod datasource;
pub mod error;
pub mod store;

pub use config::EtcdConfig;
pub use datasource::EtcdDatasource;
pub use error::EtcdError;
pub use store::{EtcdStore, KvStore};
