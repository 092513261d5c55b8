//! hostmeta-dns: DNS datasource
//!
//! Reads host attribute TXT records through zone transfers (optionally TSIG
//! signed and verified) or, where AXFR is disallowed, from a per-zone
//! sentinel record.

pub mod config;
pub mod datasource;
pub mod error;
pub mod transport;
pub mod tsig;

pub use config::{DnsConfig, NoTransferConfig, TsigConfig};
pub use datasource::{DnsDatasource, make_fqdn};
pub use error::DnsError;
pub use transport::{DnsTransport, TcpUdpTransport};
pub use tsig::{TsigKey, TsigSequence, normalize_algorithm};
