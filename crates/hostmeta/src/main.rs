//! hostmeta
//!
//! Reads host metadata from DNS or etcd and prints it as JSON

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use hostmeta_core::{
    AttributeCodec, Attributes, Datasource, HostAttributes, collect_hosts, collect_vars,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod config;
mod factory;

use config::Config;

#[derive(Parser)]
#[command(name = "hostmeta")]
#[command(about = "Host metadata from DNS TXT records or etcd", long_about = None)]
#[command(group(clap::ArgGroup::new("mode").required(true).args(["list", "host"])))]
struct Cli {
    /// Print every host with its attribute sets
    #[arg(long)]
    list: bool,

    /// Print the attribute sets and merged variables of one host
    #[arg(long, value_name = "NAME")]
    host: Option<String>,

    /// Configuration file (overrides the default search path)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

/// Output of `--host`
#[derive(Debug, Serialize)]
struct HostReport {
    host: String,
    attributes: Vec<Attributes>,
    vars: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let codec = AttributeCodec::new(config.txt.clone());
    let datasource = factory::create_datasource(&config).await?;

    let result = match (cli.list, cli.host.as_deref()) {
        (true, _) => list_hosts(datasource.as_ref(), &codec)
            .await
            .and_then(|hosts| to_json(&hosts, cli.pretty)),
        (false, Some(host)) => host_report(datasource.as_ref(), &codec, host)
            .await
            .and_then(|report| to_json(&report, cli.pretty)),
        (false, None) => Err(eyre::eyre!("one of --list or --host is required")),
    };
    datasource.close();

    println!("{}", result?);
    Ok(())
}

async fn list_hosts(datasource: &dyn Datasource, codec: &AttributeCodec) -> Result<HostAttributes> {
    let records = datasource.get_all_records().await?;
    let hosts = collect_hosts(&records, codec);
    tracing::info!(records = records.len(), hosts = hosts.len(), "inventory collected");
    Ok(hosts)
}

async fn host_report(
    datasource: &dyn Datasource,
    codec: &AttributeCodec,
    host: &str,
) -> Result<HostReport> {
    let records = datasource.get_host_records(host).await?;
    let attributes = collect_hosts(&records, codec)
        .into_values()
        .flatten()
        .collect::<Vec<_>>();
    let vars = collect_vars(host, &attributes, codec);

    Ok(HostReport {
        host: host.to_string(),
        attributes,
        vars,
    })
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
