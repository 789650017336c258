//! `oshub` command line client for the Open Supply Hub API.
//!
//! Run with: `oshub <command>`
//!
//! Results are written to stdout as JSON so they can be piped into other
//! tools; logs go to stderr and are filtered with `RUST_LOG`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use oshub_core::{BulkOptions, BulkSummary, ColumnMapping};
use oshub_domain::{ClientConfig, Row};
use oshub_infra::{config, OshClient};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "oshub",
    version,
    about = "Open Supply Hub client.",
    after_help = "Credentials come from OSH_URL / OSH_TOKEN, ./.env.yml or oshub.{json,toml}."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
    /// Check the API is reachable.
    Health,
    /// List country codes and names.
    Countries,
    /// List sectors.
    Sectors,
    /// Show one facility.
    Facility {
        /// OS ID of the facility.
        os_id: String,
        /// Add a `<field>_extended` column for every extended field.
        #[arg(long, default_value_t = false)]
        extended: bool,
    },
    /// Upload a JSON array of facility records.
    Bulk(BulkArgs),
}

#[derive(Debug, PartialEq, Args)]
struct BulkArgs {
    /// JSON file holding an array of record objects.
    input: PathBuf,

    /// Strip N/A placeholders and stray separators before submitting.
    #[arg(long, default_value_t = false)]
    cleanse: bool,

    /// Create facilities the dry run reports as unmatched.
    #[arg(long, default_value_t = false)]
    auto_create: bool,

    /// Rename an input column before submission (repeatable).
    #[arg(long = "map", value_name = "SRC=DST", value_parser = ColumnMapping::parse_pair)]
    mappings: Vec<(String, String)>,
}

impl BulkArgs {
    fn options(&self) -> BulkOptions {
        let mut column_mapping = ColumnMapping::default();
        for (source, target) in &self.mappings {
            column_mapping.insert(source.clone(), target.clone());
        }
        BulkOptions { cleanse: self.cleanse, auto_create: self.auto_create, column_mapping }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let cli = Cli::parse();
    match run(cli.cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("oshub failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

async fn connect() -> anyhow::Result<OshClient> {
    let config = config::load().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "no config found, using defaults");
        ClientConfig::default()
    });
    Ok(OshClient::connect(config).await?)
}

async fn run(command: Command) -> anyhow::Result<()> {
    let client = connect().await?;

    match command {
        Command::Health => {
            let healthy = client.health_check().await?;
            print_json(&serde_json::json!({
                "url": client.config().credentials.base_url,
                "healthy": healthy,
            }))?;
            if !healthy {
                bail!("{} is not healthy", client.config().credentials.base_url);
            }
        }
        Command::Countries => print_rows(&client.get_countries().await?)?,
        Command::Sectors => print_rows(&client.get_sectors().await?)?,
        Command::Facility { os_id, extended } => {
            let row = client.get_facility(&os_id, extended).await?;
            print_json(&Value::Object(row))?;
        }
        Command::Bulk(args) => {
            let options = args.options();
            let records = read_records(&args.input)?;
            let rows = client.bulk_submit(records, &options).await;
            let summary = BulkSummary::from_rows(&rows);
            print_rows(&rows)?;
            eprintln!(
                "{} records: {} new, {} matched, {} potential, {} errors, {} timeouts",
                summary.total,
                summary.new_facility,
                summary.matched,
                summary.potential_match,
                summary.error,
                summary.timeout
            );
        }
    }

    tracing::debug!(api_calls = client.api_call_count(), "done");
    Ok(())
}

fn read_records(path: &Path) -> anyhow::Result<Vec<Row>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let items = value.as_array().ok_or_else(|| anyhow!("{} must hold a JSON array", path.display()))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().cloned().ok_or_else(|| anyhow!("record {index} is not a JSON object"))
        })
        .collect()
}

fn print_rows(rows: &[Row]) -> anyhow::Result<()> {
    print_json(&Value::Array(rows.iter().cloned().map(Value::Object).collect()))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
