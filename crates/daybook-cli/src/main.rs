use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use daybook_client::ResilientReportClient;
use daybook_core::ReportBrowser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Command;
use config::DaybookConfig;

#[derive(Debug, Parser)]
#[command(name = "daybook")]
#[command(about = "Browse and edit dated reports")]
struct Cli {
    /// YAML file with `client` and `view` sections
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `client.base_url`
    #[arg(long)]
    base_url: Option<String>,
    /// Overrides `view.report_type`
    #[arg(long = "type")]
    report_type: Option<String>,
    /// Confirmation phrase for edits and deletes, when the view requires one
    #[arg(long)]
    confirm: Option<String>,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<DaybookConfig> {
    let config = match &cli.config {
        Some(path) => DaybookConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DaybookConfig::default(),
    };
    let config = config
        .with_overrides(cli.base_url.clone(), cli.report_type.clone())
        .context("invalid configuration")?;
    config.require_report_type()?;
    Ok(config)
}

fn emit_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let client = ResilientReportClient::new(config.client).context("invalid client configuration")?;
    let mut browser = ReportBrowser::new(client, config.view);
    browser.load().await.context("failed to load reports")?;

    let output = commands::execute(&mut browser, cli.command, cli.confirm.as_deref()).await?;
    emit_json(&output)
}
