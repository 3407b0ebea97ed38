use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lyssna_capture::{get_hostname, get_interface_addresses};
use lyssna_config::LyssnaConfig;
use lyssna_engine::run_listener;
use lyssna_telemetry::{EventLogger, MetricsRecorder};
use tracing::{debug, warn};

use crate::console::ConsoleSink;

#[derive(Parser)]
#[command(name = "lyssna", version, about)]
pub struct Cli {
    /// Configuration file; defaults to `config/lyssna.yaml` when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture traffic for a host address and print delivered batches
    Listen(ListenArgs),
    /// Print the local host name
    Hostname,
    /// List IPv4 addresses of the local interfaces
    Interfaces,
}

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Numeric IPv4 address: dotted quad, decimal or 0x-prefixed hex
    #[arg(short, long)]
    pub address: String,

    /// Capture on this interface instead of the one owning the address
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Replay a pcap savefile instead of capturing live
    #[arg(short, long)]
    pub replay: Option<PathBuf>,

    /// Deliver packets still queued at shutdown
    #[arg(long)]
    pub flush_on_stop: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the Prometheus exposition after shutdown
    #[arg(long)]
    pub metrics: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per packet
    Text,
    /// One YAML document per batch
    Yaml,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => LyssnaConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LyssnaConfig::load().context("loading configuration")?,
    };
    EventLogger::init(&config.telemetry.log_level);
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Listen(args) => listen(config, args).await,
        Commands::Hostname => {
            println!("{}", get_hostname()?);
            Ok(())
        }
        Commands::Interfaces => {
            for address in get_interface_addresses()? {
                println!("{:<16} {:<15} {:#010x}", address.interface, address.string, address.key);
            }
            Ok(())
        }
    }
}

async fn listen(mut config: LyssnaConfig, args: ListenArgs) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);

    let metrics = Arc::new(MetricsRecorder::new());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
        }
    };

    run_listener(
        &config,
        &args.address,
        ConsoleSink::stdout(args.format),
        metrics.clone(),
        shutdown,
    )
    .await
    .with_context(|| format!("listening on {}", args.address))?;

    if args.metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

fn apply_overrides(config: &mut LyssnaConfig, args: &ListenArgs) {
    if let Some(interface) = &args.interface {
        config.capture.interface = Some(interface.clone());
    }
    if let Some(path) = &args.replay {
        config.capture.mode = "replay".into();
        config.capture.replay_file = Some(path.clone());
    }
    if args.flush_on_stop {
        config.delivery.flush_on_stop = true;
    }
}
