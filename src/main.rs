use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_collector::{
    config::Config, pipeline::PipelineOrchestrator, utils::ReqwestTransport,
};

#[derive(Parser)]
#[command(name = "iptv-collector")]
#[command(version)]
#[command(about = "Collects live-TV channel feeds into a classified playlist")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Output playlist path (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Discover, probe and write the playlist (default)
    Run,
    /// Splice the configured appendix playlist into the existing output file
    AppendFixed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("iptv_collector={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IPTV collector v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(output) = cli.output {
        config.output.path = output;
    }

    let transport = Arc::new(ReqwestTransport::new(&config.http)?);
    let orchestrator = PipelineOrchestrator::new(config, transport);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let report = orchestrator.run().await?;
            info!(
                "Sources: {} fetched, {} failed; candidates: {} seen, {} rejected",
                report.sources_fetched,
                report.sources_failed,
                report.candidates_seen,
                report.candidates_rejected
            );
            info!(
                "Endpoints: {} discovered, {} probed, {} failed",
                report.endpoints_discovered,
                report.endpoints_probed,
                report.endpoints_failed
            );
            info!(
                "Channels: {} tested, {} admitted, {} rejected, {} unique",
                report.channels_tested,
                report.channels_admitted,
                report.channels_rejected,
                report.registry_size
            );
            if report.is_partial() {
                warn!("Run completed with skipped sources or endpoints");
            }
        }
        Command::AppendFixed => {
            let output = orchestrator.config().output.path.display().to_string();
            if orchestrator.append_fixed().await? {
                info!("Appendix written to {}", output);
            }
        }
    }

    Ok(())
}
