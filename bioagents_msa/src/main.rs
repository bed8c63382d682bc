//! MSA agent binary.
//!
//! Loads the statement corpus, connects to the facilitator, and serves
//! mechanism-search requests until the session ends.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bioagents::config::{ConfigLoader, FacilitatorConfig, ResourcesConfig, SharedConfig};
use bioagents::runtime::{AgentRuntime, TcpTransport};
use bioagents_msa::corpus::MSA_STATEMENTS_FILE;
use bioagents_msa::{LocalCorpus, MsaAgent};

#[derive(Debug, Deserialize)]
struct MsaConfig {
    shared: SharedConfig,
    #[serde(default)]
    facilitator: FacilitatorConfig,
    #[serde(default)]
    resources: ResourcesConfig,
}

#[derive(Parser, Debug)]
#[command(name = "bioagents_msa", about = "Mechanism search bioagent")]
struct Cli {
    /// Directory containing msa.toml.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Facilitator host override.
    #[arg(long)]
    host: Option<String>,

    /// Facilitator port override.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = MsaConfig::load(&cli.config_dir.join("msa.toml"))?;
    config.shared.validate()?;
    if let Some(host) = cli.host {
        config.facilitator.host = host;
    }
    if let Some(port) = cli.port {
        config.facilitator.port = port;
    }
    config.facilitator.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.shared.log_level.as_filter_str())),
        )
        .compact()
        .init();

    info!("MSA starting...");
    let corpus = LocalCorpus::load(&config.resources.dir.join(MSA_STATEMENTS_FILE))?;
    let transport =
        TcpTransport::connect(&config.facilitator.host, config.facilitator.port).await?;
    let mut runtime = AgentRuntime::new(MsaAgent::new(Box::new(corpus)), transport);
    runtime.run().await?;
    Ok(())
}
