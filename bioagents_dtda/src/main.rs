//! DTDA agent binary.
//!
//! Loads the drug-target, disease-study, and mutation-effect resources,
//! connects to the facilitator, and serves DTDA requests until the
//! session ends.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bioagents::config::{ConfigLoader, FacilitatorConfig, ResourcesConfig, SharedConfig};
use bioagents::runtime::{AgentRuntime, TcpTransport};
use bioagents_dtda::{Dtda, DtdaAgent};

#[derive(Debug, Deserialize)]
struct DtdaConfig {
    shared: SharedConfig,
    #[serde(default)]
    facilitator: FacilitatorConfig,
    #[serde(default)]
    resources: ResourcesConfig,
}

#[derive(Parser, Debug)]
#[command(name = "bioagents_dtda", about = "Disease-target-drug bioagent")]
struct Cli {
    /// Directory containing dtda.toml.
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
    let mut config = DtdaConfig::load(&cli.config_dir.join("dtda.toml"))?;
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

    info!("DTDA starting...");
    let dtda = Dtda::from_resource_dir(&config.resources.dir)?;
    let transport =
        TcpTransport::connect(&config.facilitator.host, config.facilitator.port).await?;
    let mut runtime = AgentRuntime::new(DtdaAgent::new(dtda), transport);
    runtime.run().await?;
    Ok(())
}
