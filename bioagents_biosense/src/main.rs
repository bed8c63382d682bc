//! BioSense agent binary.
//!
//! Loads the grounding store, connects to the facilitator, and serves
//! sense-disambiguation requests until the session ends.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bioagents::config::{ConfigLoader, FacilitatorConfig, ResourcesConfig, SharedConfig};
use bioagents::runtime::{AgentRuntime, TcpTransport};
use bioagents_biosense::{BioSenseAgent, Ontology};
use bioagents_biosense::ontology::GROUNDING_FILE;

#[derive(Debug, Deserialize)]
struct BioSenseConfig {
    shared: SharedConfig,
    #[serde(default)]
    facilitator: FacilitatorConfig,
    #[serde(default)]
    resources: ResourcesConfig,
}

#[derive(Parser, Debug)]
#[command(name = "bioagents_biosense", about = "Entity disambiguation bioagent")]
struct Cli {
    /// Directory containing biosense.toml.
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
    let mut config = BioSenseConfig::load(&cli.config_dir.join("biosense.toml"))?;
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

    info!("BioSense starting...");
    let ontology = Ontology::load(&config.resources.dir.join(GROUNDING_FILE))?;
    let transport =
        TcpTransport::connect(&config.facilitator.host, config.facilitator.port).await?;
    let mut runtime = AgentRuntime::new(BioSenseAgent::new(ontology), transport);
    runtime.run().await?;
    Ok(())
}
