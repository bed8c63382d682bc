//! # Bioagents Supervisor
//!
//! Central coordinator for the bioagent system. Spawns the agent
//! binaries, polls their health once a second, restarts dead agents
//! under a bounded backoff policy, and shuts everything down in reverse
//! startup order on Ctrl+C.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tokio::process::{Child, Command};
use tokio::signal;
use tokio::time::{interval, sleep};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bioagents::config::{ConfigError, ConfigLoader, FacilitatorConfig};
use bioagents::watchdog::{
    HealthStatus, ManagedAgent, RestartPolicy, Watchdog, WatchdogError,
};

// ─── Configuration ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WatchdogConfig {
    #[serde(default = "default_max_restarts")]
    max_restarts: u32,
    #[serde(default = "default_restart_backoff_s")]
    restart_backoff_s: f64,
}

fn default_max_restarts() -> u32 {
    3
}

fn default_restart_backoff_s() -> f64 {
    2.0
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            max_restarts: default_max_restarts(),
            restart_backoff_s: default_restart_backoff_s(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Which agents this supervisor manages.
#[derive(Debug, Deserialize)]
struct AgentsConfig {
    #[serde(default = "default_true")]
    dtda: bool,
    #[serde(default = "default_true")]
    biosense: bool,
    #[serde(default = "default_true")]
    msa: bool,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            dtda: true,
            biosense: true,
            msa: true,
        }
    }
}

impl AgentsConfig {
    fn is_enabled(&self, agent: ManagedAgent) -> bool {
        match agent {
            ManagedAgent::Dtda => self.dtda,
            ManagedAgent::BioSense => self.biosense,
            ManagedAgent::Msa => self.msa,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SupervisorConfig {
    #[serde(default)]
    watchdog: WatchdogConfig,
    #[serde(default)]
    facilitator: FacilitatorConfig,
    #[serde(default)]
    agents: AgentsConfig,
}

#[derive(Parser, Debug)]
#[command(name = "bioagents", about = "Bioagents supervisor")]
struct Cli {
    /// Directory containing config.toml and the per-agent configs.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,
}

// ─── Process watchdog ───────────────────────────────────────────────

/// Watchdog over direct child processes.
struct ProcessWatchdog {
    children: HashMap<ManagedAgent, Child>,
    config_dir: PathBuf,
    facilitator: FacilitatorConfig,
}

impl ProcessWatchdog {
    fn new(config_dir: PathBuf, facilitator: FacilitatorConfig) -> Self {
        Self {
            children: HashMap::new(),
            config_dir,
            facilitator,
        }
    }
}

impl Watchdog for ProcessWatchdog {
    fn spawn_agent(
        &mut self,
        agent: ManagedAgent,
        config_dir: &Path,
    ) -> Result<u32, WatchdogError> {
        let child = Command::new(agent.binary_name())
            .arg("--config-dir")
            .arg(config_dir)
            .arg("--host")
            .arg(&self.facilitator.host)
            .arg("--port")
            .arg(self.facilitator.port.to_string())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| WatchdogError::SpawnFailed {
                agent,
                reason: e.to_string(),
            })?;
        let pid = child.id().ok_or_else(|| WatchdogError::SpawnFailed {
            agent,
            reason: "process exited before a pid was assigned".to_string(),
        })?;
        info!("✅ spawned {} (pid {pid})", agent.binary_name());
        self.children.insert(agent, child);
        Ok(pid)
    }

    fn health_check(&mut self, agent: ManagedAgent) -> HealthStatus {
        let Some(child) = self.children.get_mut(&agent) else {
            return HealthStatus::Unknown;
        };
        match child.try_wait() {
            Ok(Some(status)) => HealthStatus::Dead {
                exit_code: status.code(),
            },
            Ok(None) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unknown,
        }
    }

    fn restart_agent(&mut self, agent: ManagedAgent) -> Result<u32, WatchdogError> {
        if let Some(mut child) = self.children.remove(&agent) {
            // Already-dead children are reaped by try_wait; a kill error
            // here means exactly that.
            let _ = child.start_kill();
        }
        let config_dir = self.config_dir.clone();
        self.spawn_agent(agent, &config_dir)
    }

    fn shutdown_all(&mut self) -> Result<(), WatchdogError> {
        for agent in ManagedAgent::all().into_iter().rev() {
            if let Some(mut child) = self.children.remove(&agent) {
                info!("🛑 stopping {}", agent.binary_name());
                if let Err(e) = child.start_kill() {
                    warn!("could not kill {}: {e}", agent.binary_name());
                }
            }
        }
        Ok(())
    }
}

// ─── Supervisor ─────────────────────────────────────────────────────

struct Supervisor<W> {
    watchdog: W,
    policy: RestartPolicy,
    enabled: Vec<ManagedAgent>,
    restarts: HashMap<ManagedAgent, u32>,
}

impl<W: Watchdog> Supervisor<W> {
    fn new(watchdog: W, policy: RestartPolicy, enabled: Vec<ManagedAgent>) -> Self {
        Self {
            watchdog,
            policy,
            enabled,
            restarts: HashMap::new(),
        }
    }

    fn spawn_all(&mut self, config_dir: &Path) -> Result<(), WatchdogError> {
        for agent in &self.enabled {
            self.watchdog.spawn_agent(*agent, config_dir)?;
        }
        Ok(())
    }

    /// Poll agent health once a second, restarting dead agents until the
    /// restart budget runs out.
    async fn run(&mut self) -> Result<(), WatchdogError> {
        let mut heartbeat = interval(Duration::from_secs(1));
        loop {
            heartbeat.tick().await;
            for agent in self.enabled.clone() {
                let HealthStatus::Dead { exit_code } = self.watchdog.health_check(agent) else {
                    continue;
                };
                warn!(
                    "{} died (exit code {exit_code:?})",
                    agent.binary_name()
                );
                let attempt = self.restarts.entry(agent).or_insert(0);
                *attempt += 1;
                let Some(delay) = self.policy.delay_for(*attempt) else {
                    error!("restart budget exhausted for {}", agent.binary_name());
                    return Err(WatchdogError::RestartsExhausted {
                        agent,
                        max: self.policy.max_restarts,
                    });
                };
                info!(
                    "restarting {} in {:.1}s (attempt {attempt})",
                    agent.binary_name(),
                    delay.as_secs_f64()
                );
                sleep(delay).await;
                self.watchdog.restart_agent(agent)?;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    info!("🚀 Starting bioagents supervisor");
    let config = match SupervisorConfig::load(&cli.config_dir.join("config.toml")) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound) => {
            warn!("no config.toml in {:?}, using defaults", cli.config_dir);
            SupervisorConfig {
                watchdog: WatchdogConfig::default(),
                facilitator: FacilitatorConfig::default(),
                agents: AgentsConfig::default(),
            }
        }
        Err(e) => return Err(e.into()),
    };
    config.facilitator.validate()?;

    let enabled: Vec<ManagedAgent> = ManagedAgent::all()
        .into_iter()
        .filter(|a| config.agents.is_enabled(*a))
        .collect();
    info!("managing {} agents", enabled.len());

    let policy = RestartPolicy::new(
        config.watchdog.max_restarts,
        Duration::from_secs_f64(config.watchdog.restart_backoff_s),
    );
    let watchdog = ProcessWatchdog::new(cli.config_dir.clone(), config.facilitator);
    let mut supervisor = Supervisor::new(watchdog, policy, enabled);
    supervisor.spawn_all(&cli.config_dir)?;

    let loop_result = tokio::select! {
        result = supervisor.run() => {
            if let Err(e) = &result {
                error!("supervisor loop error: {e}");
            }
            result
        }
        _ = signal::ctrl_c() => {
            info!("🛑 Received shutdown signal (Ctrl+C)");
            Ok(())
        }
    };

    supervisor.watchdog.shutdown_all()?;

    info!("📊 Restart summary:");
    for agent in &supervisor.enabled {
        let count = supervisor.restarts.get(agent).copied().unwrap_or(0);
        info!("  - {}: {count} restarts", agent.binary_name());
    }
    info!("🏁 Bioagents supervisor shutdown complete");
    loop_result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Watchdog whose children never stay up.
    struct AlwaysDead;

    impl Watchdog for AlwaysDead {
        fn spawn_agent(
            &mut self,
            _agent: ManagedAgent,
            _config_dir: &Path,
        ) -> Result<u32, WatchdogError> {
            Ok(1)
        }

        fn health_check(&mut self, _agent: ManagedAgent) -> HealthStatus {
            HealthStatus::Dead { exit_code: Some(1) }
        }

        fn restart_agent(&mut self, _agent: ManagedAgent) -> Result<u32, WatchdogError> {
            Ok(1)
        }

        fn shutdown_all(&mut self) -> Result<(), WatchdogError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_fails_once_the_restart_budget_is_spent() {
        let policy = RestartPolicy::new(2, Duration::from_secs(2));
        let mut supervisor = Supervisor::new(AlwaysDead, policy, vec![ManagedAgent::Dtda]);
        let err = supervisor.run().await.unwrap_err();
        assert!(matches!(
            err,
            WatchdogError::RestartsExhausted {
                agent: ManagedAgent::Dtda,
                max: 2,
            }
        ));
    }
}
