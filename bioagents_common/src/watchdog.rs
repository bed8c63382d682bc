//! # Watchdog Trait
//!
//! Defines the supervisor contract for agent lifecycle management.
//! The `bioagents` binary implements this trait to spawn, monitor,
//! restart, and shut down the agent processes.
//!
//! # Design
//!
//! The trait is deliberately thin. It captures the four core operations
//! any watchdog implementation must provide, without mandating a specific
//! process management strategy (direct child processes, systemd,
//! containers, etc.).

use std::path::Path;
use std::time::Duration;

/// Identifies a managed agent process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedAgent {
    /// Disease-target-drug agent (`bioagents_dtda`).
    Dtda,
    /// Grounding / disambiguation agent (`bioagents_biosense`).
    BioSense,
    /// Mechanism search agent (`bioagents_msa`).
    Msa,
}

impl ManagedAgent {
    /// Name of the binary to spawn for this agent.
    pub const fn binary_name(self) -> &'static str {
        match self {
            Self::Dtda => "bioagents_dtda",
            Self::BioSense => "bioagents_biosense",
            Self::Msa => "bioagents_msa",
        }
    }

    /// All managed agents in startup order.
    pub const fn all() -> [Self; 3] {
        [Self::Dtda, Self::BioSense, Self::Msa]
    }
}

/// Health status returned by [`Watchdog::health_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Agent process is running.
    Healthy,
    /// Agent process has exited.
    Dead {
        /// Exit code if available.
        exit_code: Option<i32>,
    },
    /// Agent was never started or is not being tracked.
    Unknown,
}

/// Error type for watchdog operations.
#[derive(Debug, thiserror::Error)]
pub enum WatchdogError {
    /// Failed to spawn the requested agent.
    #[error("failed to spawn {agent:?}: {reason}")]
    SpawnFailed {
        agent: ManagedAgent,
        reason: String,
    },

    /// Maximum restart attempts exhausted.
    #[error("max restarts ({max}) exhausted for {agent:?}")]
    RestartsExhausted { agent: ManagedAgent, max: u32 },

    /// Generic I/O or system error.
    #[error("watchdog error: {0}")]
    Other(String),
}

/// Bounded restart policy with linear backoff.
#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    /// Restart attempts allowed per agent before giving up.
    pub max_restarts: u32,
    /// Base delay; attempt N waits N times this.
    pub backoff: Duration,
}

impl RestartPolicy {
    pub fn new(max_restarts: u32, backoff: Duration) -> Self {
        Self {
            max_restarts,
            backoff,
        }
    }

    /// Delay before restart attempt `attempt` (1-based), or `None` when
    /// the attempt budget is exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_restarts {
            return None;
        }
        Some(self.backoff * attempt)
    }
}

/// Supervisor contract for bioagent process lifecycle management.
///
/// Implementors manage child process spawning, health monitoring,
/// restart with backoff, and coordinated shutdown.
pub trait Watchdog {
    /// Spawn an agent process.
    ///
    /// Returns the OS PID of the spawned process on success.
    /// The implementation should forward `config_dir` to the child
    /// via `--config-dir` CLI argument.
    fn spawn_agent(&mut self, agent: ManagedAgent, config_dir: &Path)
    -> Result<u32, WatchdogError>;

    /// Query the health of a managed agent.
    fn health_check(&mut self, agent: ManagedAgent) -> HealthStatus;

    /// Restart an agent that has died.
    ///
    /// The implementation should:
    /// 1. Reap the existing process (if still tracked).
    /// 2. Re-spawn with the same config.
    /// 3. Return the new PID.
    fn restart_agent(&mut self, agent: ManagedAgent) -> Result<u32, WatchdogError>;

    /// Shut down all managed agents in reverse-startup order.
    fn shutdown_all(&mut self) -> Result<(), WatchdogError>;
}
