//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use bioagents_common::prelude::*;` and get
//! the most important types without listing individual paths.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, FacilitatorConfig, ResourcesConfig, SharedConfig,
};

// ─── Agent contract & runtime ──────────────────────────────────────
pub use crate::agent::{Bioagent, ReplyContext, TaskError, make_failure};
pub use crate::runtime::{AgentError, AgentRuntime, ChannelTransport, TcpTransport, Transport};

// ─── Statements & provenance ───────────────────────────────────────
pub use crate::provenance::send_provenance;
pub use crate::statements::{BioEntity, Evidence, ModCondition, MutationCondition, Statement};

// ─── Watchdog ───────────────────────────────────────────────────────
pub use crate::watchdog::{HealthStatus, ManagedAgent, RestartPolicy, Watchdog, WatchdogError};

// ─── KQML ───────────────────────────────────────────────────────────
pub use bioagents_kqml::{KqmlList, KqmlValue, Performative};

/// Default number of statements rendered in one provenance tell.
pub const DEFAULT_PROVENANCE_LIMIT: usize = 5;
