//! TOML configuration for the agent binaries.
//!
//! Each binary declares its own config struct out of the shared sections
//! here ([`SharedConfig`], [`FacilitatorConfig`], [`ResourcesConfig`]) and
//! loads it through [`ConfigLoader`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use bioagents_common::config::{ConfigLoader, SharedConfig, FacilitatorConfig, ConfigError};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct MyAgentConfig {
//!     shared: SharedConfig,
//!     facilitator: FacilitatorConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = MyAgentConfig::load(Path::new("config.toml"))?;
//!     println!("Agent: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// What went wrong while loading a config file.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// The file exists but is not valid TOML for the target struct.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// The file parsed but a field failed its validation rule.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Logging verbosity, written lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string accepted by `tracing_subscriber::EnvFilter`.
    pub const fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// `[shared]` section carried by every agent config.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "dtda"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Agent instance identifier, also the name sent in `(register :name ...)`.
    pub service_name: String,
}

impl SharedConfig {
    /// The service name must be non-empty; it doubles as the KQML
    /// registration name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where to find the KQML facilitator.
///
/// # TOML Example
///
/// ```toml
/// [facilitator]
/// host = "localhost"
/// port = 6200
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorConfig {
    /// Facilitator hostname.
    #[serde(default = "default_host")]
    pub host: String,

    /// Facilitator TCP port. The TRIPS facilitator listens on 6200.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    6200
}

impl Default for FacilitatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl FacilitatorConfig {
    /// Rejects an empty host and port zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "facilitator host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "facilitator port cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where an agent finds its data files.
///
/// # TOML Example
///
/// ```toml
/// [resources]
/// dir = "resources"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Directory holding the agent's resource files.
    #[serde(default = "default_resources_dir")]
    pub dir: std::path::PathBuf,
}

fn default_resources_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("resources")
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            dir: default_resources_dir(),
        }
    }
}

/// TOML file loading for any deserializable config struct.
///
/// A missing file maps to [`ConfigError::FileNotFound`] so callers can
/// fall back to defaults; everything else that goes wrong while reading
/// or decoding is a [`ConfigError::ParseError`].
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and decode the TOML file at `path`.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket impl: any DeserializeOwned struct loads this way.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
