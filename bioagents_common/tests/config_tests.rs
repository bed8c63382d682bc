//! Config loading tests.
//!
//! Tests for `ConfigLoader`: file discovery, parse errors vs validation
//! errors, defaults for the facilitator section.

use bioagents_common::config::{
    ConfigError, ConfigLoader, FacilitatorConfig, LogLevel, SharedConfig,
};
use serde::Deserialize;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct AgentConfig {
    shared: SharedConfig,
    #[serde(default)]
    facilitator: FacilitatorConfig,
}

impl AgentConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.facilitator.validate()
    }
}

#[test]
fn test_load_full_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[shared]
log_level = "debug"
service_name = "dtda"

[facilitator]
host = "trips.example.org"
port = 6201
"#,
    )
    .unwrap();

    let config = AgentConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "dtda");
    assert_eq!(config.facilitator.host, "trips.example.org");
    assert_eq!(config.facilitator.port, 6201);
}

#[test]
fn test_missing_facilitator_section_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[shared]
service_name = "biosense"
"#,
    )
    .unwrap();

    let config = AgentConfig::load(&path).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Info);
    assert_eq!(config.facilitator.host, "localhost");
    assert_eq!(config.facilitator.port, 6200);
}

#[test]
fn test_missing_file_is_file_not_found() {
    let dir = TempDir::new().unwrap();
    let err = AgentConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[shared\nservice_name = ").unwrap();
    let err = AgentConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_empty_service_name_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[shared]
service_name = ""
"#,
    )
    .unwrap();
    let config = AgentConfig::load(&path).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
