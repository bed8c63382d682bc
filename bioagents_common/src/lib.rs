//! # Bioagents Common Library
//!
//! Shared building blocks for all bioagent crates: the agent contract and
//! its runtime, transports, configuration loading, the biological
//! statement model, provenance rendering, and the supervisor's watchdog
//! contract.
//!
//! # Module Structure
//!
//! - [`agent`] - `Bioagent` trait, task errors, failure content
//! - [`runtime`] - facilitator session: register, subscribe, dispatch, reply
//! - [`config`] - TOML configuration loading traits and types
//! - [`statements`] - INDRA-style biological statement subset
//! - [`provenance`] - evidence HTML for `add-provenance` tells
//! - [`watchdog`] - supervisor contract for agent lifecycle management
//! - [`prelude`] - common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! bioagents = { package = "bioagents_common", path = "../bioagents_common" }
//! ```

pub mod agent;
pub mod config;
pub mod prelude;
pub mod provenance;
pub mod runtime;
pub mod statements;
pub mod watchdog;
