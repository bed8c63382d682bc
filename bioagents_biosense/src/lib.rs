//! # BioSense Entity Disambiguation Agent
//!
//! Resolves biological entity names to grounded senses: database
//! references, ontological category, family/complex membership, and
//! synonyms.
//!
//! # Module Structure
//!
//! - [`ontology`] - the grounding store and sense queries
//! - [`module`] - the KQML-facing agent

pub mod module;
pub mod ontology;

pub use module::BioSenseAgent;
pub use ontology::{BioSenseError, GroundingEntry, Ontology};
