//! # MSA Mechanism Search Agent
//!
//! Answers mechanistic questions from a statement corpus: whether a
//! modification at a site activates a protein, and which relations the
//! literature reports between two entities. Every positive answer is
//! accompanied by a provenance tell carrying the supporting evidence.
//!
//! # Module Structure
//!
//! - [`corpus`] - statement retrieval behind the
//!   [`corpus::StatementSource`] trait
//! - [`module`] - the KQML-facing agent

pub mod corpus;
pub mod module;

pub use corpus::{LocalCorpus, StatementQuery, StatementSource};
pub use module::MsaAgent;
