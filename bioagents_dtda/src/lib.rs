//! # DTDA Disease-Target-Drug Agent
//!
//! Searches for targets known to be implicated in a disease and for drugs
//! known to affect a target directly or indirectly.
//!
//! # Module Structure
//!
//! - [`dtda`] - domain logic: drug-target index, mutation effects,
//!   disease statistics
//! - [`genomics`] - cancer-genomics study access behind the
//!   [`genomics::MutationDatabase`] trait
//! - [`module`] - the KQML-facing agent

pub mod dtda;
pub mod genomics;
pub mod module;

pub use dtda::{Disease, Dtda, DtdaError, MutationEffect};
pub use genomics::{LocalStudyIndex, MutationDatabase};
pub use module::DtdaAgent;
