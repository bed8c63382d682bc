//! Biological statement model.
//!
//! A serde-deserializable subset of INDRA-style statements, enough for the
//! agents in this workspace: active-form assertions (mutation effects),
//! phosphorylations, and activations. Resource corpora under `resources/`
//! are JSON arrays of [`Statement`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named biological entity with database groundings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BioEntity {
    /// Canonical name (typically an HGNC symbol or FamPlex id).
    pub name: String,

    /// Database references, e.g. `{"HGNC": "1097", "UP": "P15056"}`.
    #[serde(default)]
    pub db_refs: BTreeMap<String, String>,

    /// Mutation conditions on this entity, if any.
    #[serde(default)]
    pub mutations: Vec<MutationCondition>,

    /// Modification conditions on this entity, if any.
    #[serde(default)]
    pub mods: Vec<ModCondition>,
}

impl BioEntity {
    /// Entity with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A single amino-acid substitution, e.g. V600E.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationCondition {
    /// Wild-type residue (one-letter code).
    pub residue_from: String,
    /// Sequence position as written in the source, e.g. "600".
    pub position: String,
    /// Substituted residue (one-letter code).
    pub residue_to: String,
}

impl fmt::Display for MutationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.residue_from, self.position, self.residue_to)
    }
}

/// A post-translational modification condition, e.g. phosphorylation
/// at S222.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModCondition {
    /// Modification type, lowercase, e.g. `phosphorylation`.
    pub mod_type: String,
    /// Modified residue (one-letter code), when known.
    #[serde(default)]
    pub residue: Option<String>,
    /// Sequence position, when known.
    #[serde(default)]
    pub position: Option<String>,
}

/// One piece of evidence supporting a statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evidence {
    /// PubMed identifier, digits only.
    #[serde(default)]
    pub pmid: Option<String>,

    /// Literal sentence the statement was extracted from.
    #[serde(default)]
    pub text: Option<String>,

    /// Source reader or database name.
    #[serde(default)]
    pub source_api: Option<String>,

    /// Identifier within the source database.
    #[serde(default)]
    pub source_id: Option<String>,
}

/// A biological statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    /// An agent in a particular state is (or is not) active.
    ActiveForm {
        agent: BioEntity,
        is_active: bool,
        #[serde(default)]
        evidence: Vec<Evidence>,
    },

    /// Enzyme phosphorylates substrate, optionally at a site.
    Phosphorylation {
        #[serde(default)]
        enz: Option<BioEntity>,
        sub: BioEntity,
        #[serde(default)]
        residue: Option<String>,
        #[serde(default)]
        position: Option<String>,
        #[serde(default)]
        evidence: Vec<Evidence>,
    },

    /// Subject activates (or inhibits) object.
    Activation {
        subj: BioEntity,
        obj: BioEntity,
        is_activation: bool,
        #[serde(default)]
        evidence: Vec<Evidence>,
    },
}

impl Statement {
    /// Evidence list for any statement kind.
    pub fn evidence(&self) -> &[Evidence] {
        match self {
            Self::ActiveForm { evidence, .. }
            | Self::Phosphorylation { evidence, .. }
            | Self::Activation { evidence, .. } => evidence,
        }
    }

    /// English rendering, used as the provenance fallback when an
    /// evidence entry has neither literal text nor a database id.
    pub fn english(&self) -> String {
        match self {
            Self::ActiveForm {
                agent, is_active, ..
            } => {
                let state = if *is_active { "active" } else { "inactive" };
                if agent.mutations.is_empty() {
                    format!("{} is {state}.", agent.name)
                } else {
                    let muts: Vec<String> =
                        agent.mutations.iter().map(|m| m.to_string()).collect();
                    format!("{} with mutation {} is {state}.", agent.name, muts.join("/"))
                }
            }
            Self::Phosphorylation {
                enz,
                sub,
                residue,
                position,
                ..
            } => {
                let site = match (residue, position) {
                    (Some(r), Some(p)) => format!(" on {r}{p}"),
                    (Some(r), None) => format!(" on {r}"),
                    _ => String::new(),
                };
                match enz {
                    Some(enz) => format!("{} phosphorylates {}{site}.", enz.name, sub.name),
                    None => format!("{} is phosphorylated{site}.", sub.name),
                }
            }
            Self::Activation {
                subj,
                obj,
                is_activation,
                ..
            } => {
                let verb = if *is_activation { "activates" } else { "inhibits" };
                format!("{} {verb} {}.", subj.name, obj.name)
            }
        }
    }
}

/// Load a statement corpus from a JSON file.
pub fn load_corpus(path: &std::path::Path) -> Result<Vec<Statement>, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| CorpusError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Error loading a statement corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("could not read corpus {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse corpus {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}
