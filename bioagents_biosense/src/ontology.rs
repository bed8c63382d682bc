//! The grounding store.
//!
//! A flat list of grounded entities loaded from `grounding.json` at
//! startup. Each entry carries a preferred name, an ontological type,
//! database references, synonyms, optionally the members of a family or
//! complex, and optionally an ambiguity record when a name commonly maps
//! to more than one sense.
//!
//! Name lookup is case-insensitive over preferred names and synonyms.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// File name expected under the resource directory.
pub const GROUNDING_FILE: &str = "grounding.json";

// ─── Errors ─────────────────────────────────────────────────────────

/// Domain-level sense query failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BioSenseError {
    /// The name resolves to no grounded entity.
    #[error("invalid agent: {0}")]
    InvalidAgent(String),

    /// The category token is not one the ontology knows.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// The collection name resolves to no grounded entity.
    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    /// The collection exists but has no members.
    #[error("collection is not a family or complex: {0}")]
    CollectionNotFamilyOrComplex(String),
}

/// Error loading the grounding store.
#[derive(Debug, Error)]
pub enum OntologyError {
    #[error("could not read grounding store {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse grounding store {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("duplicate grounding name '{0}'")]
    DuplicateName(String),
}

// ─── Entries ────────────────────────────────────────────────────────

/// A single grounded sense, used both standalone and inside an
/// [`Ambiguity`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SenseRef {
    pub name: String,
    pub ont_type: String,
    #[serde(default)]
    pub db_refs: BTreeMap<String, String>,
}

/// Two senses a name commonly maps to, ranked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ambiguity {
    pub preferred: SenseRef,
    pub alternative: SenseRef,
}

/// One grounded entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroundingEntry {
    /// Preferred name, e.g. a gene symbol.
    pub name: String,
    /// Ontological type, e.g. `ONT::GENE-PROTEIN`.
    pub ont_type: String,
    #[serde(default)]
    pub db_refs: BTreeMap<String, String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Member names, present only for families and complexes.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub ambiguity: Option<Ambiguity>,
}

impl GroundingEntry {
    /// Is this entry a family or complex with members to enumerate?
    pub fn has_members(&self) -> bool {
        !self.members.is_empty()
    }
}

// ─── Ontology ───────────────────────────────────────────────────────

/// In-memory grounding store.
pub struct Ontology {
    entries: Vec<GroundingEntry>,
    /// Lowercased name or synonym → entry index. Preferred names win over
    /// synonyms on collision.
    by_name: HashMap<String, usize>,
}

impl Ontology {
    /// Build from a list of entries.
    pub fn new(entries: Vec<GroundingEntry>) -> Result<Self, OntologyError> {
        let mut by_name = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if by_name.insert(entry.name.to_lowercase(), idx).is_some() {
                return Err(OntologyError::DuplicateName(entry.name.clone()));
            }
        }
        for (idx, entry) in entries.iter().enumerate() {
            for synonym in &entry.synonyms {
                by_name.entry(synonym.to_lowercase()).or_insert(idx);
            }
        }
        info!("loaded {} grounded entities", entries.len());
        Ok(Self { entries, by_name })
    }

    /// Load the store from a JSON file.
    pub fn load(path: &Path) -> Result<Self, OntologyError> {
        let content = std::fs::read_to_string(path).map_err(|e| OntologyError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let entries: Vec<GroundingEntry> =
            serde_json::from_str(&content).map_err(|e| OntologyError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;
        Self::new(entries)
    }

    /// Entry for a name or synonym, case-insensitive.
    pub fn lookup(&self, name: &str) -> Option<&GroundingEntry> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    /// The grounded sense of a name.
    pub fn choose_sense(&self, name: &str) -> Result<&GroundingEntry, BioSenseError> {
        self.lookup(name)
            .ok_or_else(|| BioSenseError::InvalidAgent(name.to_string()))
    }

    /// Does the name's sense fall in `category`?
    ///
    /// Categories: `gene`, `protein`, `gene-protein`, `protein-family`,
    /// `macromolecular-complex`. `ONT::GENE-PROTEIN` counts as both a gene
    /// and a protein.
    pub fn choose_sense_category(
        &self,
        name: &str,
        category: &str,
    ) -> Result<bool, BioSenseError> {
        let entry = self.choose_sense(name)?;
        let matching: &[&str] = match category.to_lowercase().as_str() {
            "gene" => &["ONT::GENE", "ONT::GENE-PROTEIN"],
            "protein" => &["ONT::PROTEIN", "ONT::GENE-PROTEIN"],
            "gene-protein" => &["ONT::GENE-PROTEIN"],
            "protein-family" => &["ONT::PROTEIN-FAMILY"],
            "macromolecular-complex" => &["ONT::MACROMOLECULAR-COMPLEX"],
            _ => return Err(BioSenseError::UnknownCategory(category.to_string())),
        };
        Ok(matching.contains(&entry.ont_type.as_str()))
    }

    /// Resolve a collection name to an entry that has members.
    fn collection(&self, name: &str) -> Result<&GroundingEntry, BioSenseError> {
        let entry = self
            .lookup(name)
            .ok_or_else(|| BioSenseError::InvalidCollection(name.to_string()))?;
        if !entry.has_members() {
            return Err(BioSenseError::CollectionNotFamilyOrComplex(
                entry.name.clone(),
            ));
        }
        Ok(entry)
    }

    /// Is `agent` a member of the family or complex `collection`?
    ///
    /// Membership compares grounded preferred names, so a synonym of a
    /// member counts.
    pub fn choose_sense_is_member(
        &self,
        agent: &str,
        collection: &str,
    ) -> Result<bool, BioSenseError> {
        let agent = self.choose_sense(agent)?;
        let collection = self.collection(collection)?;
        Ok(collection
            .members
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&agent.name)))
    }

    /// The members of a family or complex, as grounded entries where
    /// known.
    pub fn choose_sense_what_member(
        &self,
        collection: &str,
    ) -> Result<Vec<&GroundingEntry>, BioSenseError> {
        let collection = self.collection(collection)?;
        Ok(collection
            .members
            .iter()
            .filter_map(|m| self.lookup(m))
            .collect())
    }

    /// Synonyms of a grounded entity.
    pub fn get_synonyms(&self, name: &str) -> Result<&[String], BioSenseError> {
        Ok(&self.choose_sense(name)?.synonyms)
    }
}
