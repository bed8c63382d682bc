//! Cancer-genomics study access.
//!
//! The statistics code only needs three queries: which studies exist for a
//! disease prefix, how many cases a study sequenced, and which mutations a
//! study observed in a gene panel. `MutationDatabase` captures that
//! contract; [`LocalStudyIndex`] answers it from a JSON snapshot under
//! `resources/`, which keeps the agent runnable and testable offline.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// One observed mutation in a study.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservedMutation {
    /// Gene symbol.
    pub gene: String,
    /// Amino-acid change as written, e.g. `V600E`.
    pub amino_acid_change: String,
    /// Mutation type, e.g. `missense`.
    pub mutation_type: String,
}

/// Study access contract.
pub trait MutationDatabase: Send {
    /// Study ids whose name starts with `prefix`.
    fn studies(&self, prefix: &str) -> Vec<String>;

    /// Number of sequenced cases in a study; 0 for unknown studies.
    fn num_sequenced(&self, study_id: &str) -> u32;

    /// Observed `(gene, amino_acid_change)` pairs of the given type,
    /// restricted to `genes`.
    fn mutations(&self, study_id: &str, genes: &[&str], mutation_type: &str)
    -> Vec<(String, String)>;
}

#[derive(Debug, Deserialize)]
struct StudyRecord {
    study_id: String,
    num_sequenced: u32,
    #[serde(default)]
    mutations: Vec<ObservedMutation>,
}

#[derive(Debug, Deserialize)]
struct StudyFile {
    studies: Vec<StudyRecord>,
}

/// Error loading the local study snapshot.
#[derive(Debug, Error)]
pub enum StudyIndexError {
    #[error("could not read study snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse study snapshot {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("duplicate study id '{0}' in snapshot")]
    DuplicateStudy(String),
}

/// In-memory study snapshot, built once at startup.
pub struct LocalStudyIndex {
    studies: HashMap<String, StudyRecord>,
}

impl LocalStudyIndex {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StudyIndexError> {
        let content = std::fs::read_to_string(path).map_err(|e| StudyIndexError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: StudyFile =
            serde_json::from_str(&content).map_err(|e| StudyIndexError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;

        let mut studies = HashMap::new();
        for record in file.studies {
            let id = record.study_id.clone();
            if studies.insert(id.clone(), record).is_some() {
                return Err(StudyIndexError::DuplicateStudy(id));
            }
        }
        Ok(Self { studies })
    }
}

impl MutationDatabase for LocalStudyIndex {
    fn studies(&self, prefix: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .studies
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn num_sequenced(&self, study_id: &str) -> u32 {
        self.studies.get(study_id).map_or(0, |s| s.num_sequenced)
    }

    fn mutations(
        &self,
        study_id: &str,
        genes: &[&str],
        mutation_type: &str,
    ) -> Vec<(String, String)> {
        let Some(study) = self.studies.get(study_id) else {
            return Vec::new();
        };
        study
            .mutations
            .iter()
            .filter(|m| m.mutation_type == mutation_type && genes.contains(&m.gene.as_str()))
            .map(|m| (m.gene.clone(), m.amino_acid_change.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn snapshot() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"studies": [
              {{"study_id": "skcm_tcga", "num_sequenced": 4,
                "mutations": [
                  {{"gene": "BRAF", "amino_acid_change": "V600E", "mutation_type": "missense"}},
                  {{"gene": "NRAS", "amino_acid_change": "Q61K", "mutation_type": "missense"}}
                ]}},
              {{"study_id": "paad_tcga", "num_sequenced": 2, "mutations": []}}
            ]}}"#
        )
        .unwrap();
        f
    }

    #[test]
    fn test_prefix_lookup_and_counts() {
        let index = LocalStudyIndex::load(snapshot().path()).unwrap();
        assert_eq!(index.studies("skcm"), vec!["skcm_tcga".to_string()]);
        assert!(index.studies("luad").is_empty());
        assert_eq!(index.num_sequenced("skcm_tcga"), 4);
        assert_eq!(index.num_sequenced("missing"), 0);
    }

    #[test]
    fn test_mutations_respect_gene_panel_and_type() {
        let index = LocalStudyIndex::load(snapshot().path()).unwrap();
        let muts = index.mutations("skcm_tcga", &["BRAF"], "missense");
        assert_eq!(muts, vec![("BRAF".to_string(), "V600E".to_string())]);
        assert!(index.mutations("skcm_tcga", &["BRAF"], "nonsense").is_empty());
    }
}
