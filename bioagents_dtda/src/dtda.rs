//! DTDA domain logic.
//!
//! Three knowledge sources, all loaded once at startup and immutable
//! afterwards:
//!
//! - the drug-target table (`drug_targets.tsv`): drug name, synonyms,
//!   nominal target, PubChem CID;
//! - the disease→study map (`disease_studies.tsv`): disease names to
//!   cancer-genomics study prefixes;
//! - the mutation-effect corpus (`mutation_effects.json`): active-form
//!   statements describing what single-residue substitutions do.
//!
//! Study data itself comes through the [`MutationDatabase`] seam.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use bioagents::statements::{CorpusError, Statement, load_corpus};

use crate::genomics::MutationDatabase;

// ─── Errors ─────────────────────────────────────────────────────────

/// Domain-level lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DtdaError {
    /// No row in the drug-target table matched any supplied drug name.
    #[error("drug not found")]
    DrugNotFound,

    /// The disease name maps to no known study.
    #[error("disease not found: {0}")]
    DiseaseNotFound(String),
}

/// Error loading one of the DTDA resource tables.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("{path}:{line}: expected {expected} tab-separated fields")]
    Malformed {
        path: String,
        line: usize,
        expected: usize,
    },

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Studies(#[from] crate::genomics::StudyIndexError),
}

// ─── Drug-target table ──────────────────────────────────────────────

/// One row of the drug-target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugEntry {
    /// Preferred drug name.
    pub name: String,
    /// Alternative names.
    pub synonyms: Vec<String>,
    /// Nominal target gene symbol.
    pub target: String,
    /// PubChem compound id, when known.
    pub pubchem_id: Option<String>,
}

impl DrugEntry {
    /// Case-insensitive substring match over name and synonyms.
    fn matches_drug(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self
                .synonyms
                .iter()
                .any(|s| s.to_lowercase().contains(&query))
    }
}

/// Immutable in-memory drug-target index.
#[derive(Debug, Default)]
pub struct DrugTargetIndex {
    entries: Vec<DrugEntry>,
}

impl DrugTargetIndex {
    /// Load from a TSV file: `name<TAB>synonyms(|)<TAB>target<TAB>cid`.
    ///
    /// Empty lines and `#` comments are skipped; an empty cid column means
    /// no PubChem id.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(StoreError::Malformed {
                    path: path.display().to_string(),
                    line: idx + 1,
                    expected: 4,
                });
            }
            let synonyms = fields[1]
                .split('|')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            entries.push(DrugEntry {
                name: fields[0].to_string(),
                synonyms,
                target: fields[2].to_string(),
                pubchem_id: (!fields[3].is_empty()).then(|| fields[3].to_string()),
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows matching a drug name or synonym.
    pub fn drugs_matching(&self, drug: &str) -> Vec<&DrugEntry> {
        self.entries.iter().filter(|e| e.matches_drug(drug)).collect()
    }

    /// Rows whose nominal target matches `target` (substring,
    /// case-insensitive, mirroring the original `LIKE` lookup).
    pub fn drugs_for_target(&self, target: &str) -> Vec<&DrugEntry> {
        let target = target.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.target.to_lowercase().contains(&target))
            .collect()
    }
}

// ─── Disease → studies ──────────────────────────────────────────────

/// Disease name → study prefixes, keyed case-insensitively.
#[derive(Debug, Default)]
pub struct DiseaseStudyMap {
    prefixes: BTreeMap<String, Vec<String>>,
}

impl DiseaseStudyMap {
    /// Load from a TSV file: `disease<TAB>study_prefix`, one prefix per
    /// line, repeated disease names accumulate.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut prefixes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 2 {
                return Err(StoreError::Malformed {
                    path: path.display().to_string(),
                    line: idx + 1,
                    expected: 2,
                });
            }
            prefixes
                .entry(fields[0].to_lowercase())
                .or_default()
                .push(fields[1].to_string());
        }
        Ok(Self { prefixes })
    }

    /// Study prefixes for a disease name.
    pub fn prefixes_for(&self, disease: &str) -> Option<&[String]> {
        self.prefixes
            .get(&disease.to_lowercase())
            .map(Vec::as_slice)
    }
}

// ─── Mutation effects ───────────────────────────────────────────────

/// Effect of a single-residue substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MutationEffect {
    Activate,
    Deactivate,
}

/// Parsed amino-acid change, e.g. `V600E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AminoAcidChange {
    pub residue_from: char,
    pub position: String,
    pub residue_to: char,
}

impl AminoAcidChange {
    /// Parse the `X123Y` shape; anything else is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() < 3 {
            return None;
        }
        let first = chars[0];
        let last = chars[chars.len() - 1];
        let middle: String = chars[1..chars.len() - 1].iter().collect();
        if !first.is_ascii_uppercase() || !last.is_ascii_uppercase() {
            return None;
        }
        if middle.is_empty() || !middle.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            residue_from: first,
            position: middle,
            residue_to: last,
        })
    }
}

// ─── Statistics ─────────────────────────────────────────────────────

/// Normalised effect fractions for one gene; the three sum to 1 whenever
/// any mutation was observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectFractions {
    pub activate: f64,
    pub deactivate: f64,
    pub other: f64,
}

/// Aggregated mutation statistics for one gene across a disease's studies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeneMutationStats {
    /// Mutated fraction over all sequenced cases.
    pub fraction: f64,
    pub effects: EffectFractions,
}

/// Per-gene statistics, ordered by gene symbol.
pub type MutationStats = BTreeMap<String, GeneMutationStats>;

// ─── Disease ────────────────────────────────────────────────────────

/// A disease as referenced in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disease {
    /// Ontology class, e.g. `cancer`.
    pub disease_type: String,
    pub name: String,
    pub db_refs: BTreeMap<String, String>,
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Disease({}, {}, {:?})", self.disease_type, self.name, self.db_refs)
    }
}

// ─── Gene panels ────────────────────────────────────────────────────

const RTK_SIGNALING: &[&str] = &[
    "EGFR", "ERBB2", "ERBB3", "ERBB4", "PDGFA", "PDGFB", "PDGFRA", "PDGFRB", "KIT", "FGF1",
    "FGFR1", "IGF1", "IGF1R", "VEGFA", "VEGFB", "KDR",
];

const PI3K_SIGNALING: &[&str] = &[
    "PIK3CA", "PIK3R1", "PIK3R2", "PTEN", "PDPK1", "AKT1", "AKT2", "FOXO1", "FOXO3", "MTOR",
    "RICTOR", "TSC1", "TSC2", "RHEB", "AKT1S1", "RPTOR", "MLST8",
];

const MAPK_SIGNALING: &[&str] = &[
    "KRAS", "HRAS", "BRAF", "RAF1", "MAP3K1", "MAP3K2", "MAP3K3", "MAP3K4", "MAP3K5", "MAP2K1",
    "MAP2K2", "MAP2K3", "MAP2K4", "MAP2K5", "MAPK1", "MAPK3", "MAPK4", "MAPK6", "MAPK7", "MAPK8",
    "MAPK9", "MAPK12", "MAPK14", "DAB2", "RASSF1", "RAB25",
];

/// Union of the signalling-pathway gene panels scanned for statistics.
pub fn gene_panel() -> Vec<&'static str> {
    let mut panel = Vec::new();
    panel.extend_from_slice(RTK_SIGNALING);
    panel.extend_from_slice(PI3K_SIGNALING);
    panel.extend_from_slice(MAPK_SIGNALING);
    panel
}

// ─── Dtda ───────────────────────────────────────────────────────────

/// File names expected under the resource directory.
pub const DRUG_TARGETS_FILE: &str = "drug_targets.tsv";
pub const DISEASE_STUDIES_FILE: &str = "disease_studies.tsv";
pub const MUTATION_EFFECTS_FILE: &str = "mutation_effects.json";
pub const STUDY_SNAPSHOT_FILE: &str = "studies.json";

/// Disease-target-drug knowledge base.
pub struct Dtda {
    drugs: DrugTargetIndex,
    diseases: DiseaseStudyMap,
    sub_statements: Vec<Statement>,
    db: Box<dyn MutationDatabase>,
}

impl Dtda {
    /// Build from explicit parts.
    pub fn new(
        drugs: DrugTargetIndex,
        diseases: DiseaseStudyMap,
        sub_statements: Vec<Statement>,
        db: Box<dyn MutationDatabase>,
    ) -> Self {
        info!(
            "loaded {} drug entries and {} mutation effect statements",
            drugs.len(),
            sub_statements.len()
        );
        Self {
            drugs,
            diseases,
            sub_statements,
            db,
        }
    }

    /// Load all resource tables from `dir`, using the local study snapshot
    /// as the mutation database.
    pub fn from_resource_dir(dir: &Path) -> Result<Self, StoreError> {
        let drugs = DrugTargetIndex::load(&dir.join(DRUG_TARGETS_FILE))?;
        let diseases = DiseaseStudyMap::load(&dir.join(DISEASE_STUDIES_FILE))?;
        let sub_statements = load_corpus(&dir.join(MUTATION_EFFECTS_FILE))?;
        let db = crate::genomics::LocalStudyIndex::load(&dir.join(STUDY_SNAPSHOT_FILE))?;
        Ok(Self::new(drugs, diseases, sub_statements, Box::new(db)))
    }

    /// Does any of `drug_names` nominally target `target`?
    ///
    /// # Errors
    ///
    /// `DtdaError::DrugNotFound` when no table row matched any name.
    pub fn is_nominal_drug_target(
        &self,
        drug_names: &[&str],
        target: &str,
    ) -> Result<bool, DtdaError> {
        let mut any_match = false;
        for drug in drug_names {
            for entry in self.drugs.drugs_matching(drug) {
                any_match = true;
                if entry.target.eq_ignore_ascii_case(target) {
                    return Ok(true);
                }
            }
        }
        if any_match { Ok(false) } else { Err(DtdaError::DrugNotFound) }
    }

    /// All drugs that nominally target `target`.
    pub fn find_target_drugs(&self, target: &str) -> Vec<&DrugEntry> {
        self.drugs.drugs_for_target(target)
    }

    /// All nominal targets of `drug`.
    pub fn find_drug_targets(&self, drug: &str) -> Vec<String> {
        self.drugs
            .drugs_matching(drug)
            .into_iter()
            .map(|e| e.target.clone())
            .collect()
    }

    /// Effect of an amino-acid change on a protein, if the corpus has an
    /// active-form statement for exactly that substitution.
    pub fn find_mutation_effect(
        &self,
        protein: &str,
        amino_acid_change: &str,
    ) -> Option<MutationEffect> {
        let change = AminoAcidChange::parse(amino_acid_change)?;
        for stmt in &self.sub_statements {
            let Statement::ActiveForm {
                agent, is_active, ..
            } = stmt
            else {
                continue;
            };
            // Only statements with exactly one mutation are conclusive.
            if agent.mutations.len() != 1 || agent.name != protein {
                continue;
            }
            let m = &agent.mutations[0];
            if m.residue_from == change.residue_from.to_string()
                && m.position == change.position
                && m.residue_to == change.residue_to.to_string()
            {
                return Some(if *is_active {
                    MutationEffect::Activate
                } else {
                    MutationEffect::Deactivate
                });
            }
        }
        None
    }

    /// Study ids for a disease name, deduplicated.
    fn studies_for_disease(&self, disease: &str) -> Option<Vec<String>> {
        let prefixes = self.diseases.prefixes_for(disease)?;
        let mut ids: Vec<String> = prefixes
            .iter()
            .flat_map(|p| self.db.studies(p))
            .collect();
        ids.sort();
        ids.dedup();
        Some(ids)
    }

    /// Aggregate mutation statistics for a disease over the gene panel.
    ///
    /// Per gene: mutated fraction over all sequenced cases and normalised
    /// activate/deactivate/other effect fractions.
    ///
    /// # Errors
    ///
    /// `DtdaError::DiseaseNotFound` when the disease maps to no study.
    pub fn mutation_statistics(
        &self,
        disease: &str,
        mutation_type: &str,
    ) -> Result<MutationStats, DtdaError> {
        let study_ids = self
            .studies_for_disease(disease)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| DtdaError::DiseaseNotFound(disease.to_string()))?;

        let panel = gene_panel();
        let mut num_cases: u64 = 0;
        // gene -> (mutation count, [activate, deactivate, other] counts)
        let mut counts: BTreeMap<String, (u64, [u64; 3])> = BTreeMap::new();

        for study_id in &study_ids {
            num_cases += u64::from(self.db.num_sequenced(study_id));
            for (gene, aa_change) in self.db.mutations(study_id, &panel, mutation_type) {
                let effect_idx = match self.find_mutation_effect(&gene, &aa_change) {
                    Some(MutationEffect::Activate) => 0,
                    Some(MutationEffect::Deactivate) => 1,
                    None => 2,
                };
                let entry = counts.entry(gene).or_insert((0, [0; 3]));
                entry.0 += 1;
                entry.1[effect_idx] += 1;
            }
        }

        let mut stats = MutationStats::new();
        for (gene, (count, effects)) in counts {
            let effect_sum = effects.iter().sum::<u64>() as f64;
            let fraction = if num_cases > 0 {
                count as f64 / num_cases as f64
            } else {
                0.0
            };
            stats.insert(
                gene,
                GeneMutationStats {
                    fraction,
                    effects: EffectFractions {
                        activate: effects[0] as f64 / effect_sum,
                        deactivate: effects[1] as f64 / effect_sum,
                        other: effects[2] as f64 / effect_sum,
                    },
                },
            );
        }
        Ok(stats)
    }

    /// Most frequently mutated panel gene for a disease, with its
    /// prevalence as an integer percentage.
    ///
    /// Returns `Ok(None)` when the studies exist but observed no panel
    /// mutations.
    pub fn top_mutation(&self, disease: &str) -> Result<Option<(String, u32)>, DtdaError> {
        let stats = self.mutation_statistics(disease, "missense")?;
        let top = stats
            .iter()
            .max_by(|a, b| a.1.fraction.total_cmp(&b.1.fraction));
        Ok(top.map(|(gene, s)| (gene.clone(), (s.fraction * 100.0) as u32)))
    }
}
