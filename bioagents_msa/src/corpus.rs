//! Statement retrieval.
//!
//! The agent only ever asks one kind of question: which statements match
//! a subject, an object, and a statement type, any of which may be left
//! open. `StatementSource` captures that contract; [`LocalCorpus`]
//! answers it from a JSON corpus under `resources/`, which keeps the
//! agent runnable and testable offline.

use std::path::Path;

use bioagents::statements::{CorpusError, Statement, load_corpus};

/// File name expected under the resource directory.
pub const MSA_STATEMENTS_FILE: &str = "msa_statements.json";

/// A statement pattern; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct StatementQuery {
    /// Acting entity: the active-form agent, the enzyme, or the
    /// activation subject.
    pub subject: Option<String>,
    /// Acted-on entity: the active-form agent, the substrate, or the
    /// activation object.
    pub object: Option<String>,
    /// Statement type name, e.g. `Phosphorylation`.
    pub stmt_type: Option<String>,
}

impl StatementQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, name: impl Into<String>) -> Self {
        self.subject = Some(name.into());
        self
    }

    pub fn object(mut self, name: impl Into<String>) -> Self {
        self.object = Some(name.into());
        self
    }

    pub fn stmt_type(mut self, name: impl Into<String>) -> Self {
        self.stmt_type = Some(name.into());
        self
    }
}

/// Statement retrieval contract.
pub trait StatementSource: Send {
    /// Statements matching the query, in corpus order.
    fn find_statements(&self, query: &StatementQuery) -> Vec<Statement>;
}

fn type_name(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::ActiveForm { .. } => "ActiveForm",
        Statement::Phosphorylation { .. } => "Phosphorylation",
        Statement::Activation { .. } => "Activation",
    }
}

fn subject_name(stmt: &Statement) -> Option<&str> {
    match stmt {
        Statement::ActiveForm { agent, .. } => Some(&agent.name),
        Statement::Phosphorylation { enz, .. } => enz.as_ref().map(|e| e.name.as_str()),
        Statement::Activation { subj, .. } => Some(&subj.name),
    }
}

fn object_name(stmt: &Statement) -> &str {
    match stmt {
        Statement::ActiveForm { agent, .. } => &agent.name,
        Statement::Phosphorylation { sub, .. } => &sub.name,
        Statement::Activation { obj, .. } => &obj.name,
    }
}

fn matches(stmt: &Statement, query: &StatementQuery) -> bool {
    if let Some(t) = &query.stmt_type {
        if !type_name(stmt).eq_ignore_ascii_case(t) {
            return false;
        }
    }
    if let Some(subject) = &query.subject {
        match subject_name(stmt) {
            Some(name) if name.eq_ignore_ascii_case(subject) => {}
            _ => return false,
        }
    }
    if let Some(object) = &query.object {
        if !object_name(stmt).eq_ignore_ascii_case(object) {
            return false;
        }
    }
    true
}

/// In-memory statement corpus, built once at startup.
pub struct LocalCorpus {
    statements: Vec<Statement>,
}

impl LocalCorpus {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Load a corpus from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        Ok(Self::new(load_corpus(path)?))
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl StatementSource for LocalCorpus {
    fn find_statements(&self, query: &StatementQuery) -> Vec<Statement> {
        self.statements
            .iter()
            .filter(|s| matches(s, query))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioagents::statements::BioEntity;

    fn corpus() -> LocalCorpus {
        LocalCorpus::new(vec![
            Statement::Phosphorylation {
                enz: Some(BioEntity::named("MAP2K1")),
                sub: BioEntity::named("MAPK1"),
                residue: Some("T".to_string()),
                position: Some("185".to_string()),
                evidence: vec![],
            },
            Statement::Phosphorylation {
                enz: None,
                sub: BioEntity::named("MAPK1"),
                residue: None,
                position: None,
                evidence: vec![],
            },
            Statement::Activation {
                subj: BioEntity::named("MAP2K1"),
                obj: BioEntity::named("MAPK1"),
                is_activation: true,
                evidence: vec![],
            },
        ])
    }

    #[test]
    fn test_open_query_matches_everything() {
        assert_eq!(corpus().find_statements(&StatementQuery::new()).len(), 3);
    }

    #[test]
    fn test_subject_query_skips_enzymeless_phosphorylation() {
        let found = corpus().find_statements(&StatementQuery::new().subject("map2k1"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_type_and_object_filters_combine() {
        let query = StatementQuery::new()
            .object("MAPK1")
            .stmt_type("Phosphorylation");
        assert_eq!(corpus().find_statements(&query).len(), 2);

        let query = StatementQuery::new().object("MAPK3");
        assert!(corpus().find_statements(&query).is_empty());
    }
}
