//! The KQML-facing BioSense agent.
//!
//! Tasks and reply contents:
//!
//! | Task                      | Arguments               | Success content                      |
//! |---------------------------|-------------------------|--------------------------------------|
//! | `CHOOSE-SENSE`            | `:agent`                | `(SUCCESS :agents ((desc)) [:ambiguities (...)])` |
//! | `CHOOSE-SENSE-CATEGORY`   | `:agent`, `:category`   | `(SUCCESS :in-category TRUE\|FALSE)` |
//! | `CHOOSE-SENSE-IS-MEMBER`  | `:agent`, `:collection` | `(SUCCESS :is-member TRUE\|FALSE)`   |
//! | `CHOOSE-SENSE-WHAT-MEMBER`| `:collection`           | `(SUCCESS :members ((desc)...))`     |
//! | `GET-SYNONYMS`            | `:entity`               | `(SUCCESS :synonyms ((:name S)...))` |
//!
//! A desc is `(:name "X" :ont-type ONT::T :ids "DB:ID|DB:ID" :id-urls
//! ((:name "db" :dblink "url")...))`. When the resolved name is known to
//! be ambiguous, `:ambiguities` sits beside `:agents` in the
//! `CHOOSE-SENSE` reply. Failure reasons: `INVALID_AGENT`,
//! `UNKNOWN_CATEGORY`, `INVALID_COLLECTION`,
//! `COLLECTION_NOT_FAMILY_OR_COMPLEX`.

use std::collections::BTreeMap;

use tracing::debug;

use bioagents::agent::{Bioagent, ReplyContext, TaskError};
use bioagents_kqml::{KqmlList, KqmlValue};

use crate::ontology::{Ambiguity, BioSenseError, GroundingEntry, Ontology, SenseRef};

const TASKS: &[&str] = &[
    "CHOOSE-SENSE",
    "CHOOSE-SENSE-CATEGORY",
    "CHOOSE-SENSE-IS-MEMBER",
    "CHOOSE-SENSE-WHAT-MEMBER",
    "GET-SYNONYMS",
];

/// Entity disambiguation agent.
pub struct BioSenseAgent {
    ontology: Ontology,
}

impl BioSenseAgent {
    pub fn new(ontology: Ontology) -> Self {
        Self { ontology }
    }

    fn respond_choose_sense(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let name =
            term_name(content, "agent").ok_or_else(|| TaskError::failure("INVALID_AGENT"))?;
        let entry = self.ontology.choose_sense(&name).map_err(failure)?;
        debug!("resolved '{name}' to {}", entry.name);
        let mut agents = KqmlList::new();
        agents.push(describe_entry(entry));
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("agents", agents);
        if let Some(ambiguity) = &entry.ambiguity {
            let mut ambiguities = KqmlList::new();
            ambiguities.push(describe_ambiguity(ambiguity));
            msg.set("ambiguities", ambiguities);
        }
        Ok(msg)
    }

    fn respond_choose_sense_category(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let name =
            term_name(content, "agent").ok_or_else(|| TaskError::failure("INVALID_AGENT"))?;
        let category = content
            .gets("category")
            .ok_or_else(|| TaskError::failure("UNKNOWN_CATEGORY"))?;
        let in_category = self
            .ontology
            .choose_sense_category(&name, category)
            .map_err(failure)?;
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("in-category", bool_token(in_category));
        Ok(msg)
    }

    fn respond_choose_sense_is_member(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let agent =
            term_name(content, "agent").ok_or_else(|| TaskError::failure("INVALID_AGENT"))?;
        let collection = term_name(content, "collection")
            .ok_or_else(|| TaskError::failure("INVALID_COLLECTION"))?;
        let is_member = self
            .ontology
            .choose_sense_is_member(&agent, &collection)
            .map_err(failure)?;
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("is-member", bool_token(is_member));
        Ok(msg)
    }

    fn respond_choose_sense_what_member(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let collection = term_name(content, "collection")
            .ok_or_else(|| TaskError::failure("INVALID_COLLECTION"))?;
        let members = self
            .ontology
            .choose_sense_what_member(&collection)
            .map_err(failure)?;
        let mut list = KqmlList::new();
        for member in members {
            list.push(describe_entry(member));
        }
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("members", list);
        Ok(msg)
    }

    fn respond_get_synonyms(&self, content: &KqmlList) -> Result<KqmlList, TaskError> {
        let name =
            term_name(content, "entity").ok_or_else(|| TaskError::failure("INVALID_AGENT"))?;
        let synonyms = self.ontology.get_synonyms(&name).map_err(failure)?;
        let mut list = KqmlList::new();
        for synonym in synonyms {
            let mut item = KqmlList::new();
            item.sets("name", synonym.clone());
            list.push(item);
        }
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("synonyms", list);
        Ok(msg)
    }
}

impl Bioagent for BioSenseAgent {
    fn name(&self) -> &str {
        "BIOSENSE"
    }

    fn tasks(&self) -> &[&str] {
        TASKS
    }

    fn handle_task(
        &mut self,
        task: &str,
        content: &KqmlList,
        _cx: &mut ReplyContext,
    ) -> Result<KqmlList, TaskError> {
        match task {
            "CHOOSE-SENSE" => self.respond_choose_sense(content),
            "CHOOSE-SENSE-CATEGORY" => self.respond_choose_sense_category(content),
            "CHOOSE-SENSE-IS-MEMBER" => self.respond_choose_sense_is_member(content),
            "CHOOSE-SENSE-WHAT-MEMBER" => self.respond_choose_sense_what_member(content),
            "GET-SYNONYMS" => self.respond_get_synonyms(content),
            other => Err(TaskError::Internal(format!("unhandled task {other}"))),
        }
    }
}

// ─── Rendering ──────────────────────────────────────────────────────

fn failure(err: BioSenseError) -> TaskError {
    let (reason, detail) = match err {
        BioSenseError::InvalidAgent(name) => ("INVALID_AGENT", name),
        BioSenseError::UnknownCategory(cat) => ("UNKNOWN_CATEGORY", cat),
        BioSenseError::InvalidCollection(name) => ("INVALID_COLLECTION", name),
        BioSenseError::CollectionNotFamilyOrComplex(name) => {
            ("COLLECTION_NOT_FAMILY_OR_COMPLEX", name)
        }
    };
    TaskError::failure_with(reason, detail)
}

/// `DB:ID|DB:ID` in database order.
fn joined_ids(db_refs: &BTreeMap<String, String>) -> String {
    db_refs
        .iter()
        .map(|(db, id)| format!("{db}:{id}"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Resolvable URL for a database reference, where a resolver exists.
fn id_url(db: &str, id: &str) -> Option<String> {
    match db {
        "HGNC" => Some(format!("https://identifiers.org/hgnc:{id}")),
        "UP" => Some(format!("https://identifiers.org/uniprot:{id}")),
        "FPLX" => Some(format!("https://identifiers.org/fplx:{id}")),
        "GO" => Some(format!("https://identifiers.org/{id}")),
        _ => None,
    }
}

fn describe_sense(name: &str, ont_type: &str, db_refs: &BTreeMap<String, String>) -> KqmlList {
    let mut desc = KqmlList::new();
    desc.sets("name", name);
    desc.set("ont-type", KqmlValue::token(ont_type));
    desc.sets("ids", joined_ids(db_refs));
    let mut urls = KqmlList::new();
    for (db, id) in db_refs {
        if let Some(url) = id_url(db, id) {
            let mut pair = KqmlList::new();
            pair.sets("name", db.clone());
            pair.sets("dblink", url);
            urls.push(pair);
        }
    }
    desc.set("id-urls", urls);
    desc
}

fn describe_ref(sense: &SenseRef) -> KqmlList {
    describe_sense(&sense.name, &sense.ont_type, &sense.db_refs)
}

fn describe_ambiguity(ambiguity: &Ambiguity) -> KqmlList {
    let mut amb = KqmlList::new();
    amb.set("preferred", describe_ref(&ambiguity.preferred));
    amb.set("alternative", describe_ref(&ambiguity.alternative));
    amb
}

fn describe_entry(entry: &GroundingEntry) -> KqmlList {
    describe_sense(&entry.name, &entry.ont_type, &entry.db_refs)
}

/// Extract a term's name: `(:name X ...)`, or a bare token/string.
fn term_name(content: &KqmlList, key: &str) -> Option<String> {
    match content.get(key)? {
        KqmlValue::List(term) => term.gets("name").map(str::to_string),
        other => other.text().map(str::to_string),
    }
    .filter(|name| !name.is_empty())
}

fn bool_token(value: bool) -> KqmlValue {
    KqmlValue::token(if value { "TRUE" } else { "FALSE" })
}
