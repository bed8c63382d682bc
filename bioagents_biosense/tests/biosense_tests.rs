//! BioSense tests over the shipped grounding store.

use std::path::PathBuf;

use bioagents::agent::{Bioagent, ReplyContext, TaskError};
use bioagents_biosense::{BioSenseAgent, BioSenseError, Ontology};
use bioagents_biosense::ontology::GROUNDING_FILE;
use bioagents_kqml::KqmlList;

// ─── Helpers ────────────────────────────────────────────────────────

fn ontology() -> Ontology {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../resources")
        .join(GROUNDING_FILE);
    Ontology::load(&path).expect("grounding store should load")
}

fn agent() -> BioSenseAgent {
    BioSenseAgent::new(ontology())
}

/// Request content with term arguments carried as `(:name "X")` lists.
fn content(task: &str, terms: &[(&str, &str)]) -> KqmlList {
    let mut content = KqmlList::of(task);
    for (key, name) in terms {
        let mut term = KqmlList::new();
        term.sets("name", *name);
        content.set(key, term);
    }
    content
}

fn handle(agent: &mut BioSenseAgent, content: &KqmlList) -> Result<KqmlList, TaskError> {
    let task = content.head().unwrap().to_uppercase();
    let mut cx = ReplyContext::new();
    agent.handle_task(&task, content, &mut cx)
}

fn failure_reason(result: Result<KqmlList, TaskError>) -> String {
    match result {
        Err(TaskError::Failure { reason, .. }) => reason,
        other => panic!("expected failure, got {other:?}"),
    }
}

// ─── Sense queries ──────────────────────────────────────────────────

#[test]
fn test_synonym_lookup_resolves_to_preferred_name() {
    let ont = ontology();
    assert_eq!(ont.choose_sense("B-raf").unwrap().name, "BRAF");
    assert_eq!(ont.choose_sense("mek1").unwrap().name, "MAP2K1");
    assert_eq!(
        ont.choose_sense("nonesuch"),
        Err(BioSenseError::InvalidAgent("nonesuch".to_string()))
    );
}

#[test]
fn test_category_membership() {
    let ont = ontology();
    assert_eq!(ont.choose_sense_category("BRAF", "gene"), Ok(true));
    assert_eq!(ont.choose_sense_category("BRAF", "protein"), Ok(true));
    assert_eq!(ont.choose_sense_category("BRAF", "protein-family"), Ok(false));
    assert_eq!(ont.choose_sense_category("MEK", "protein-family"), Ok(true));
    // ER grounds to ONT::PROTEIN, so it is a protein but not a gene.
    assert_eq!(ont.choose_sense_category("ER", "protein"), Ok(true));
    assert_eq!(ont.choose_sense_category("ER", "gene"), Ok(false));
    assert_eq!(
        ont.choose_sense_category("mTORC1", "macromolecular-complex"),
        Ok(true)
    );
    assert_eq!(
        ont.choose_sense_category("BRAF", "enzyme"),
        Err(BioSenseError::UnknownCategory("enzyme".to_string()))
    );
}

#[test]
fn test_family_and_complex_membership() {
    let ont = ontology();
    assert_eq!(ont.choose_sense_is_member("MAP2K1", "MEK"), Ok(true));
    // Synonyms resolve before the membership test.
    assert_eq!(ont.choose_sense_is_member("ERK2", "ERK"), Ok(true));
    assert_eq!(ont.choose_sense_is_member("BRAF", "MEK"), Ok(false));
    assert_eq!(ont.choose_sense_is_member("RPTOR", "mTORC1"), Ok(true));
    assert_eq!(
        ont.choose_sense_is_member("MAP2K1", "BRAF"),
        Err(BioSenseError::CollectionNotFamilyOrComplex(
            "BRAF".to_string()
        ))
    );
}

#[test]
fn test_what_member_enumerates_grounded_members() {
    let ont = ontology();
    let members = ont.choose_sense_what_member("ERK").unwrap();
    let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["MAPK1", "MAPK3"]);
}

#[test]
fn test_get_synonyms() {
    let ont = ontology();
    let synonyms = ont.get_synonyms("TP53").unwrap();
    assert!(synonyms.contains(&"p53".to_string()));
}

// ─── Task handlers ──────────────────────────────────────────────────

#[test]
fn test_respond_choose_sense_describes_the_entity() {
    let mut agent = agent();
    let msg = handle(&mut agent, &content("CHOOSE-SENSE", &[("agent", "MEK1")])).unwrap();
    assert_eq!(msg.head(), Some("SUCCESS"));
    let agents = msg.get_list("agents").unwrap();
    let desc = agents.nth(0).unwrap().as_list().unwrap();
    assert_eq!(desc.gets("name"), Some("MAP2K1"));
    assert_eq!(desc.gets("ont-type"), Some("ONT::GENE-PROTEIN"));
    assert_eq!(desc.gets("ids"), Some("HGNC:6840|UP:Q02750"));
    // Each id-url is a (:name "db" :dblink "url") pair.
    let urls = desc.get_list("id-urls").unwrap();
    let hgnc = urls.nth(0).unwrap().as_list().unwrap();
    assert_eq!(hgnc.gets("name"), Some("HGNC"));
    assert_eq!(
        hgnc.gets("dblink"),
        Some("https://identifiers.org/hgnc:6840")
    );
    assert!(msg.get("ambiguities").is_none());
}

#[test]
fn test_respond_choose_sense_reports_ambiguity() {
    let mut agent = agent();
    let msg = handle(&mut agent, &content("CHOOSE-SENSE", &[("agent", "ER")])).unwrap();
    // Ambiguities sit beside :agents, not inside the description.
    let desc = msg
        .get_list("agents")
        .unwrap()
        .nth(0)
        .unwrap()
        .as_list()
        .unwrap()
        .clone();
    assert!(desc.get("ambiguities").is_none());
    let ambiguities = msg.get_list("ambiguities").unwrap();
    let amb = ambiguities.nth(0).unwrap().as_list().unwrap();
    assert_eq!(amb.get_list("preferred").unwrap().gets("name"), Some("ESR1"));
    assert_eq!(
        amb.get_list("alternative").unwrap().gets("name"),
        Some("endoplasmic reticulum")
    );
}

#[test]
fn test_respond_choose_sense_category() {
    let mut agent = agent();
    let msg = handle(
        &mut agent,
        &content("CHOOSE-SENSE-CATEGORY", &[("agent", "BRAF"), ("category", "gene")]),
    );
    // The category argument is a bare token, not a term.
    let mut c = content("CHOOSE-SENSE-CATEGORY", &[("agent", "BRAF")]);
    c.set("category", bioagents_kqml::KqmlValue::token("gene"));
    let msg2 = handle(&mut agent, &c).unwrap();
    assert_eq!(msg2.gets("in-category"), Some("TRUE"));
    // A term-shaped category has no text, so it reads as missing.
    assert_eq!(failure_reason(msg), "UNKNOWN_CATEGORY");
}

#[test]
fn test_respond_is_member_and_what_member() {
    let mut agent = agent();
    let msg = handle(
        &mut agent,
        &content(
            "CHOOSE-SENSE-IS-MEMBER",
            &[("agent", "MAPK1"), ("collection", "ERK")],
        ),
    )
    .unwrap();
    assert_eq!(msg.gets("is-member"), Some("TRUE"));

    let msg = handle(
        &mut agent,
        &content("CHOOSE-SENSE-WHAT-MEMBER", &[("collection", "mTORC1")]),
    )
    .unwrap();
    let members = msg.get_list("members").unwrap();
    let names: Vec<&str> = members
        .iter()
        .filter_map(|m| m.as_list().and_then(|l| l.gets("name")))
        .collect();
    assert_eq!(names, vec!["MTOR", "RPTOR", "AKT1S1", "MLST8"]);
}

#[test]
fn test_respond_get_synonyms() {
    let mut agent = agent();
    let msg = handle(&mut agent, &content("GET-SYNONYMS", &[("entity", "TP53")])).unwrap();
    let synonyms = msg.get_list("synonyms").unwrap();
    let names: Vec<&str> = synonyms
        .iter()
        .filter_map(|s| s.as_list().and_then(|l| l.gets("name")))
        .collect();
    assert_eq!(names, vec!["p53", "LFS1"]);
}

#[test]
fn test_failure_reasons() {
    let mut agent = agent();
    assert_eq!(
        failure_reason(handle(
            &mut agent,
            &content("CHOOSE-SENSE", &[("agent", "nonesuch")])
        )),
        "INVALID_AGENT"
    );
    assert_eq!(
        failure_reason(handle(&mut agent, &content("CHOOSE-SENSE", &[]))),
        "INVALID_AGENT"
    );
    assert_eq!(
        failure_reason(handle(
            &mut agent,
            &content("CHOOSE-SENSE-WHAT-MEMBER", &[("collection", "BRAF")])
        )),
        "COLLECTION_NOT_FAMILY_OR_COMPLEX"
    );
}
