//! MSA tests over the shipped statement corpus.
//!
//! Direct handler checks plus one full session over the in-memory
//! transport, asserting the provenance tell accompanies the reply.

use std::path::PathBuf;

use bioagents::agent::{Bioagent, ReplyContext, TaskError};
use bioagents::runtime::{AgentRuntime, ChannelTransport};
use bioagents_kqml::{KqmlList, KqmlValue, Performative};
use bioagents_msa::corpus::MSA_STATEMENTS_FILE;
use bioagents_msa::{LocalCorpus, MsaAgent};

// ─── Helpers ────────────────────────────────────────────────────────

fn corpus() -> LocalCorpus {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../resources")
        .join(MSA_STATEMENTS_FILE);
    LocalCorpus::load(&path).expect("corpus should load")
}

fn agent() -> MsaAgent {
    MsaAgent::new(Box::new(corpus()))
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

fn handle(
    agent: &mut MsaAgent,
    content: &KqmlList,
) -> (Result<KqmlList, TaskError>, Vec<KqmlList>) {
    let task = content.head().unwrap().to_uppercase();
    let mut cx = ReplyContext::new();
    let result = agent.handle_task(&task, content, &mut cx);
    (result, cx.take_tells())
}

fn failure_reason(result: Result<KqmlList, TaskError>) -> String {
    match result {
        Err(TaskError::Failure { reason, .. }) => reason,
        other => panic!("expected failure, got {other:?}"),
    }
}

// ─── Phosphorylation-activating ─────────────────────────────────────

#[test]
fn test_known_activating_site_with_provenance() {
    let mut agent = agent();
    let mut c = content("PHOSPHORYLATION-ACTIVATING", &[("target", "MAP2K1")]);
    c.set("residue", KqmlValue::token("S"));
    c.set("position", KqmlValue::token("222"));
    let (result, tells) = handle(&mut agent, &c);
    assert_eq!(result.unwrap().gets("is-activating"), Some("TRUE"));

    assert_eq!(tells.len(), 1);
    assert_eq!(tells[0].head(), Some("add-provenance"));
    let html = tells[0].gets("html").unwrap();
    assert!(html.contains("8131746"));
    assert!(html.contains("serine 222"));
}

#[test]
fn test_site_without_statements_is_missing_mechanism() {
    let mut agent = agent();
    let mut c = content("PHOSPHORYLATION-ACTIVATING", &[("target", "MAP2K1")]);
    c.set("position", KqmlValue::token("999"));
    let (result, tells) = handle(&mut agent, &c);
    assert_eq!(failure_reason(result), "MISSING_MECHANISM");
    assert!(tells.is_empty());
}

#[test]
fn test_site_may_be_left_unspecified() {
    let mut agent = agent();
    let (result, _) = handle(
        &mut agent,
        &content("PHOSPHORYLATION-ACTIVATING", &[("target", "MAPK1")]),
    );
    assert_eq!(result.unwrap().gets("is-activating"), Some("TRUE"));
}

#[test]
fn test_missing_target_fails() {
    let mut agent = agent();
    let (result, _) = handle(&mut agent, &content("PHOSPHORYLATION-ACTIVATING", &[]));
    assert_eq!(failure_reason(result), "MISSING_TARGET");
}

#[test]
fn test_bogus_mechanism_finds_no_support() {
    let mut agent = agent();
    let mut c = content("BOGUS-ACTIVATING", &[("target", "MAP2K1")]);
    c.set("residue", KqmlValue::token("S"));
    c.set("position", KqmlValue::token("222"));
    let (result, tells) = handle(&mut agent, &c);
    assert_eq!(failure_reason(result), "MISSING_MECHANISM");
    assert!(tells.is_empty());
}

#[test]
fn test_inhibiting_polarity_finds_no_support() {
    let mut agent = agent();
    let mut c = content("PHOSPHORYLATION-INHIBITING", &[("target", "MAP2K1")]);
    c.set("residue", KqmlValue::token("S"));
    c.set("position", KqmlValue::token("222"));
    let (result, _) = handle(&mut agent, &c);
    assert_eq!(failure_reason(result), "MISSING_MECHANISM");
}

#[test]
fn test_head_without_polarity_is_unknown_action() {
    let mut agent = agent();
    let (result, _) = handle(&mut agent, &content("PHOSPHORYLATION", &[("target", "MAP2K1")]));
    assert_eq!(failure_reason(result), "UNKNOWN_ACTION");
}

// ─── Literature relations ───────────────────────────────────────────

#[test]
fn test_find_relations_from_source() {
    let mut agent = agent();
    let (result, tells) = handle(
        &mut agent,
        &content("FIND-RELATIONS-FROM-LITERATURE", &[("source", "BRAF")]),
    );
    assert_eq!(result.unwrap().gets("relations-found"), Some("2"));
    assert_eq!(tells.len(), 1);
}

#[test]
fn test_find_relations_respects_statement_type() {
    let mut agent = agent();
    let mut c = content("FIND-RELATIONS-FROM-LITERATURE", &[("source", "MAP2K1")]);
    c.set("type", KqmlValue::token("Phosphorylation"));
    let (result, _) = handle(&mut agent, &c);
    assert_eq!(result.unwrap().gets("relations-found"), Some("2"));
}

#[test]
fn test_find_relations_with_no_matches_is_missing_mechanism() {
    let mut agent = agent();
    let (result, tells) = handle(
        &mut agent,
        &content("FIND-RELATIONS-FROM-LITERATURE", &[("source", "TP53")]),
    );
    assert_eq!(failure_reason(result), "MISSING_MECHANISM");
    assert!(tells.is_empty());
}

#[test]
fn test_find_relations_requires_an_entity() {
    let mut agent = agent();
    let (result, _) = handle(&mut agent, &content("FIND-RELATIONS-FROM-LITERATURE", &[]));
    assert_eq!(failure_reason(result), "MISSING_TARGET");
}

#[test]
fn test_confirm_relation() {
    let mut agent = agent();
    let (result, tells) = handle(
        &mut agent,
        &content(
            "CONFIRM-RELATION-FROM-LITERATURE",
            &[("source", "MAP2K1"), ("target", "MAPK1")],
        ),
    );
    assert_eq!(result.unwrap().gets("some-relations-found"), Some("TRUE"));
    assert_eq!(tells.len(), 1);

    let (result, tells) = handle(
        &mut agent,
        &content(
            "CONFIRM-RELATION-FROM-LITERATURE",
            &[("source", "MAPK1"), ("target", "MAP2K1")],
        ),
    );
    assert_eq!(result.unwrap().gets("some-relations-found"), Some("FALSE"));
    assert!(tells.is_empty());
}

// ─── Full session ───────────────────────────────────────────────────

#[tokio::test]
async fn test_session_sends_provenance_before_the_reply() {
    let mut c = content("PHOSPHORYLATION-ACTIVATING", &[("target", "MAP2K1")]);
    c.set("residue", KqmlValue::token("S"));
    c.set("position", KqmlValue::token("222"));
    let mut msg = Performative::new("request");
    msg.set("sender", KqmlValue::token("BA"));
    msg.set("reply-with", KqmlValue::token("IO-1"));
    msg.set("content", c);

    let (transport, log) = ChannelTransport::scripted(vec![msg]);
    let mut runtime = AgentRuntime::new(agent(), transport);
    runtime.run().await.expect("session should not error");

    let sent = log.lock().clone();
    let provenance_idx = sent
        .iter()
        .position(|p| {
            p.verb() == "tell"
                && p.get_list("content").map(|c| c.head()) == Some(Some("add-provenance"))
        })
        .expect("provenance tell");
    let reply_idx = sent.iter().position(|p| p.verb() == "reply").unwrap();
    assert!(provenance_idx < reply_idx);
    let reply_content = sent[reply_idx].get_list("content").unwrap();
    assert_eq!(reply_content.gets("is-activating"), Some("TRUE"));
}

#[tokio::test]
async fn test_session_dispatches_sibling_modification_heads() {
    let mut c = content("PHOSPHORYLATION-INHIBITING", &[("target", "MAP2K1")]);
    c.set("residue", KqmlValue::token("S"));
    c.set("position", KqmlValue::token("222"));
    let mut msg = Performative::new("request");
    msg.set("sender", KqmlValue::token("BA"));
    msg.set("reply-with", KqmlValue::token("IO-2"));
    msg.set("content", c);

    let (transport, log) = ChannelTransport::scripted(vec![msg]);
    let mut runtime = AgentRuntime::new(agent(), transport);
    runtime.run().await.expect("session should not error");

    let sent = log.lock().clone();
    let reply = sent.iter().find(|p| p.verb() == "reply").unwrap();
    let reply_content = reply.get_list("content").unwrap();
    assert_eq!(reply_content.head(), Some("FAILURE"));
    assert_eq!(reply_content.gets("reason"), Some("MISSING_MECHANISM"));
}
