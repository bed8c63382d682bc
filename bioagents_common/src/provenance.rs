//! Provenance rendering.
//!
//! When an agent answers a mechanism question it also tells the
//! interface layer which evidence the answer rests on, as an
//! `(add-provenance :html "...")` content. Evidence is grouped by PubMed
//! id; each entry shows the literal extracted sentence when available,
//! the source database entry otherwise, or an English rendering of the
//! statement as a last resort.

use std::collections::BTreeMap;

use bioagents_kqml::KqmlList;

use crate::agent::ReplyContext;
use crate::statements::Statement;

const PUBMED_URL: &str = "https://www.ncbi.nlm.nih.gov/pubmed/";

/// Evidence HTML for up to `limit` statements, grouped by PMID.
///
/// Evidence without a PMID is grouped under an empty id and rendered
/// without a link. Duplicate entries within one PMID group are collapsed.
pub fn make_evidence_html(stmts: &[Statement], limit: usize) -> String {
    // pmid -> ordered, deduplicated entries
    let mut by_pmid: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for stmt in stmts.iter().take(limit) {
        for ev in stmt.evidence() {
            let entry = if let Some(text) = &ev.text {
                format!("<i>'{text}'</i>")
            } else if let Some(source_id) = &ev.source_id {
                let api = ev.source_api.as_deref().unwrap_or("unknown");
                format!("Database entry in '{api}': {source_id}")
            } else {
                let api = ev.source_api.as_deref().unwrap_or("unknown");
                format!("Evidence from '{api}': {}", stmt.english())
            };
            let pmid = ev.pmid.clone().unwrap_or_default();
            let entries = by_pmid.entry(pmid).or_default();
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
    }

    let mut sections = Vec::new();
    for (pmid, entries) in &by_pmid {
        let items: Vec<String> = entries.iter().map(|e| format!("<li>{e}</li>")).collect();
        let list = format!("<ul>\n{}\n</ul>", items.join("\n"));
        if pmid.is_empty() {
            sections.push(list);
        } else {
            sections.push(format!(
                "Found in <a href={PUBMED_URL}{pmid} target=\"_blank\">PMID{pmid}</a>:\n{list}"
            ));
        }
    }
    sections.join("\n")
}

/// `(add-provenance :html "...")` content for a conclusion.
pub fn provenance_content(
    agent_name: &str,
    stmts: &[Statement],
    for_what: &str,
    limit: usize,
) -> KqmlList {
    let evidence = make_evidence_html(stmts, limit);
    let html = format!(
        "<h4>Supporting evidence from the {agent_name} for {for_what}:</h4>\n{evidence}<hr>"
    );
    let mut content = KqmlList::of("add-provenance");
    content.sets("html", html);
    content
}

/// Queue a provenance tell for the statements supporting `for_what`.
pub fn send_provenance(
    cx: &mut ReplyContext,
    agent_name: &str,
    stmts: &[Statement],
    for_what: &str,
    limit: usize,
) {
    cx.tell(provenance_content(agent_name, stmts, for_what, limit));
}
