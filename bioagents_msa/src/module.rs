//! The KQML-facing MSA agent.
//!
//! Tasks and reply contents:
//!
//! | Task                              | Arguments                              | Success content                               |
//! |-----------------------------------|----------------------------------------|-----------------------------------------------|
//! | `PHOSPHORYLATION-ACTIVATING`      | `:target`, opt. `:residue`, `:position`| `(SUCCESS :is-activating TRUE\|FALSE)`        |
//! | `FIND-RELATIONS-FROM-LITERATURE`  | `:source` and/or `:target`, opt. `:type`| `(SUCCESS :relations-found N)`               |
//! | `CONFIRM-RELATION-FROM-LITERATURE`| `:source` and/or `:target`, opt. `:type`| `(SUCCESS :some-relations-found TRUE\|FALSE)`|
//!
//! The first task's head is read as `<MECHANISM>-<POLARITY>`, and any head
//! with a recognised polarity suffix is routed to the same handler, so
//! e.g. `UBIQUITINATION-DEACTIVATING` is accepted and a bogus mechanism
//! simply finds no support. `INHIBITING` counts as the deactivating
//! polarity. Whenever supporting statements exist, one
//! `(add-provenance :html ...)` tell precedes the reply. Failure reasons:
//! `UNKNOWN_ACTION`, `MISSING_MECHANISM`, `MISSING_TARGET`.

use tracing::debug;

use bioagents::agent::{Bioagent, ReplyContext, TaskError};
use bioagents::prelude::DEFAULT_PROVENANCE_LIMIT;
use bioagents::provenance::send_provenance;
use bioagents::statements::Statement;
use bioagents_kqml::{KqmlList, KqmlValue};

use crate::corpus::{StatementQuery, StatementSource};

const TASKS: &[&str] = &[
    "PHOSPHORYLATION-ACTIVATING",
    "FIND-RELATIONS-FROM-LITERATURE",
    "CONFIRM-RELATION-FROM-LITERATURE",
];

/// Mechanism search agent.
pub struct MsaAgent {
    source: Box<dyn StatementSource>,
}

impl MsaAgent {
    pub fn new(source: Box<dyn StatementSource>) -> Self {
        Self { source }
    }

    fn respond_modification_activating(
        &self,
        task: &str,
        content: &KqmlList,
        cx: &mut ReplyContext,
    ) -> Result<KqmlList, TaskError> {
        let (mechanism, polarity) = task
            .rsplit_once('-')
            .ok_or_else(|| TaskError::failure("UNKNOWN_ACTION"))?;
        let activating = match polarity {
            "ACTIVATING" => true,
            "DEACTIVATING" | "INHIBITING" => false,
            _ => return Err(TaskError::failure("UNKNOWN_ACTION")),
        };
        if mechanism.is_empty() {
            return Err(TaskError::failure("MISSING_MECHANISM"));
        }
        let target =
            term_name(content, "target").ok_or_else(|| TaskError::failure("MISSING_TARGET"))?;
        let residue = content.gets("residue");
        let position = content.gets("position");

        let query = StatementQuery::new()
            .object(target.clone())
            .stmt_type("ActiveForm");
        let supporting: Vec<Statement> = self
            .source
            .find_statements(&query)
            .into_iter()
            .filter(|s| match s {
                Statement::ActiveForm { is_active, .. } => *is_active == activating,
                _ => false,
            })
            .filter(|s| has_matching_mod(s, mechanism, residue, position))
            .collect();
        debug!(
            "{} statements about {mechanism} of {target}",
            supporting.len()
        );

        if supporting.is_empty() {
            return Err(TaskError::failure_with(
                "MISSING_MECHANISM",
                format!("no {} statements about {target}", mechanism.to_lowercase()),
            ));
        }
        let for_what = format!(
            "{} of {target} being {}",
            mechanism.to_lowercase(),
            polarity.to_lowercase()
        );
        send_provenance(cx, self.name(), &supporting, &for_what, DEFAULT_PROVENANCE_LIMIT);

        let mut msg = KqmlList::of("SUCCESS");
        msg.set("is-activating", bool_token(activating));
        Ok(msg)
    }

    /// Shared query construction for the two literature tasks.
    fn relation_statements(&self, content: &KqmlList) -> Result<Vec<Statement>, TaskError> {
        let source = term_name(content, "source");
        let target = term_name(content, "target");
        if source.is_none() && target.is_none() {
            return Err(TaskError::failure("MISSING_TARGET"));
        }
        let mut query = StatementQuery::new();
        query.subject = source;
        query.object = target;
        query.stmt_type = content.gets("type").map(str::to_string);
        Ok(self.source.find_statements(&query))
    }

    fn respond_find_relations(
        &self,
        content: &KqmlList,
        cx: &mut ReplyContext,
    ) -> Result<KqmlList, TaskError> {
        let found = self.relation_statements(content)?;
        if found.is_empty() {
            return Err(TaskError::failure("MISSING_MECHANISM"));
        }
        send_provenance(
            cx,
            self.name(),
            &found,
            "the relations found",
            DEFAULT_PROVENANCE_LIMIT,
        );
        let mut msg = KqmlList::of("SUCCESS");
        msg.set(
            "relations-found",
            KqmlValue::token(found.len().to_string()),
        );
        Ok(msg)
    }

    fn respond_confirm_relation(
        &self,
        content: &KqmlList,
        cx: &mut ReplyContext,
    ) -> Result<KqmlList, TaskError> {
        let found = self.relation_statements(content)?;
        if !found.is_empty() {
            send_provenance(
                cx,
                self.name(),
                &found,
                "the relation being confirmed",
                DEFAULT_PROVENANCE_LIMIT,
            );
        }
        let mut msg = KqmlList::of("SUCCESS");
        msg.set("some-relations-found", bool_token(!found.is_empty()));
        Ok(msg)
    }
}

impl Bioagent for MsaAgent {
    fn name(&self) -> &str {
        "MSA"
    }

    fn tasks(&self) -> &[&str] {
        TASKS
    }

    fn accepts_task(&self, task: &str) -> bool {
        TASKS.contains(&task) || is_modification_head(task)
    }

    fn handle_task(
        &mut self,
        task: &str,
        content: &KqmlList,
        cx: &mut ReplyContext,
    ) -> Result<KqmlList, TaskError> {
        match task {
            "FIND-RELATIONS-FROM-LITERATURE" => self.respond_find_relations(content, cx),
            "CONFIRM-RELATION-FROM-LITERATURE" => self.respond_confirm_relation(content, cx),
            // Everything else is a modification head; malformed ones fail
            // with UNKNOWN_ACTION inside the handler.
            head => self.respond_modification_activating(head, content, cx),
        }
    }
}

/// Is this head of the `<MECHANISM>-<POLARITY>` form?
fn is_modification_head(task: &str) -> bool {
    matches!(
        task.rsplit_once('-').map(|(_, polarity)| polarity),
        Some("ACTIVATING" | "DEACTIVATING" | "INHIBITING")
    )
}

/// Does the active-form statement carry a modification matching the
/// mechanism and, where given, the site?
fn has_matching_mod(
    stmt: &Statement,
    mechanism: &str,
    residue: Option<&str>,
    position: Option<&str>,
) -> bool {
    let Statement::ActiveForm { agent, .. } = stmt else {
        return false;
    };
    agent.mods.iter().any(|m| {
        if !m.mod_type.eq_ignore_ascii_case(mechanism) {
            return false;
        }
        if let Some(r) = residue {
            if m.residue.as_deref() != Some(r) {
                return false;
            }
        }
        if let Some(p) = position {
            if m.position.as_deref() != Some(p) {
                return false;
            }
        }
        true
    })
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
