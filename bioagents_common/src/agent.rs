//! The bioagent contract.
//!
//! A bioagent declares the request tasks it answers and produces reply
//! content for each. Everything protocol-side (registration,
//! subscriptions, reply plumbing) lives in [`crate::runtime`]; handlers
//! only see decoded request content and return either success content or
//! a [`TaskError`] that the runtime turns into `FAILURE` content.

use bioagents_kqml::KqmlList;
use thiserror::Error;

/// Reason token for a request whose content could not be decoded.
pub const REASON_INVALID_REQUEST: &str = "INVALID_REQUEST";
/// Reason token for a task head outside the agent's task table.
pub const REASON_UNKNOWN_TASK: &str = "UNKNOWN_TASK";
/// Reason token for a handler that failed unexpectedly.
pub const REASON_INTERNAL_FAILURE: &str = "INTERNAL_FAILURE";

/// Error returned by a task handler.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// Domain-level failure reported to the requester as
    /// `(FAILURE :reason R [:description "..."])`.
    #[error("task failure: {reason}")]
    Failure {
        reason: String,
        description: Option<String>,
    },

    /// Unexpected handler error; reported as `INTERNAL_FAILURE` and logged.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl TaskError {
    /// Failure with a bare reason token.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
            description: None,
        }
    }

    /// Failure with a reason token and a human-readable description.
    pub fn failure_with(reason: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
            description: Some(description.into()),
        }
    }

    /// Reply content for this error.
    pub fn into_content(self) -> KqmlList {
        match self {
            Self::Failure {
                reason,
                description,
            } => make_failure(&reason, description.as_deref()),
            Self::Internal(_) => make_failure(REASON_INTERNAL_FAILURE, None),
        }
    }
}

/// Build `(FAILURE :reason R [:description "..."])` content.
pub fn make_failure(reason: &str, description: Option<&str>) -> KqmlList {
    let mut msg = KqmlList::of("FAILURE");
    msg.set("reason", bioagents_kqml::KqmlValue::token(reason));
    if let Some(desc) = description {
        msg.sets("description", desc);
    }
    msg
}

/// Side channel handed to task handlers.
///
/// Handlers push `tell` contents here (provenance, display commands); the
/// runtime sends them before the reply, in push order.
#[derive(Debug, Default)]
pub struct ReplyContext {
    tells: Vec<KqmlList>,
}

impl ReplyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `(tell :content ...)` to accompany the reply.
    pub fn tell(&mut self, content: KqmlList) {
        self.tells.push(content);
    }

    /// Drain queued tells in push order.
    pub fn take_tells(&mut self) -> Vec<KqmlList> {
        std::mem::take(&mut self.tells)
    }
}

/// Contract implemented by every bioagent.
///
/// # Contract
///
/// - `tasks()` returns uppercase request heads; the runtime subscribes to
///   each and only dispatches heads the agent accepts.
/// - `handle_task` is called with the task head (already uppercased) and
///   the full request content list.
pub trait Bioagent: Send {
    /// Agent name used for registration and log lines.
    fn name(&self) -> &str;

    /// Uppercase task heads this agent answers.
    fn tasks(&self) -> &[&str];

    /// Whether this agent will handle `task`.
    ///
    /// Defaults to exact membership in [`tasks`](Self::tasks). Agents
    /// whose request heads carry parameters (e.g. a mechanism name baked
    /// into the head) widen this.
    fn accepts_task(&self, task: &str) -> bool {
        self.tasks().contains(&task)
    }

    /// Produce reply content for one request.
    fn handle_task(
        &mut self,
        task: &str,
        content: &KqmlList,
        cx: &mut ReplyContext,
    ) -> Result<KqmlList, TaskError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_failure_with_description() {
        let content = make_failure("DRUG_NOT_FOUND", Some("no such drug"));
        assert_eq!(content.head(), Some("FAILURE"));
        assert_eq!(content.gets("reason"), Some("DRUG_NOT_FOUND"));
        assert_eq!(content.gets("description"), Some("no such drug"));
    }

    #[test]
    fn test_internal_error_masks_detail() {
        let content = TaskError::Internal("index poisoned".to_string()).into_content();
        assert_eq!(content.gets("reason"), Some(REASON_INTERNAL_FAILURE));
        assert!(content.gets("description").is_none());
    }

    #[test]
    fn test_reply_context_preserves_tell_order() {
        let mut cx = ReplyContext::new();
        cx.tell(KqmlList::of("first"));
        cx.tell(KqmlList::of("second"));
        let tells = cx.take_tells();
        assert_eq!(tells[0].head(), Some("first"));
        assert_eq!(tells[1].head(), Some("second"));
        assert!(cx.take_tells().is_empty());
    }
}
