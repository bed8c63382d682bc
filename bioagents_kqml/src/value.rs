//! KQML value model.
//!
//! `KqmlValue` is the unit of the wire format; `KqmlList` adds the keyword
//! parameter access every agent relies on (`:key value` pairs); a
//! `Performative` is a list whose head token is the message verb.

use std::fmt;

use crate::parser::KqmlError;

// ─── KqmlValue ──────────────────────────────────────────────────────

/// A single KQML expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KqmlValue {
    /// Bare token (`FAILURE`, `:reason`, `msg1`, `TRUE`).
    Token(String),
    /// Double-quoted string; stored unescaped.
    Str(String),
    /// Parenthesised list.
    List(KqmlList),
}

impl KqmlValue {
    /// Build a token value.
    pub fn token(s: impl Into<String>) -> Self {
        Self::Token(s.into())
    }

    /// Build a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Text content of a token or string; `None` for lists.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Token(s) | Self::Str(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// The inner list, if this value is one.
    pub fn as_list(&self) -> Option<&KqmlList> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<KqmlList> for KqmlValue {
    fn from(list: KqmlList) -> Self {
        Self::List(list)
    }
}

impl fmt::Display for KqmlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(s) => f.write_str(s),
            Self::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        _ => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Self::List(l) => l.fmt(f),
        }
    }
}

// ─── KqmlList ───────────────────────────────────────────────────────

/// Ordered KQML list with keyword-parameter access.
///
/// Keyword lookup treats `:key`, `:KEY` and `key` as the same key. Lookup
/// on a list whose last element is a dangling keyword returns `None`
/// rather than panicking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KqmlList(Vec<KqmlValue>);

/// Case-insensitive keyword comparison, leading `:` optional on both sides.
fn key_matches(token: &str, key: &str) -> bool {
    let token = token.strip_prefix(':').unwrap_or(token);
    let key = key.strip_prefix(':').unwrap_or(key);
    token.eq_ignore_ascii_case(key)
}

impl KqmlList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// List with a head token, e.g. `KqmlList::of("FAILURE")` → `(FAILURE)`.
    pub fn of(head: impl Into<String>) -> Self {
        Self(vec![KqmlValue::token(head)])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text of the first element, if it has any.
    pub fn head(&self) -> Option<&str> {
        self.0.first().and_then(KqmlValue::text)
    }

    /// Element by position.
    pub fn nth(&self, idx: usize) -> Option<&KqmlValue> {
        self.0.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KqmlValue> {
        self.0.iter()
    }

    pub fn push(&mut self, value: impl Into<KqmlValue>) {
        self.0.push(value.into());
    }

    /// Value following the keyword `key`, if both are present.
    pub fn get(&self, key: &str) -> Option<&KqmlValue> {
        let idx = self.0.iter().position(|v| {
            matches!(v, KqmlValue::Token(t) if t.starts_with(':') && key_matches(t, key))
        })?;
        self.0.get(idx + 1)
    }

    /// Text content of the value for `key` (string contents or token text).
    pub fn gets(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(KqmlValue::text)
    }

    /// List value for `key`.
    pub fn get_list(&self, key: &str) -> Option<&KqmlList> {
        self.get(key).and_then(KqmlValue::as_list)
    }

    /// Insert or replace the keyword parameter `key`.
    pub fn set(&mut self, key: &str, value: impl Into<KqmlValue>) {
        let value = value.into();
        let keyword = if key.starts_with(':') {
            key.to_string()
        } else {
            format!(":{key}")
        };
        let idx = self.0.iter().position(|v| {
            matches!(v, KqmlValue::Token(t) if t.starts_with(':') && key_matches(t, key))
        });
        match idx {
            Some(i) if i + 1 < self.0.len() => self.0[i + 1] = value,
            Some(_) => self.0.push(value),
            None => {
                self.0.push(KqmlValue::Token(keyword));
                self.0.push(value);
            }
        }
    }

    /// Insert or replace `key` with a quoted string value.
    pub fn sets(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, KqmlValue::Str(value.into()));
    }
}

impl From<Vec<KqmlValue>> for KqmlList {
    fn from(items: Vec<KqmlValue>) -> Self {
        Self(items)
    }
}

impl FromIterator<KqmlValue> for KqmlList {
    fn from_iter<I: IntoIterator<Item = KqmlValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a KqmlList {
    type Item = &'a KqmlValue;
    type IntoIter = std::slice::Iter<'a, KqmlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for KqmlList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            v.fmt(f)?;
        }
        f.write_str(")")
    }
}

// ─── Performative ───────────────────────────────────────────────────

/// A KQML message: a list whose head token is the verb
/// (`request`, `reply`, `tell`, `register`, `subscribe`, `error`, `exit`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Performative(KqmlList);

impl Performative {
    /// New performative with the given verb and no parameters.
    pub fn new(verb: impl Into<String>) -> Self {
        Self(KqmlList::of(verb))
    }

    /// Wrap an existing list; the head must be a bare token.
    pub fn from_list(list: KqmlList) -> Result<Self, KqmlError> {
        match list.nth(0) {
            Some(KqmlValue::Token(_)) => Ok(Self(list)),
            _ => Err(KqmlError::MissingVerb),
        }
    }

    /// The message verb, lowercased comparison is the caller's concern.
    pub fn verb(&self) -> &str {
        // Invariant: constructors guarantee a head token.
        self.0.head().unwrap_or_default()
    }

    pub fn as_list(&self) -> &KqmlList {
        &self.0
    }

    pub fn into_list(self) -> KqmlList {
        self.0
    }
}

impl std::ops::Deref for Performative {
    type Target = KqmlList;

    fn deref(&self) -> &KqmlList {
        &self.0
    }
}

impl std::ops::DerefMut for Performative {
    fn deref_mut(&mut self) -> &mut KqmlList {
        &mut self.0
    }
}

impl fmt::Display for Performative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_get_is_case_insensitive() {
        let mut l = KqmlList::of("SUCCESS");
        l.set("is-target", KqmlValue::token("TRUE"));
        assert_eq!(l.gets(":IS-TARGET"), Some("TRUE"));
        assert_eq!(l.gets("is-target"), Some("TRUE"));
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let mut l = KqmlList::of("FAILURE");
        l.set("reason", KqmlValue::token("UNKNOWN_TASK"));
        l.set("reason", KqmlValue::token("INVALID_TASK"));
        assert_eq!(l.gets("reason"), Some("INVALID_TASK"));
        assert_eq!(l.len(), 3);
    }

    #[test]
    fn test_dangling_keyword_returns_none() {
        let l: KqmlList = vec![KqmlValue::token("head"), KqmlValue::token(":orphan")].into();
        assert!(l.get("orphan").is_none());
    }

    #[test]
    fn test_display_escapes_strings() {
        let mut l = KqmlList::of("tell");
        l.sets("html", "a \"quoted\" back\\slash");
        assert_eq!(
            l.to_string(),
            "(tell :html \"a \\\"quoted\\\" back\\\\slash\")"
        );
    }

    #[test]
    fn test_performative_requires_head_token() {
        let ok = Performative::from_list(KqmlList::of("reply"));
        assert!(ok.is_ok());
        let bad = Performative::from_list(KqmlList::new());
        assert!(matches!(bad, Err(KqmlError::MissingVerb)));
    }
}
