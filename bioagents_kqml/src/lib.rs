//! # KQML Codec
//!
//! Value model, parser, and stream framing for KQML (Knowledge Query and
//! Manipulation Language), the agent communication protocol spoken between
//! bioagents and the facilitator.
//!
//! # Module Structure
//!
//! - [`value`] - `KqmlValue`, `KqmlList`, `Performative` and keyword access
//! - [`parser`] - text → value parsing with positioned errors
//! - [`stream`] - async framing: one balanced expression off a socket
//!
//! # Wire form
//!
//! ```text
//! (request :sender TRIPS :reply-with msg1
//!          :content (FIND-TARGET-DRUG :target (:name BRAF)))
//! ```
//!
//! Lists are parenthesised, strings are double-quoted with `\"` and `\\`
//! escapes, everything else is a whitespace-delimited token. Keyword
//! parameters are `:key value` pairs inside a list.

pub mod parser;
pub mod stream;
pub mod value;

pub use parser::{KqmlError, parse, parse_performative};
pub use stream::read_performative;
pub use value::{KqmlList, KqmlValue, Performative};
