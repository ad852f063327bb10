//! Linkable media for weaver rich-text documents.
//!
//! This crate provides:
//! - `MediaNode`: an atomic image node that can own a link destination
//! - `MediaSchema`: HTML parse/serialize rules and the inline shorthand
//! - `AttachmentResolver`: routes link attach/detach to a node or a text mark
//! - `UrlPolicy`: destination validation and auto-link decisions
//! - `DocumentEngine`: the engine surface these components drive, with
//!   `PlainDocument` as an in-memory implementation

pub mod attach;
pub mod document;
mod execute;
pub mod input_rules;
pub mod model;
pub mod schema;
pub mod text_helpers;
pub mod transaction;
pub mod types;
pub mod url_policy;

pub use attach::{AttachError, AttachMode, AttachTarget, AttachmentResolver};
pub use document::{DocumentEngine, NodeRef, PlainDocument};
pub use input_rules::{autolink_before_cursor, handle_text_input};
pub use model::{Dimension, Inline, LinkMark, MediaNode};
pub use schema::{MediaSchema, ShorthandMatch};
pub use text_helpers::find_word_boundaries;
pub use transaction::{EngineError, Step, Transaction};
pub use types::{Range, Selection};
pub use url_policy::{RejectedUrl, UrlPolicy};
