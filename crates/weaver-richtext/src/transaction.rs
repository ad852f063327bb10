//! Transactions: atomic groups of document mutations.
//!
//! Steps are applied in order and each step's positions refer to the
//! document as left by the previous step. An engine applies a transaction
//! completely or not at all.

use crate::model::{LinkMark, MediaNode};
use crate::types::{Range, Selection};

/// A single document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Insert a media node at a position.
    InsertNode { pos: usize, node: MediaNode },

    /// Replace a range (possibly empty) with a media node.
    ReplaceWithNode { range: Range, node: MediaNode },

    /// Rewrite the attributes of the media node at `pos`.
    SetNodeAttrs { pos: usize, attrs: MediaNode },

    /// Apply a link mark to every text unit in the range.
    AddLink { range: Range, mark: LinkMark },

    /// Remove link marks from every text unit in the range.
    RemoveLink { range: Range },

    /// Insert text, optionally carrying a link mark.
    InsertText {
        pos: usize,
        text: String,
        link: Option<LinkMark>,
    },
}

/// An ordered group of steps applied atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub steps: Vec<Step>,
    /// Selection to set after the steps apply. `None` keeps the current one.
    pub selection: Option<Selection>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(step: Step) -> Self {
        Self {
            steps: vec![step],
            selection: None,
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// A transaction with no steps leaves the document unchanged.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty() && self.selection.is_none()
    }
}

/// Errors raised by an engine while applying a transaction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// A step addressed a position past the end of the document.
    #[error("position {pos} is out of range (document length {len})")]
    OutOfRange { pos: usize, len: usize },

    /// `SetNodeAttrs` addressed something other than a media node.
    #[error("no media node at position {pos}")]
    NotMedia { pos: usize },

    /// The editor owning the document is gone.
    #[error("document is no longer attached to an editor")]
    Detached,

    /// The document is borrowed elsewhere and cannot be edited right now.
    #[error("document is busy with another edit")]
    Busy,
}
