//! Document engine trait and the plain in-memory implementation.
//!
//! `DocumentEngine` is the surface the media components need from a
//! rich-text engine: selection access, range queries, link mark lookup and
//! transactional mutation. `PlainDocument` is a flat inline implementation
//! used by tests and the command-line tools.

use std::ops::ControlFlow;

use crate::execute::apply_step;
use crate::model::{Inline, LinkMark, MediaNode};
use crate::schema::MediaSchema;
use crate::transaction::{EngineError, Transaction};
use crate::types::{Range, Selection};

/// A borrowed view of one node reached by a range query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Text {
        pos: usize,
        text: &'a str,
        link: Option<&'a LinkMark>,
    },
    Media {
        pos: usize,
        node: &'a MediaNode,
    },
}

impl NodeRef<'_> {
    pub fn pos(&self) -> usize {
        match self {
            Self::Text { pos, .. } | Self::Media { pos, .. } => *pos,
        }
    }
}

/// Core trait for rich-text documents.
///
/// Positions count one per character and one per atomic node. Implementations
/// decide their own tree shape; the media components only rely on the
/// methods below.
pub trait DocumentEngine {
    /// Total document size in positions.
    fn len(&self) -> usize;

    /// Check if document is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the current selection.
    fn selection(&self) -> Selection;

    /// Set the selection.
    fn set_selection(&mut self, selection: Selection);

    /// Visit the nodes touching `range` depth-first in document order.
    ///
    /// The walk stops at the first `Break` and returns its value.
    fn nodes_between<B>(
        &self,
        range: Range,
        visit: impl FnMut(NodeRef<'_>) -> ControlFlow<B>,
    ) -> Option<B>;

    /// Character at `pos`. `None` past the end and for atomic nodes.
    fn char_at(&self, pos: usize) -> Option<char>;

    /// Link mark carried by the text unit at `pos`.
    fn link_at(&self, pos: usize) -> Option<&LinkMark>;

    /// The contiguous range sharing the link mark found at `pos`.
    fn link_extent(&self, pos: usize) -> Option<Range>;

    /// Apply a transaction atomically.
    fn apply(&mut self, tx: Transaction) -> Result<(), EngineError>;

    // === Provided ===

    /// Media node at exactly `pos`, if any.
    fn media_at(&self, pos: usize) -> Option<MediaNode> {
        self.nodes_between(Range::new(pos, pos + 1), |node| match node {
            NodeRef::Media { pos: at, node } if at == pos => ControlFlow::Break(node.clone()),
            _ => ControlFlow::Continue(()),
        })
    }
}

/// Flat in-memory document: a sequence of text runs and media nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainDocument {
    content: Vec<Inline>,
    selection: Selection,
}

impl PlainDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from inline content, normalizing adjacent runs.
    pub fn from_content(content: Vec<Inline>) -> Self {
        let mut doc = Self {
            content,
            selection: Selection::default(),
        };
        normalize(&mut doc.content);
        doc
    }

    /// Build a plain-text document.
    pub fn from_text(text: &str) -> Self {
        Self::from_content(vec![Inline::text(text)])
    }

    /// Load a document from HTML using the schema's parse rules.
    pub fn from_html(html: &str, schema: &MediaSchema) -> Self {
        Self::from_content(schema.parse_content(html))
    }

    /// Render the document as HTML, one `<p>` per line.
    pub fn to_html(&self, schema: &MediaSchema) -> String {
        schema.serialize_content(&self.content)
    }

    pub fn content(&self) -> &[Inline] {
        &self.content
    }

    pub fn into_content(self) -> Vec<Inline> {
        self.content
    }

    /// All text with atomic nodes shown as U+FFFC.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|inline| match inline {
                Inline::Text { text, .. } => text.as_str(),
                Inline::Media(_) => "\u{FFFC}",
            })
            .collect()
    }

    /// Media nodes with their positions, in document order.
    pub fn media(&self) -> Vec<(usize, &MediaNode)> {
        let mut pos = 0;
        let mut found = Vec::new();
        for inline in &self.content {
            if let Inline::Media(node) = inline {
                found.push((pos, node));
            }
            pos += inline.len();
        }
        found
    }

    /// Find the unit containing `pos` and the offset into it.
    fn locate(&self, pos: usize) -> Option<(&Inline, usize)> {
        let mut start = 0;
        for inline in &self.content {
            let len = inline.len();
            if pos < start + len {
                return Some((inline, pos - start));
            }
            start += len;
        }
        None
    }
}

impl DocumentEngine for PlainDocument {
    fn len(&self) -> usize {
        self.content.iter().map(Inline::len).sum()
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.len());
    }

    fn nodes_between<B>(
        &self,
        range: Range,
        mut visit: impl FnMut(NodeRef<'_>) -> ControlFlow<B>,
    ) -> Option<B> {
        let range = range.normalize();
        let mut pos = 0;
        for inline in &self.content {
            let len = inline.len();
            if pos > range.end {
                break;
            }
            if range.touches(pos, len) {
                let node = match inline {
                    Inline::Text { text, link } => NodeRef::Text {
                        pos,
                        text: text.as_str(),
                        link: link.as_ref(),
                    },
                    Inline::Media(node) => NodeRef::Media { pos, node },
                };
                if let ControlFlow::Break(found) = visit(node) {
                    return Some(found);
                }
            }
            pos += len;
        }
        None
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        match self.locate(pos)? {
            (Inline::Text { text, .. }, offset) => text.chars().nth(offset),
            (Inline::Media(_), _) => None,
        }
    }

    fn link_at(&self, pos: usize) -> Option<&LinkMark> {
        match self.locate(pos)? {
            (Inline::Text { link, .. }, _) => link.as_ref(),
            (Inline::Media(_), _) => None,
        }
    }

    fn link_extent(&self, pos: usize) -> Option<Range> {
        // Runs are normalized, so a link extent is exactly one text run.
        let mut start = 0;
        for inline in &self.content {
            let len = inline.len();
            if pos < start + len {
                return match inline {
                    Inline::Text { link: Some(_), .. } => Some(Range::new(start, start + len)),
                    _ => None,
                };
            }
            start += len;
        }
        None
    }

    fn apply(&mut self, tx: Transaction) -> Result<(), EngineError> {
        let mut content = self.content.clone();
        for step in &tx.steps {
            apply_step(&mut content, step)?;
            normalize(&mut content);
        }
        self.content = content;

        let len = self.len();
        self.selection = tx.selection.unwrap_or(self.selection).clamp(len);
        tracing::trace!(steps = tx.steps.len(), len, "applied transaction");
        Ok(())
    }
}

/// Merge adjacent text runs with the same mark and drop empty runs.
pub(crate) fn normalize(content: &mut Vec<Inline>) {
    let mut merged: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content.drain(..) {
        if inline.is_empty() {
            continue;
        }
        if let (
            Some(Inline::Text {
                text: prev,
                link: prev_link,
            }),
            Inline::Text { text, link },
        ) = (merged.last_mut(), &inline)
        {
            if *prev_link == *link {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(inline);
    }
    *content = merged;
}
