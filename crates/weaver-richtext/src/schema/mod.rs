//! The linkable media node type: HTML parse rules, serialization, the
//! inline shorthand recognizer and the insertion command.

mod parse;
mod serialize;
mod shorthand;

use std::collections::BTreeMap;

use weaver_common::SchemaConfig;

use crate::model::{Inline, MediaNode};
use crate::transaction::{Step, Transaction};
use crate::types::{Range, Selection};

pub use shorthand::ShorthandMatch;

/// Schema for the media node, built from [`SchemaConfig`].
#[derive(Debug, Clone, Default)]
pub struct MediaSchema {
    allow_base64: bool,
    html_attributes: BTreeMap<String, String>,
}

impl MediaSchema {
    pub fn new(config: &SchemaConfig) -> Self {
        Self {
            allow_base64: config.allow_base64,
            html_attributes: config.html_attributes.clone(),
        }
    }

    /// Whether `data:` image sources are accepted when parsing.
    pub fn allows_base64(&self) -> bool {
        self.allow_base64
    }

    /// Parse an HTML fragment and return the first media node it yields.
    pub fn parse(&self, html: &str) -> Option<MediaNode> {
        self.parse_content(html)
            .into_iter()
            .find_map(|inline| match inline {
                Inline::Media(node) => Some(node),
                Inline::Text { .. } => None,
            })
    }

    /// Parse an HTML fragment into inline content.
    ///
    /// Anchor-wrapped images become media nodes owning the anchor's `href`,
    /// bare images become media nodes without one, other anchors become link
    /// marks on their text. Unmatched markup is dropped and its text kept.
    pub fn parse_content(&self, html: &str) -> Vec<Inline> {
        parse::parse_content(self, html)
    }

    /// Serialize a media node to HTML.
    pub fn serialize(&self, node: &MediaNode) -> String {
        let mut out = String::new();
        serialize::write_media(&mut out, node, &self.html_attributes);
        out
    }

    /// Serialize inline content to HTML, one `<p>` per line.
    pub fn serialize_content(&self, content: &[Inline]) -> String {
        serialize::write_content(content, &self.html_attributes)
    }

    /// Recognize a `![alt](src "title")` token at the end of `text`.
    pub fn inline_shorthand(&self, text: &str) -> Option<ShorthandMatch> {
        shorthand::recognize(text)
    }

    /// Build a transaction inserting a media node over `selection`.
    ///
    /// A non-empty selection is replaced. `src` is not validated.
    pub fn create_insertion_command(&self, selection: Selection, attrs: MediaNode) -> Transaction {
        let range: Range = selection.to_range();
        Transaction::single(Step::ReplaceWithNode { range, node: attrs })
            .with_selection(Selection::collapsed(range.start + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentEngine, PlainDocument};

    #[test]
    fn insertion_command_replaces_selection() {
        let schema = MediaSchema::default();
        let mut doc = PlainDocument::from_text("one two three");
        let tx = schema.create_insertion_command(Selection::new(4, 7), MediaNode::new("a.png"));
        doc.apply(tx).unwrap();
        assert_eq!(doc.text_content(), "one \u{FFFC} three");
        assert_eq!(doc.selection(), Selection::collapsed(5));
    }

    #[test]
    fn insertion_command_does_not_validate_src() {
        let schema = MediaSchema::default();
        let mut doc = PlainDocument::new();
        let tx = schema.create_insertion_command(Selection::collapsed(0), MediaNode::default());
        doc.apply(tx).unwrap();
        assert_eq!(doc.media_at(0), Some(MediaNode::default()));
    }
}
