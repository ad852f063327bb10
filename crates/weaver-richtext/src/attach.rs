//! Attaching and detaching link destinations.
//!
//! An attach intent targets either the first media node inside the
//! selection (the node owns its `href`) or the text under the selection
//! (a [`LinkMark`]). The two never mix: node mode wins whenever a media node
//! is selected.

use std::ops::ControlFlow;

use miette::Diagnostic;
use thiserror::Error;

use crate::document::{DocumentEngine, NodeRef};
use crate::model::{LinkMark, MediaNode};
use crate::text_helpers::{find_word_boundaries, has_link_in};
use crate::transaction::{EngineError, Step, Transaction};
use crate::types::{Range, Selection};
use crate::url_policy::{RejectedUrl, UrlPolicy};

/// What an attach intent will modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    /// The media node at `pos`.
    Node { pos: usize },
    /// Text under the selection.
    Text,
}

/// Result of [`AttachmentResolver::begin_attach`]: the mode and the value
/// to prefill the destination field with (empty when there is none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachTarget {
    pub mode: AttachMode,
    pub current_href: String,
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum AttachError {
    /// Field-level error: the document was not modified.
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidDestination(#[from] RejectedUrl),

    #[error("failed to apply link change: {0}")]
    #[diagnostic(code(weaver::attach::engine))]
    Engine(#[from] EngineError),
}

/// Routes attach and detach intents to a media node or to a text mark.
#[derive(Debug, Clone, Default)]
pub struct AttachmentResolver {
    policy: UrlPolicy,
}

impl AttachmentResolver {
    pub fn new(policy: UrlPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UrlPolicy {
        &self.policy
    }

    /// Decide the mode for `selection` and the current destination.
    pub fn begin_attach<D: DocumentEngine>(&self, doc: &D, selection: Selection) -> AttachTarget {
        match selected_media(doc, selection) {
            Some((pos, node)) => AttachTarget {
                mode: AttachMode::Node { pos },
                current_href: node.href.unwrap_or_default(),
            },
            None => AttachTarget {
                mode: AttachMode::Text,
                current_href: active_link(doc, selection)
                    .map(|mark| mark.href.clone())
                    .unwrap_or_default(),
            },
        }
    }

    /// Build the transaction committing `url` for `selection`.
    ///
    /// An empty `url` removes the destination. A non-empty one is validated
    /// first; on rejection nothing is built and the caller keeps its dialog
    /// open.
    pub fn commit_attach<D: DocumentEngine>(
        &self,
        doc: &D,
        selection: Selection,
        url: &str,
    ) -> Result<Transaction, AttachError> {
        let url = url.trim();
        let href = if url.is_empty() {
            None
        } else {
            Some(self.policy.validate(url)?)
        };

        let tx = match selected_media(doc, selection) {
            Some((pos, node)) => set_node_href(pos, &node, href),
            None => match href {
                Some(href) => link_text(doc, selection, href),
                None => unlink_text(doc, selection),
            },
        };
        Ok(tx)
    }

    /// Remove the destination under `selection`. Repeating it is a no-op.
    pub fn detach<D: DocumentEngine>(&self, doc: &D, selection: Selection) -> Transaction {
        match selected_media(doc, selection) {
            Some((pos, node)) if node.href.is_some() => set_node_href(pos, &node, None),
            Some(_) => Transaction::new(),
            None => unlink_text(doc, selection),
        }
    }

    /// Commit `url` for the document's current selection and apply it.
    pub fn attach<D: DocumentEngine>(&self, doc: &mut D, url: &str) -> Result<(), AttachError> {
        let selection = doc.selection();
        let tx = self.commit_attach(&*doc, selection, url)?;
        if !tx.is_noop() {
            doc.apply(tx)?;
        }
        Ok(())
    }

    /// Treat pasted text as a link destination for a non-empty selection.
    ///
    /// Returns `Ok(false)` when the paste should fall through to the default
    /// handling: a collapsed selection or text that is not an acceptable URL.
    pub fn paste_link<D: DocumentEngine>(
        &self,
        doc: &mut D,
        pasted: &str,
    ) -> Result<bool, AttachError> {
        let selection = doc.selection();
        let pasted = pasted.trim();
        if selection.is_collapsed() || pasted.is_empty() || pasted.contains(char::is_whitespace) {
            return Ok(false);
        }
        let Ok(href) = self.policy.validate(pasted) else {
            return Ok(false);
        };

        let tx = match selected_media(&*doc, selection) {
            Some((pos, node)) => set_node_href(pos, &node, Some(href)),
            None => Transaction::single(Step::AddLink {
                range: selection.to_range(),
                mark: LinkMark::new(href),
            }),
        };
        doc.apply(tx)?;
        tracing::debug!(?selection, "pasted link over selection");
        Ok(true)
    }
}

/// First media node in document order touching the selection.
fn selected_media<D: DocumentEngine>(doc: &D, selection: Selection) -> Option<(usize, MediaNode)> {
    doc.nodes_between(selection.to_range(), |node| match node {
        NodeRef::Media { pos, node } => ControlFlow::Break((pos, node.clone())),
        NodeRef::Text { .. } => ControlFlow::Continue(()),
    })
}

/// Link mark active for the selection. A caret also looks one unit back so
/// the end of a link still counts as inside it.
fn active_link<D: DocumentEngine>(doc: &D, selection: Selection) -> Option<&LinkMark> {
    let range = selection.to_range();
    if range.is_empty() {
        doc.link_at(range.start).or_else(|| {
            range
                .start
                .checked_sub(1)
                .and_then(|prev| doc.link_at(prev))
        })
    } else {
        doc.link_at(range.start)
    }
}

/// Range a text link change applies to: the selection grown to cover any
/// link it touches at either end, or for a caret the surrounding link or
/// word.
fn link_range<D: DocumentEngine>(doc: &D, selection: Selection) -> Range {
    let range = selection.to_range();
    if range.is_empty() {
        let pos = range.start;
        return doc
            .link_extent(pos)
            .or_else(|| pos.checked_sub(1).and_then(|prev| doc.link_extent(prev)))
            .unwrap_or_else(|| find_word_boundaries(doc, pos));
    }

    let mut extended = range;
    let ends = [Some(range.start), range.end.checked_sub(1)];
    for extent in ends.into_iter().flatten().filter_map(|pos| doc.link_extent(pos)) {
        extended.start = extended.start.min(extent.start);
        extended.end = extended.end.max(extent.end);
    }
    extended
}

fn set_node_href(pos: usize, node: &MediaNode, href: Option<String>) -> Transaction {
    Transaction::single(Step::SetNodeAttrs {
        pos,
        attrs: node.with_destination(href),
    })
}

fn link_text<D: DocumentEngine>(doc: &D, selection: Selection, href: String) -> Transaction {
    let range = link_range(doc, selection);
    if range.is_empty() {
        // Nothing to link: insert the destination itself as linked text.
        let end = range.start + href.chars().count();
        return Transaction::single(Step::InsertText {
            pos: range.start,
            text: href.clone(),
            link: Some(LinkMark::new(href)),
        })
        .with_selection(Selection::collapsed(end));
    }
    Transaction::single(Step::AddLink {
        range,
        mark: LinkMark::new(href),
    })
}

fn unlink_text<D: DocumentEngine>(doc: &D, selection: Selection) -> Transaction {
    let range = link_range(doc, selection);
    if range.is_empty() || !has_link_in(doc, range) {
        return Transaction::new();
    }
    Transaction::single(Step::RemoveLink { range })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainDocument;
    use crate::model::Inline;

    fn resolver() -> AttachmentResolver {
        AttachmentResolver::default()
    }

    fn mixed() -> PlainDocument {
        // "ab" [img] "cd"
        PlainDocument::from_content(vec![
            Inline::text("ab"),
            Inline::Media(
                MediaNode::new("cat.png")
                    .with_alt("cat")
                    .with_href("https://old.example"),
            ),
            Inline::text("cd"),
        ])
    }

    #[test]
    fn media_in_selection_selects_node_mode() {
        let doc = mixed();
        let target = resolver().begin_attach(&doc, Selection::new(0, 5));
        assert_eq!(target.mode, AttachMode::Node { pos: 2 });
        assert_eq!(target.current_href, "https://old.example");
    }

    #[test]
    fn text_selection_prefills_active_link() {
        let doc = PlainDocument::from_content(vec![
            Inline::text("go "),
            Inline::linked("here", "https://example.com"),
        ]);
        let r = resolver();
        let inside = r.begin_attach(&doc, Selection::collapsed(5));
        assert_eq!(inside.mode, AttachMode::Text);
        assert_eq!(inside.current_href, "https://example.com");
        // Caret right after the link still sees it.
        assert_eq!(
            r.begin_attach(&doc, Selection::collapsed(7)).current_href,
            "https://example.com"
        );
        assert_eq!(r.begin_attach(&doc, Selection::collapsed(1)).current_href, "");
    }

    #[test]
    fn node_commit_replaces_only_href() {
        let mut doc = mixed();
        let tx = resolver()
            .commit_attach(&doc, Selection::new(0, 5), "example.com")
            .unwrap();
        doc.apply(tx).unwrap();

        let node = doc.media_at(2).unwrap();
        assert_eq!(node.href.as_deref(), Some("https://example.com"));
        assert_eq!(node.alt.as_deref(), Some("cat"));
        // The surrounding text gained no mark.
        assert_eq!(doc.link_at(0), None);
        assert_eq!(doc.link_at(3), None);
    }

    #[test]
    fn node_commit_with_empty_url_clears_href() {
        let mut doc = mixed();
        let tx = resolver()
            .commit_attach(&doc, Selection::node(2), "  ")
            .unwrap();
        doc.apply(tx).unwrap();
        assert_eq!(doc.media_at(2).unwrap().href, None);
    }

    #[test]
    fn rejected_url_builds_nothing() {
        let doc = mixed();
        let err = resolver()
            .commit_attach(&doc, Selection::node(2), "javascript:alert(1)")
            .unwrap_err();
        assert!(matches!(
            err,
            AttachError::InvalidDestination(RejectedUrl::DisallowedProtocol { .. })
        ));

        let mut doc = PlainDocument::from_text("hello world");
        doc.set_selection(Selection::collapsed(8));
        let before = doc.clone();
        assert!(resolver().attach(&mut doc, "ftp://host/x").is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn caret_commit_links_surrounding_word() {
        let mut doc = PlainDocument::from_text("hello world");
        doc.set_selection(Selection::collapsed(8));
        resolver().attach(&mut doc, "example.com").unwrap();
        assert_eq!(
            doc.content(),
            &[
                Inline::text("hello "),
                Inline::linked("world", "https://example.com"),
            ]
        );
    }

    #[test]
    fn selection_commit_extends_over_touched_link() {
        let mut doc = PlainDocument::from_content(vec![
            Inline::text("one "),
            Inline::linked("two", "https://old.example"),
            Inline::text(" three"),
        ]);
        // Selects "ne tw": grows to cover the whole of "two".
        doc.set_selection(Selection::new(1, 6));
        resolver().attach(&mut doc, "https://new.example").unwrap();
        assert_eq!(
            doc.content(),
            &[
                Inline::text("o"),
                Inline::linked("ne two", "https://new.example"),
                Inline::text(" three"),
            ]
        );
    }

    #[test]
    fn caret_without_word_inserts_linked_url() {
        let mut doc = PlainDocument::from_text("see ");
        doc.set_selection(Selection::collapsed(4));
        resolver().attach(&mut doc, "example.com").unwrap();
        assert_eq!(
            doc.content(),
            &[
                Inline::text("see "),
                Inline::linked("https://example.com", "https://example.com"),
            ]
        );
        assert_eq!(doc.selection(), Selection::collapsed(23));
    }

    #[test]
    fn detach_is_idempotent() {
        let mut doc = PlainDocument::from_content(vec![
            Inline::text("go "),
            Inline::linked("here", "https://example.com"),
        ]);
        let r = resolver();
        let caret = Selection::collapsed(5);

        let tx = r.detach(&doc, caret);
        doc.apply(tx).unwrap();
        let once = doc.clone();
        assert_eq!(once.content(), &[Inline::text("go here")]);

        let tx = r.detach(&doc, caret);
        assert!(tx.is_noop());
        doc.apply(tx).unwrap();
        assert_eq!(doc, once);
    }

    #[test]
    fn detach_on_node_is_idempotent() {
        let mut doc = mixed();
        let r = resolver();
        let tx = r.detach(&doc, Selection::node(2));
        doc.apply(tx).unwrap();
        assert_eq!(doc.media_at(2).unwrap().href, None);
        assert!(r.detach(&doc, Selection::node(2)).is_noop());
    }

    #[test]
    fn paste_url_over_selection_links_it() {
        let mut doc = PlainDocument::from_text("read this now");
        doc.set_selection(Selection::new(5, 9));
        assert!(resolver().paste_link(&mut doc, "https://example.com/post").unwrap());
        assert_eq!(
            doc.content()[1],
            Inline::linked("this", "https://example.com/post")
        );

        doc.set_selection(Selection::new(0, 4));
        assert!(!resolver().paste_link(&mut doc, "just words").unwrap());
        doc.set_selection(Selection::collapsed(2));
        assert!(!resolver().paste_link(&mut doc, "https://example.com").unwrap());
    }

    #[test]
    fn paste_url_over_media_sets_href() {
        let mut doc = mixed();
        doc.set_selection(Selection::node(2));
        assert!(resolver().paste_link(&mut doc, "https://new.example").unwrap());
        assert_eq!(
            doc.media_at(2).unwrap().href.as_deref(),
            Some("https://new.example")
        );
    }
}
