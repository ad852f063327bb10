//! Step execution for the plain document.
//!
//! `apply_step` is the central dispatch point for mutating a flat inline
//! sequence. Every step first splits text runs so that its range falls on
//! unit boundaries, then edits whole units.

use crate::model::{Inline, LinkMark, MediaNode};
use crate::transaction::{EngineError, Step};
use crate::types::Range;

/// Apply one step to `content`.
///
/// On error `content` may be partially modified; callers apply to a copy.
pub(crate) fn apply_step(content: &mut Vec<Inline>, step: &Step) -> Result<(), EngineError> {
    match step {
        Step::InsertNode { pos, node } => execute_insert_node(content, *pos, node),
        Step::ReplaceWithNode { range, node } => execute_replace_with_node(content, *range, node),
        Step::SetNodeAttrs { pos, attrs } => execute_set_node_attrs(content, *pos, attrs),
        Step::AddLink { range, mark } => execute_set_link(content, *range, Some(mark)),
        Step::RemoveLink { range } => execute_set_link(content, *range, None),
        Step::InsertText { pos, text, link } => execute_insert_text(content, *pos, text, link),
    }
}

fn execute_insert_node(
    content: &mut Vec<Inline>,
    pos: usize,
    node: &MediaNode,
) -> Result<(), EngineError> {
    let index = split_at(content, pos)?;
    content.insert(index, Inline::Media(node.clone()));
    Ok(())
}

fn execute_replace_with_node(
    content: &mut Vec<Inline>,
    range: Range,
    node: &MediaNode,
) -> Result<(), EngineError> {
    let range = range.normalize();
    let start = split_at(content, range.start)?;
    let end = split_at(content, range.end)?;
    content.splice(start..end, [Inline::Media(node.clone())]);
    Ok(())
}

fn execute_set_node_attrs(
    content: &mut [Inline],
    pos: usize,
    attrs: &MediaNode,
) -> Result<(), EngineError> {
    let mut start = 0;
    for inline in content.iter_mut() {
        if start == pos {
            if let Inline::Media(node) = inline {
                *node = attrs.clone();
                return Ok(());
            }
        }
        if start > pos {
            break;
        }
        start += inline.len();
    }
    Err(EngineError::NotMedia { pos })
}

fn execute_set_link(
    content: &mut Vec<Inline>,
    range: Range,
    mark: Option<&LinkMark>,
) -> Result<(), EngineError> {
    let range = range.normalize();
    let start = split_at(content, range.start)?;
    let end = split_at(content, range.end)?;
    for inline in &mut content[start..end] {
        // Media nodes own their destination; marks never land on them.
        if let Inline::Text { link, .. } = inline {
            *link = mark.cloned();
        }
    }
    Ok(())
}

fn execute_insert_text(
    content: &mut Vec<Inline>,
    pos: usize,
    text: &str,
    link: &Option<LinkMark>,
) -> Result<(), EngineError> {
    let index = split_at(content, pos)?;
    content.insert(
        index,
        Inline::Text {
            text: text.to_owned(),
            link: link.clone(),
        },
    );
    Ok(())
}

/// Ensure a unit boundary at `pos`, returning the index of the unit that
/// starts there (or `content.len()` at the end of the document).
fn split_at(content: &mut Vec<Inline>, pos: usize) -> Result<usize, EngineError> {
    let mut start = 0;
    for index in 0..content.len() {
        if pos == start {
            return Ok(index);
        }
        let len = content[index].len();
        if pos < start + len {
            // Atomic nodes are one wide, so only text can be split inside.
            if let Inline::Text { text, link } = &mut content[index] {
                let byte = text
                    .char_indices()
                    .nth(pos - start)
                    .map(|(byte, _)| byte)
                    .unwrap_or(text.len());
                let tail = text.split_off(byte);
                let link = link.clone();
                content.insert(index + 1, Inline::Text { text: tail, link });
                return Ok(index + 1);
            }
        }
        start += len;
    }
    if pos == start {
        Ok(content.len())
    } else {
        Err(EngineError::OutOfRange { pos, len: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentEngine, PlainDocument};
    use crate::transaction::Transaction;
    use crate::types::Selection;

    fn apply(doc: &mut PlainDocument, step: Step) -> Result<(), EngineError> {
        doc.apply(Transaction::single(step))
    }

    #[test]
    fn test_insert_node_splits_text() {
        let mut doc = PlainDocument::from_text("hello");
        apply(
            &mut doc,
            Step::InsertNode {
                pos: 2,
                node: MediaNode::new("a.png"),
            },
        )
        .unwrap();
        assert_eq!(doc.text_content(), "he\u{FFFC}llo");
        assert_eq!(doc.len(), 6);
    }

    #[test]
    fn test_insert_node_at_end() {
        let mut doc = PlainDocument::from_text("hi");
        apply(
            &mut doc,
            Step::InsertNode {
                pos: 2,
                node: MediaNode::new("a.png"),
            },
        )
        .unwrap();
        assert_eq!(doc.media_at(2), Some(MediaNode::new("a.png")));
    }

    #[test]
    fn test_insert_node_out_of_range() {
        let mut doc = PlainDocument::from_text("hi");
        let err = apply(
            &mut doc,
            Step::InsertNode {
                pos: 9,
                node: MediaNode::new("a.png"),
            },
        )
        .unwrap_err();
        assert_eq!(err, EngineError::OutOfRange { pos: 9, len: 2 });
        assert_eq!(doc.text_content(), "hi");
    }

    #[test]
    fn test_same_position_inserts_stack_before_earlier_ones() {
        let mut doc = PlainDocument::from_text("ab");
        for src in ["first.png", "second.png"] {
            apply(
                &mut doc,
                Step::InsertNode {
                    pos: 1,
                    node: MediaNode::new(src),
                },
            )
            .unwrap();
        }
        let srcs: Vec<_> = doc
            .media()
            .into_iter()
            .map(|(pos, node)| (pos, node.src.clone().unwrap()))
            .collect();
        assert_eq!(
            srcs,
            vec![(1, "second.png".to_string()), (2, "first.png".to_string())]
        );
    }

    #[test]
    fn test_replace_with_node() {
        let mut doc = PlainDocument::from_text("see ![x](y) now");
        apply(
            &mut doc,
            Step::ReplaceWithNode {
                range: Range::new(4, 11),
                node: MediaNode::new("y"),
            },
        )
        .unwrap();
        assert_eq!(doc.text_content(), "see \u{FFFC} now");
    }

    #[test]
    fn test_set_node_attrs_requires_media() {
        let mut doc = PlainDocument::from_text("text");
        let err = apply(
            &mut doc,
            Step::SetNodeAttrs {
                pos: 1,
                attrs: MediaNode::new("a.png"),
            },
        )
        .unwrap_err();
        assert_eq!(err, EngineError::NotMedia { pos: 1 });
    }

    #[test]
    fn test_link_marks_skip_media() {
        let mut doc = PlainDocument::from_content(vec![
            Inline::text("ab"),
            Inline::Media(MediaNode::new("a.png")),
            Inline::text("cd"),
        ]);
        apply(
            &mut doc,
            Step::AddLink {
                range: Range::new(1, 4),
                mark: LinkMark::new("https://example.com"),
            },
        )
        .unwrap();
        assert_eq!(
            doc.content(),
            &[
                Inline::text("a"),
                Inline::linked("b", "https://example.com"),
                Inline::Media(MediaNode::new("a.png")),
                Inline::linked("c", "https://example.com"),
                Inline::text("d"),
            ]
        );

        apply(
            &mut doc,
            Step::RemoveLink {
                range: Range::new(0, 5),
            },
        )
        .unwrap();
        assert_eq!(doc.content()[0], Inline::text("ab"));
    }

    #[test]
    fn test_failed_transaction_leaves_document_untouched() {
        let mut doc = PlainDocument::from_text("abc");
        doc.set_selection(Selection::collapsed(1));
        let tx = Transaction::new()
            .step(Step::InsertNode {
                pos: 0,
                node: MediaNode::new("a.png"),
            })
            .step(Step::SetNodeAttrs {
                pos: 2,
                attrs: MediaNode::new("b.png"),
            })
            .with_selection(Selection::collapsed(3));
        assert!(doc.apply(tx).is_err());
        assert_eq!(doc.text_content(), "abc");
        assert_eq!(doc.selection(), Selection::collapsed(1));
    }

    #[test]
    fn test_split_multibyte_text() {
        let mut doc = PlainDocument::from_text("héllo");
        apply(
            &mut doc,
            Step::InsertText {
                pos: 2,
                text: "X".into(),
                link: None,
            },
        )
        .unwrap();
        assert_eq!(doc.text_content(), "héXllo");
    }
}
