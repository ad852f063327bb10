//! Text navigation helpers.
//!
//! These functions work with the `DocumentEngine` trait. Atomic nodes report
//! no character, so every scan stops at them as it would at a line edge.

use crate::document::DocumentEngine;
use crate::types::Range;

/// Find word boundaries around cursor position.
///
/// Expands to whitespace boundaries. Used when applying a link without a
/// selection.
pub fn find_word_boundaries<D: DocumentEngine>(doc: &D, offset: usize) -> Range {
    let len = doc.len();

    // Find start by scanning backwards.
    let mut start = offset;
    while start > 0 {
        match doc.char_at(start - 1) {
            Some(c) if !c.is_whitespace() => start -= 1,
            _ => break,
        }
    }

    // Find end by scanning forwards.
    let mut end = offset;
    while end < len {
        match doc.char_at(end) {
            Some(c) if !c.is_whitespace() => end += 1,
            _ => break,
        }
    }

    Range::new(start, end)
}

/// Text of the current run ending at `offset`, at most `max_chars` long.
///
/// Stops at a newline or an atomic node. Returns the text and the position
/// where it begins.
pub fn text_before<D: DocumentEngine>(doc: &D, offset: usize, max_chars: usize) -> (usize, String) {
    let mut start = offset;
    while start > 0 && offset - start < max_chars {
        match doc.char_at(start - 1) {
            Some('\n') | None => break,
            Some(_) => start -= 1,
        }
    }
    let text = (start..offset).filter_map(|pos| doc.char_at(pos)).collect();
    (start, text)
}

/// Whether `pos` is at the start of the document or right after a newline.
///
/// A position right after an atomic node is not a line start.
pub fn is_line_start<D: DocumentEngine>(doc: &D, pos: usize) -> bool {
    pos == 0 || doc.char_at(pos - 1) == Some('\n')
}

/// Whether any text unit in `range` already carries a link mark.
pub fn has_link_in<D: DocumentEngine>(doc: &D, range: Range) -> bool {
    (range.start..range.end).any(|pos| doc.link_at(pos).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainDocument;
    use crate::model::{Inline, MediaNode};

    #[test]
    fn test_word_boundaries() {
        let doc = PlainDocument::from_text("hello big world");
        assert_eq!(find_word_boundaries(&doc, 7), Range::new(6, 9));
        assert_eq!(find_word_boundaries(&doc, 6), Range::new(6, 9));
        assert_eq!(find_word_boundaries(&doc, 0), Range::new(0, 5));
    }

    #[test]
    fn test_word_boundaries_in_whitespace() {
        let doc = PlainDocument::from_text("a  b");
        assert_eq!(find_word_boundaries(&doc, 2), Range::new(2, 2));
    }

    #[test]
    fn test_word_boundaries_stop_at_media() {
        let doc = PlainDocument::from_content(vec![
            Inline::text("ab"),
            Inline::Media(MediaNode::new("x.png")),
            Inline::text("cd"),
        ]);
        assert_eq!(find_word_boundaries(&doc, 4), Range::new(3, 5));
    }

    #[test]
    fn test_text_before_stops_at_newline() {
        let doc = PlainDocument::from_text("first\nsecond line");
        assert_eq!(text_before(&doc, 17, 500), (6, "second line".to_string()));
        assert_eq!(text_before(&doc, 17, 4), (13, "line".to_string()));
    }

    #[test]
    fn test_line_start_excludes_media_edge() {
        let doc = PlainDocument::from_content(vec![
            Inline::text("a\n"),
            Inline::Media(MediaNode::new("x.png")),
            Inline::text("b"),
        ]);
        assert!(is_line_start(&doc, 0));
        assert!(is_line_start(&doc, 2));
        assert!(!is_line_start(&doc, 1));
        assert!(!is_line_start(&doc, 3));
    }
}
