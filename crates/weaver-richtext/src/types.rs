//! Core position types: ranges and selections.
//!
//! Positions count one unit per character of text and one unit per atomic
//! node, matching the document engine's addressing.

use serde::{Deserialize, Serialize};

/// A range in the document, measured in positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }

    /// Whether a unit occupying `pos..pos + len` touches this range.
    ///
    /// A caret touches nothing: atomic nodes are only reached by a
    /// selection that covers them.
    pub fn touches(&self, pos: usize, len: usize) -> bool {
        pos < self.end && pos + len > self.start
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.start..r.end
    }
}

/// Selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Select the single atomic node at `pos`.
    pub fn node(pos: usize) -> Self {
        Self::new(pos, pos + 1)
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Get the selection length.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to an ordered [`Range`].
    pub fn to_range(&self) -> Range {
        Range::new(self.start(), self.end())
    }

    /// Clamp both ends to a document of `len` positions.
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.head.min(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert_eq!(sel.to_range(), Range::new(5, 10));
    }

    #[test]
    fn test_caret_touches_nothing_atomic() {
        let caret = Range::caret(4);
        assert!(!caret.touches(4, 1));
        assert!(!caret.touches(3, 1));
        // A text run spanning the caret is touched.
        assert!(caret.touches(0, 10));
    }

    #[test]
    fn test_node_selection_touches_node() {
        let sel = Selection::node(3).to_range();
        assert!(sel.touches(3, 1));
        assert!(!sel.touches(4, 1));
        assert!(!sel.touches(2, 1));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Selection::new(2, 40).clamp(10), Selection::new(2, 10));
    }
}
