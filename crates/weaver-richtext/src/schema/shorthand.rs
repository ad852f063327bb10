//! Inline `![alt](src "title")` shorthand.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::MediaNode;
use crate::types::Range;

/// Token anchored at the end of the input, preceded by line start or
/// whitespace. Alt text may not contain `]`, so only the last token on a line
/// can match.
static SHORTHAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(!\[([^\]]*)\]\((\S+?)(?:\s+["']([^"']*)["'])?\))$"#).unwrap()
});

/// A recognized shorthand token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShorthandMatch {
    /// Character offsets of the token within the scanned text, leading
    /// whitespace excluded.
    pub range: Range,
    pub attrs: MediaNode,
}

pub(super) fn recognize(text: &str) -> Option<ShorthandMatch> {
    let caps = SHORTHAND_RE.captures(text)?;
    let token = caps.get(1)?;
    let src = caps.get(3)?.as_str();
    let alt = caps
        .get(2)
        .map(|m| m.as_str())
        .filter(|alt| !alt.is_empty() && *alt != ":");
    let title = caps.get(4).map(|m| m.as_str()).filter(|t| !t.is_empty());

    let start = text[..token.start()].chars().count();
    let len = token.as_str().chars().count();

    let mut attrs = MediaNode::new(src);
    attrs.alt = alt.map(str::to_owned);
    attrs.title = title.map(str::to_owned);
    Some(ShorthandMatch {
        range: Range::new(start, start + len),
        attrs,
    })
}
