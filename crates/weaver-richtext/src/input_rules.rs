//! Rules run after text input: media shorthand and bare URL auto-linking.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::DocumentEngine;
use crate::model::LinkMark;
use crate::schema::MediaSchema;
use crate::text_helpers::{has_link_in, is_line_start, text_before};
use crate::transaction::{EngineError, Step, Transaction};
use crate::types::{Range, Selection};
use crate::url_policy::UrlPolicy;

/// How far back input rules look from the cursor.
const MAX_MATCH: usize = 500;

/// A scheme URL or a dotted host name, optionally with a path.
static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://\S+|(?:[\w-]+\.)+[a-zA-Z]{2,}(?:[/?#]\S*)?)$")
        .unwrap()
});

/// Replace a `![alt](src "title")` token ending at the cursor with a media node.
///
/// Returns whether a replacement happened.
pub fn handle_text_input<D: DocumentEngine>(
    doc: &mut D,
    schema: &MediaSchema,
) -> Result<bool, EngineError> {
    let selection = doc.selection();
    if !selection.is_collapsed() {
        return Ok(false);
    }
    let (start, text) = text_before(&*doc, selection.head, MAX_MATCH);
    let Some(found) = schema.inline_shorthand(&text) else {
        return Ok(false);
    };
    // A token at the very start of the scanned text needs a real line start
    // before it, not an atomic node or the scan limit.
    if found.range.start == 0 && !is_line_start(&*doc, start) {
        return Ok(false);
    }

    let range = Range::new(start + found.range.start, start + found.range.end);
    tracing::debug!(?range, src = ?found.attrs.src, "media shorthand matched");
    let tx = schema.create_insertion_command(Selection::new(range.start, range.end), found.attrs);
    doc.apply(tx)?;
    Ok(true)
}

/// Link the bare URL typed just before the whitespace preceding the cursor.
///
/// The URL must pass both validation and the auto-link denylist, and must
/// not already carry a link.
pub fn autolink_before_cursor<D: DocumentEngine>(
    doc: &mut D,
    policy: &UrlPolicy,
) -> Result<bool, EngineError> {
    let selection = doc.selection();
    if !selection.is_collapsed() || selection.head == 0 {
        return Ok(false);
    }
    let boundary = selection.head - 1;
    if !doc.char_at(boundary).is_some_and(char::is_whitespace) {
        return Ok(false);
    }

    let (line_start, text) = text_before(&*doc, boundary, MAX_MATCH);
    let token_offset = text
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .last()
        .map(|(byte, c)| byte + c.len_utf8())
        .unwrap_or(0);
    let token = text[token_offset..].trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '"', '\'']);
    if token.is_empty() || !BARE_URL_RE.is_match(token) {
        return Ok(false);
    }

    let start = line_start + text[..token_offset].chars().count();
    let range = Range::new(start, start + token.chars().count());
    if has_link_in(&*doc, range) || !policy.should_auto_link(token) {
        return Ok(false);
    }
    let Ok(href) = policy.validate(token) else {
        return Ok(false);
    };

    tracing::debug!(?range, %href, "auto-linking typed URL");
    doc.apply(Transaction::single(Step::AddLink {
        range,
        mark: LinkMark::new(href),
    }))?;
    Ok(true)
}
