//! HTML serialization for media nodes and inline content.

use std::collections::BTreeMap;
use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{Inline, MediaNode};

/// Write `node` as `<img>`, wrapped in `<a href>` when it owns a destination.
///
/// Node attributes come first in a fixed order. Configured defaults follow,
/// skipped where the node already set the same attribute. Unset attributes
/// never appear.
pub(super) fn write_media(out: &mut String, node: &MediaNode, defaults: &BTreeMap<String, String>) {
    if let Some(href) = &node.href {
        write_open_anchor(out, href);
    }

    let width = node.width.as_ref().map(ToString::to_string);
    let height = node.height.as_ref().map(ToString::to_string);
    let own = [
        ("src", node.src.as_deref()),
        ("alt", node.alt.as_deref()),
        ("title", node.title.as_deref()),
        ("width", width.as_deref()),
        ("height", height.as_deref()),
    ];

    out.push_str("<img");
    for (name, value) in own {
        if let Some(value) = value {
            write_attr(out, name, value);
        }
    }
    for (name, value) in defaults {
        let overridden = own
            .iter()
            .any(|(own_name, own_value)| *own_name == name.as_str() && own_value.is_some());
        if !overridden {
            write_attr(out, name, value);
        }
    }
    out.push('>');

    if node.href.is_some() {
        out.push_str("</a>");
    }
}

/// Render content as one `<p>` per `\n`-separated line.
pub(super) fn write_content(content: &[Inline], defaults: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    if content.is_empty() {
        return out;
    }

    out.push_str("<p>");
    for inline in content {
        match inline {
            Inline::Text { text, link } => {
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        out.push_str("</p><p>");
                    }
                    if line.is_empty() {
                        continue;
                    }
                    match link {
                        Some(mark) => {
                            write_open_anchor(&mut out, &mark.href);
                            out.push_str(&encode_text(line));
                            out.push_str("</a>");
                        }
                        None => out.push_str(&encode_text(line)),
                    }
                }
            }
            Inline::Media(node) => write_media(&mut out, node, defaults),
        }
    }
    out.push_str("</p>");
    out
}

fn write_open_anchor(out: &mut String, href: &str) {
    out.push_str("<a");
    write_attr(out, "href", href);
    out.push('>');
}

/// Carriage returns and NULs are written as character references; the
/// tokenizer would otherwise normalize them away.
fn write_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {name}=\"");
    for c in encode_double_quoted_attribute(value).chars() {
        match c {
            '\r' => out.push_str("&#13;"),
            '\0' => out.push_str("&#0;"),
            c => out.push(c),
        }
    }
    out.push('"');
}
