//! Document content: text runs, link marks and the linkable media node.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A width or height rendering hint.
///
/// HTML carries both forms as strings; a value is only treated as a number
/// when it prints back to exactly the same text, so `"0300"` or `"50%"` stay
/// textual and round-trip untouched. Numbers that are not whole pixel counts
/// (`12.5`, `-1`) deserialize as their printed text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "DimensionRepr")]
pub enum Dimension {
    Pixels(u32),
    Text(SmolStr),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Pixels(u32),
    Number(f64),
    Text(SmolStr),
}

impl From<DimensionRepr> for Dimension {
    fn from(repr: DimensionRepr) -> Self {
        match repr {
            DimensionRepr::Pixels(n) => Self::Pixels(n),
            DimensionRepr::Number(n) => Self::Text(SmolStr::new(n.to_string())),
            DimensionRepr::Text(s) => Self::Text(s),
        }
    }
}

impl Dimension {
    /// Interpret an attribute value.
    pub fn parse(value: &str) -> Self {
        match value.parse::<u32>() {
            Ok(n) if n.to_string() == value => Self::Pixels(n),
            _ => Self::Text(SmolStr::new(value)),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pixels(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for Dimension {
    fn from(n: u32) -> Self {
        Self::Pixels(n)
    }
}

impl From<&str> for Dimension {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// An atomic image node that may carry its own link destination.
///
/// `href` is node-owned state. Text links use [`LinkMark`] instead, and the
/// two never apply to the same unit of content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaNode {
    /// Resource locator. A node without one is structurally legal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl MediaNode {
    /// Create a node pointing at `src`.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Default::default()
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, width: impl Into<Dimension>, height: impl Into<Dimension>) -> Self {
        self.width = Some(width.into());
        self.height = Some(height.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Copy of this node with a new destination, every other attribute kept.
    pub fn with_destination(&self, href: Option<String>) -> Self {
        Self {
            href,
            ..self.clone()
        }
    }
}

/// Hyperlink mark applied to a run of text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMark {
    pub href: String,
}

impl LinkMark {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// One unit of inline content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// A run of text sharing the same link mark. `\n` separates paragraphs.
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<LinkMark>,
    },
    /// A linkable media node, one position wide.
    Media(MediaNode),
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            link: None,
        }
    }

    pub fn linked(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            link: Some(LinkMark::new(href)),
        }
    }

    /// Number of positions this unit occupies.
    pub fn len(&self) -> usize {
        match self {
            Self::Text { text, .. } => text.chars().count(),
            Self::Media(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_media(&self) -> Option<&MediaNode> {
        match self {
            Self::Media(node) => Some(node),
            Self::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_keeps_exact_text() {
        assert_eq!(Dimension::parse("300"), Dimension::Pixels(300));
        assert_eq!(Dimension::parse("0300").to_string(), "0300");
        assert_eq!(Dimension::parse("50%").to_string(), "50%");
        assert_eq!(Dimension::parse("").to_string(), "");
    }

    #[test]
    fn dimension_accepts_any_json_number() {
        let node: MediaNode =
            serde_json::from_str(r#"{"src":"a.png","width":12.5,"height":-1}"#).unwrap();
        assert_eq!(node.width, Some(Dimension::Text("12.5".into())));
        assert_eq!(node.height, Some(Dimension::Text("-1".into())));

        let node: MediaNode =
            serde_json::from_str(r#"{"src":"a.png","width":300,"height":"50%"}"#).unwrap();
        assert_eq!(node.width, Some(Dimension::Pixels(300)));
        assert_eq!(node.height, Some(Dimension::Text("50%".into())));
    }

    #[test]
    fn with_destination_preserves_other_attributes() {
        let node = MediaNode::new("a.png")
            .with_alt("cat")
            .with_size(10u32, "20em")
            .with_href("https://old.example");
        let relinked = node.with_destination(None);
        assert_eq!(relinked.href, None);
        assert_eq!(relinked.src.as_deref(), Some("a.png"));
        assert_eq!(relinked.alt.as_deref(), Some("cat"));
        assert_eq!(relinked.width, Some(Dimension::Pixels(10)));
        assert_eq!(relinked.height, Some(Dimension::Text("20em".into())));
    }

    #[test]
    fn inline_serializes_with_type_tag() {
        let json = serde_json::to_string(&Inline::Media(MediaNode::new("x.png"))).unwrap();
        assert_eq!(json, r#"{"type":"media","src":"x.png"}"#);
        let back: Inline = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_media().and_then(|m| m.src.as_deref()), Some("x.png"));
    }
}
