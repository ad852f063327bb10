//! HTML parse rules.
//!
//! The fragment is tokenized with html5ever and folded into inline content.
//! Rules, most specific first:
//! 1. `<img src>` inside an `<a>`: media node, `href` taken from the anchor.
//! 2. bare `<img src>` (no `data:` source unless base64 is allowed): media
//!    node without `href`.
//! 3. text inside `<a href>`: text carrying a link mark.
//!
//! Anything else contributes its text only. Nothing here fails: markup that
//! matches no rule is dropped.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use super::MediaSchema;
use crate::model::{Dimension, Inline, LinkMark, MediaNode};

/// Elements that start and end a line of content.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Elements whose text is never document content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "template", "title", "head"];

#[derive(Debug, Clone, PartialEq)]
enum HtmlToken {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(String),
}

/// Token sink that just records tag and text tokens.
#[derive(Default)]
struct TokenCollector {
    tokens: Vec<HtmlToken>,
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let attrs = tag
                            .attrs
                            .iter()
                            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                            .collect();
                        self.tokens.push(HtmlToken::Start { name, attrs });
                    }
                    TagKind::EndTag => self.tokens.push(HtmlToken::End { name }),
                }
            }
            Token::CharacterTokens(text) => match self.tokens.last_mut() {
                Some(HtmlToken::Text(prev)) => prev.push_str(&text),
                _ => self.tokens.push(HtmlToken::Text(text.to_string())),
            },
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn tokenize(html: &str) -> Vec<HtmlToken> {
    let mut queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(html));
    let mut tokenizer = Tokenizer::new(TokenCollector::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();
    tokenizer.sink.tokens
}

pub(super) fn parse_content(schema: &MediaSchema, html: &str) -> Vec<Inline> {
    let mut builder = ContentBuilder::new(schema);
    for token in tokenize(html) {
        builder.token(token);
    }
    builder.finish()
}

struct ContentBuilder<'s> {
    schema: &'s MediaSchema,
    content: Vec<Inline>,
    /// `href` of each open anchor, innermost last.
    anchors: Vec<Option<String>>,
    /// Something was emitted since the last line break.
    line_has_content: bool,
    /// A block element is open and has not yet produced its line break.
    block_open: bool,
    skip_depth: usize,
}

impl<'s> ContentBuilder<'s> {
    fn new(schema: &'s MediaSchema) -> Self {
        Self {
            schema,
            content: Vec::new(),
            anchors: Vec::new(),
            line_has_content: false,
            block_open: false,
            skip_depth: 0,
        }
    }

    fn token(&mut self, token: HtmlToken) {
        match token {
            HtmlToken::Start { name, attrs } => self.start_tag(&name, attrs),
            HtmlToken::End { name } => self.end_tag(&name),
            HtmlToken::Text(text) if self.skip_depth == 0 => self.text(&text),
            HtmlToken::Text(_) => {}
        }
    }

    fn start_tag(&mut self, name: &str, attrs: Vec<(String, String)>) {
        if SKIPPED_ELEMENTS.contains(&name) {
            self.skip_depth += 1;
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        match name {
            "a" => {
                let href = attr(&attrs, "href").map(str::to_owned);
                self.anchors.push(href);
            }
            "img" => self.image(&attrs),
            "br" => self.line_break(),
            _ if BLOCK_ELEMENTS.contains(&name) => {
                if self.line_has_content {
                    self.line_break();
                }
                self.block_open = true;
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        if SKIPPED_ELEMENTS.contains(&name) {
            self.skip_depth = self.skip_depth.saturating_sub(1);
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        match name {
            "a" => {
                self.anchors.pop();
            }
            _ if BLOCK_ELEMENTS.contains(&name) => {
                if self.line_has_content || self.block_open {
                    self.line_break();
                }
                self.block_open = false;
            }
            _ => {}
        }
    }

    fn image(&mut self, attrs: &[(String, String)]) {
        let Some(src) = attr(attrs, "src") else {
            return;
        };
        if !self.schema.allows_base64() && is_data_url(src) {
            tracing::trace!("skipping base64 image source");
            return;
        }
        let node = MediaNode {
            src: Some(src.to_owned()),
            alt: attr(attrs, "alt").map(str::to_owned),
            title: attr(attrs, "title").map(str::to_owned),
            width: attr(attrs, "width").map(Dimension::parse),
            height: attr(attrs, "height").map(Dimension::parse),
            // Rule 1: the innermost open anchor owns the destination, even
            // when other elements sit between it and the image.
            href: self.anchors.last().cloned().flatten(),
        };
        self.content.push(Inline::Media(node));
        self.line_has_content = true;
    }

    fn text(&mut self, raw: &str) {
        let mut prev_space = !self.line_has_content || self.ends_with_space();
        let mut collapsed = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_whitespace() {
                if !prev_space {
                    collapsed.push(' ');
                    prev_space = true;
                }
            } else {
                collapsed.push(c);
                prev_space = false;
            }
        }
        if collapsed.is_empty() {
            return;
        }
        let link = self
            .anchors
            .last()
            .cloned()
            .flatten()
            .map(LinkMark::new);
        self.push_text(collapsed, link);
        self.line_has_content = true;
    }

    fn push_text(&mut self, text: String, link: Option<LinkMark>) {
        match self.content.last_mut() {
            Some(Inline::Text {
                text: prev,
                link: prev_link,
            }) if *prev_link == link => prev.push_str(&text),
            _ => self.content.push(Inline::Text { text, link }),
        }
    }

    fn ends_with_space(&self) -> bool {
        matches!(self.content.last(), Some(Inline::Text { text, .. }) if text.ends_with(' '))
    }

    fn line_break(&mut self) {
        if let Some(Inline::Text { text, .. }) = self.content.last_mut() {
            let trimmed = text.trim_end_matches(' ').len();
            text.truncate(trimmed);
            if text.is_empty() {
                self.content.pop();
            }
        }
        self.push_text("\n".to_owned(), None);
        self.line_has_content = false;
    }

    fn finish(mut self) -> Vec<Inline> {
        if self.line_has_content {
            self.line_break();
        }
        // The last line break closes the final paragraph; it is not content.
        if let Some(Inline::Text { text, .. }) = self.content.last_mut() {
            if text.ends_with('\n') {
                text.pop();
                if text.is_empty() {
                    self.content.pop();
                }
            }
        }
        self.content
    }
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn is_data_url(src: &str) -> bool {
    src.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}
