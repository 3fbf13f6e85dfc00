//! Minimal typed HTML document builder.
//!
//! The report only needs headings, inline images, paragraphs and separators,
//! so the document is a flat list of [`Block`]s serialised in one pass. Text
//! and attribute values are escaped on output.

use std::borrow::Cow;
use std::fmt::Write as _;

/// One body element of an [`HtmlDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `<hN>text</hN><br>`
    Heading {
        /// Heading level, 1-6.
        level: u8,
        /// Heading text (unescaped).
        text: String,
    },
    /// `<img src=".." title=".."/>`
    Image {
        /// Image source, usually a data URI.
        src: String,
        /// Hover text (unescaped).
        title: String,
    },
    /// `<p>text</p>`
    Paragraph(String),
    /// `<hr><br><br>`
    Separator,
}

/// A single self-contained HTML page.
#[derive(Debug, Clone, Default)]
pub struct HtmlDocument {
    title: String,
    body: Vec<Block>,
}

impl HtmlDocument {
    /// Create an empty document with the given page title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Vec::new(),
        }
    }

    /// Append a heading. The level is clamped to 1..=6.
    pub fn heading(&mut self, level: u8, text: impl Into<String>) -> &mut Self {
        self.body.push(Block::Heading {
            level: level.clamp(1, 6),
            text: text.into(),
        });
        self
    }

    /// Append an image.
    pub fn image(&mut self, src: impl Into<String>, title: impl Into<String>) -> &mut Self {
        self.body.push(Block::Image {
            src: src.into(),
            title: title.into(),
        });
        self
    }

    /// Append a paragraph.
    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.body.push(Block::Paragraph(text.into()));
        self
    }

    /// Append a section separator.
    pub fn separator(&mut self) -> &mut Self {
        self.body.push(Block::Separator);
        self
    }

    /// Body blocks in document order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.body
    }

    /// Serialise to HTML text.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(
            512 + self
                .body
                .iter()
                .map(|b| match b {
                    Block::Image { src, .. } => src.len() + 64,
                    _ => 64,
                })
                .sum::<usize>(),
        );

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "  <title>{}</title>", escape(&self.title));
        html.push_str("</head>\n<body>\n");

        for block in &self.body {
            match block {
                Block::Heading { level, text } => {
                    let _ = writeln!(html, "  <h{level}>{}</h{level}><br>", escape(text));
                }
                Block::Image { src, title } => {
                    let _ = writeln!(
                        html,
                        r#"  <img src="{}" title="{}"/>"#,
                        escape(src),
                        escape(title)
                    );
                }
                Block::Paragraph(text) => {
                    let _ = writeln!(html, "  <p>{}</p>", escape(text));
                }
                Block::Separator => html.push_str("  <hr><br><br>\n"),
            }
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Escape text for use in element content or a double-quoted attribute.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
