//! Core data structures for content conversion
//!
//! This module defines the parsed content tree (`BlockNode` / `InlineNode`)
//! and the converter output (`ConvertedParagraph` and its runs).

use serde::{Deserialize, Serialize};

/// Structural content unit occupying its own line(s) in the rendered document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockNode {
    Paragraph {
        alignment: Option<TextAlignment>,
        content: Vec<InlineNode>,
    },
    Heading {
        level: u8,
        alignment: Option<TextAlignment>,
        content: Vec<InlineNode>,
    },
    BulletList {
        items: Vec<ListItemNode>,
    },
    OrderedList {
        items: Vec<ListItemNode>,
    },
    Blockquote {
        children: Vec<BlockNode>,
    },
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    Image {
        src: String,
        alt: Option<String>,
    },
    HorizontalRule,
    Link {
        href: String,
        text: String,
    },
    Unknown {
        children: Vec<BlockNode>,
    },
}

impl BlockNode {
    /// Raw concatenated text of this node, without any styling
    pub fn text_content(&self) -> String {
        match self {
            BlockNode::Paragraph { content, .. } | BlockNode::Heading { content, .. } => {
                inline_text(content)
            }
            BlockNode::BulletList { items } | BlockNode::OrderedList { items } => items
                .iter()
                .map(ListItemNode::text_content)
                .collect::<Vec<_>>()
                .join("\n"),
            BlockNode::Blockquote { children } | BlockNode::Unknown { children } => children
                .iter()
                .map(BlockNode::text_content)
                .collect::<Vec<_>>()
                .join("\n"),
            BlockNode::CodeBlock { text, .. } => text.clone(),
            BlockNode::Image { alt, .. } => alt.clone().unwrap_or_default(),
            BlockNode::HorizontalRule => String::new(),
            BlockNode::Link { href, text } => {
                if text.trim().is_empty() {
                    href.clone()
                } else {
                    text.clone()
                }
            }
        }
    }

    /// Inline content of a text-bearing block, if any
    pub fn inline_content(&self) -> Option<&[InlineNode]> {
        match self {
            BlockNode::Paragraph { content, .. } | BlockNode::Heading { content, .. } => {
                Some(content)
            }
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            BlockNode::BulletList { .. } | BlockNode::OrderedList { .. }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItemNode {
    pub children: Vec<BlockNode>,
}

impl ListItemNode {
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .map(BlockNode::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Inline content inside a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InlineNode {
    Text(String),
    Marked {
        mark: Mark,
        children: Vec<InlineNode>,
    },
    HardBreak,
    /// Unrecognised element; its children are passed through unstyled
    Container(Vec<InlineNode>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link { href: String },
}

pub(crate) fn inline_text(content: &[InlineNode]) -> String {
    let mut text = String::new();
    for node in content {
        match node {
            InlineNode::Text(t) => text.push_str(t),
            InlineNode::HardBreak => text.push('\n'),
            InlineNode::Marked { children, .. } | InlineNode::Container(children) => {
                text.push_str(&inline_text(children));
            }
        }
    }
    text
}

/// Style context for a run
///
/// Flags are only ever set while descending the tree, never toggled, so a
/// `strong` inside an `em` ends up both bold and italic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextFormatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    /// Monospace font
    pub code: bool,
    /// Link colour and underline
    pub link: bool,
    /// Size in half-points
    pub font_size: Option<usize>,
    pub color: Option<String>,
}

impl TextFormatting {
    /// Return a copy with the flag for `mark` switched on
    pub fn with_mark(&self, mark: &Mark) -> TextFormatting {
        let mut next = self.clone();
        match mark {
            Mark::Bold => next.bold = true,
            Mark::Italic => next.italic = true,
            Mark::Underline => next.underline = true,
            Mark::Strike => next.strikethrough = true,
            Mark::Code => next.code = true,
            Mark::Link { .. } => {
                next.link = true;
                next.underline = true;
            }
        }
        next
    }

    /// OR the flags of `other` into a copy of `self`; explicit size and colour win from `other`
    pub fn merge(&self, other: &TextFormatting) -> TextFormatting {
        TextFormatting {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
            strikethrough: self.strikethrough || other.strikethrough,
            code: self.code || other.code,
            link: self.link || other.link,
            font_size: other.font_size.or(self.font_size),
            color: other.color.clone().or_else(|| self.color.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRun {
    pub text: String,
    pub formatting: TextFormatting,
    /// Target of an enclosing link mark
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
}

impl FormattedRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formatting: TextFormatting::default(),
            hyperlink: None,
        }
    }

    pub fn styled(text: impl Into<String>, formatting: TextFormatting) -> Self {
        Self {
            text: text.into(),
            formatting,
            hyperlink: None,
        }
    }

    /// Consolidate adjacent runs with identical formatting into single runs
    pub fn consolidate_runs(runs: Vec<FormattedRun>) -> Vec<FormattedRun> {
        let mut consolidated: Vec<FormattedRun> = Vec::with_capacity(runs.len());

        for run in runs {
            match consolidated.last_mut() {
                Some(current)
                    if current.formatting == run.formatting
                        && current.hyperlink == run.hyperlink =>
                {
                    current.text.push_str(&run.text);
                }
                _ => consolidated.push(run),
            }
        }

        consolidated
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlignment {
    pub fn from_attr(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(TextAlignment::Left),
            "center" => Some(TextAlignment::Center),
            "right" | "end" => Some(TextAlignment::Right),
            "justify" => Some(TextAlignment::Justify),
            _ => None,
        }
    }
}

/// Spacing before/after a paragraph, in twentieths of a point
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Spacing {
    pub before: u32,
    pub after: u32,
}

impl Spacing {
    pub const fn after(after: u32) -> Self {
        Self { before: 0, after }
    }

    pub const fn new(before: u32, after: u32) -> Self {
        Self { before, after }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListMarker {
    pub kind: ListKind,
    pub level: u8,
    /// First item of a list; ordered numbering starts again from 1 here
    pub restart: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Border {
    pub color: String,
    /// Eighths of a point
    pub size: usize,
    /// Points
    pub space: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParagraphProperties {
    pub alignment: TextAlignment,
    pub spacing: Spacing,
    pub heading_level: Option<u8>,
    pub list: Option<ListMarker>,
    pub left_border: Option<Border>,
    /// Background fill applied behind every run
    pub shading: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageSubtype {
    Jpg,
    Png,
    Gif,
    Bmp,
    Svg,
}

impl ImageSubtype {
    /// Map a declared MIME type (`image/jpeg`, `image/svg+xml`, ...) to a subtype
    pub fn from_mime(mime: &str) -> Self {
        let subtype = mime
            .trim()
            .to_ascii_lowercase()
            .strip_prefix("image/")
            .map(str::to_string)
            .unwrap_or_default();

        match subtype.as_str() {
            "jpeg" | "jpg" | "pjpeg" => ImageSubtype::Jpg,
            "gif" => ImageSubtype::Gif,
            "bmp" | "x-ms-bmp" => ImageSubtype::Bmp,
            "svg" | "svg+xml" => ImageSubtype::Svg,
            _ => ImageSubtype::Png,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageSubtype::Jpg => "jpg",
            ImageSubtype::Png => "png",
            ImageSubtype::Gif => "gif",
            ImageSubtype::Bmp => "bmp",
            ImageSubtype::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedImage {
    pub subtype: ImageSubtype,
    /// Decoded image bytes, re-encoded as PNG
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Display size in pixels
    pub width: u32,
    pub height: u32,
}

/// Converter output unit, ready for serialisation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConvertedParagraph {
    pub runs: Vec<FormattedRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbeddedImage>,
    pub properties: ParagraphProperties,
}

impl ConvertedParagraph {
    pub fn new(runs: Vec<FormattedRun>) -> Self {
        Self {
            runs,
            image: None,
            properties: ParagraphProperties::default(),
        }
    }

    pub fn spacing(mut self, spacing: Spacing) -> Self {
        self.properties.spacing = spacing;
        self
    }

    pub fn align(mut self, alignment: TextAlignment) -> Self {
        self.properties.alignment = alignment;
        self
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}
