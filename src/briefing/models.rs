//! Briefing entry data
//!
//! Entries arrive as the JSON records the briefing app stores, with
//! camelCase keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::content::ConvertedParagraph;

/// One submitted briefing entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BriefingEntry {
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    /// Raw priority label, see [`Priority::from_label`]
    #[serde(deserialize_with = "null_as_default")]
    pub priority: String,
    #[serde(deserialize_with = "null_as_default")]
    pub region: String,
    /// `null` means no country
    #[serde(deserialize_with = "null_as_default")]
    pub country: Country,
    #[serde(deserialize_with = "null_as_default")]
    pub headline: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    /// Body as HTML or TipTap JSON
    #[serde(deserialize_with = "null_as_default")]
    pub entry: String,
    pub source_name: Option<String>,
    pub source_date: Option<String>,
    pub source_url: Option<String>,
    pub pu_note: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub images: Vec<EntryImage>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl BriefingEntry {
    pub fn priority(&self) -> Priority {
        Priority::from_label(&self.priority)
    }
}

/// A single country or a combination of countries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Country {
    One(String),
    Many(Vec<String>),
}

impl Default for Country {
    fn default() -> Self {
        Country::One(String::new())
    }
}

impl Country {
    /// Non-blank country names, in the order given
    pub fn names(&self) -> Vec<&str> {
        let names: Vec<&str> = match self {
            Country::One(name) => vec![name.as_str()],
            Country::Many(names) => names.iter().map(String::as_str).collect(),
        };
        names
            .into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Grouping key; every distinct combination forms its own group
    pub fn group_key(&self) -> String {
        self.names().join(" / ")
    }

    /// Compact form for the table of contents
    pub fn display(&self) -> String {
        self.names().join("/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    SgAttention,
    SituationalAwareness,
}

impl Priority {
    /// Accepts both the stored value and the display label
    ///
    /// Anything unrecognised, including an empty label, is situational awareness.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "sg-attention" | "Secretary-General's Attention" | "SG Attention" => {
                Priority::SgAttention
            }
            _ => Priority::SituationalAwareness,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::SgAttention => "SG Attention",
            Priority::SituationalAwareness => "Situational Awareness",
        }
    }
}

/// Image uploaded through the editor, referenced from the body as
/// `image-ref://img-<position>`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryImage {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub position: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub mime_type: String,
    /// Where the CLI finds the bytes, relative to the entries file
    pub path: Option<PathBuf>,
}

/// Five-column table of contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    /// Column widths in percent of the page width
    pub widths: Vec<usize>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DocumentBlock {
    Paragraph(ConvertedParagraph),
    Table(TableBlock),
}

/// Fully assembled briefing, ready for the writer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BriefingDocument {
    /// Page header on every page
    pub header: Vec<ConvertedParagraph>,
    pub blocks: Vec<DocumentBlock>,
}

impl BriefingDocument {
    /// Paragraphs in body order, skipping tables
    pub fn paragraphs(&self) -> impl Iterator<Item = &ConvertedParagraph> {
        self.blocks.iter().filter_map(|block| match block {
            DocumentBlock::Paragraph(paragraph) => Some(paragraph),
            DocumentBlock::Table(_) => None,
        })
    }
}
