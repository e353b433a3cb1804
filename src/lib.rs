//! briefing-docx: rich-text briefing content to Word documents
//!
//! This library converts editor content (HTML or TipTap JSON) into styled
//! paragraphs, lays out daily briefings and writes them as .docx files.

pub mod briefing;
pub mod content;
pub mod error;
pub mod inspect;
pub mod theme;
pub mod writer;

/// Input content format
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentFormat {
    /// Detect TipTap JSON, otherwise HTML
    #[default]
    Auto,
    Html,
    Tiptap,
}

// Re-export commonly used types
pub use briefing::{BriefingAssembler, BriefingDocument, BriefingEntry};
pub use content::{ConvertedParagraph, convert_content};
pub use error::{ExportError, Result};
pub use theme::Theme;
pub use writer::{DOCX_MIME, DocxWriter, to_data_uri};
