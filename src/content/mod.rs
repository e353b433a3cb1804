//! Rich-text content conversion
//!
//! Parses editor content into `BlockNode`s and converts them into
//! `ConvertedParagraph`s for the writer.

pub mod convert;
pub mod image;
pub mod models;
pub mod parsing;

pub use convert::{convert_block, convert_blocks};
pub use models::*;
pub use parsing::parse_content;

use crate::ContentFormat;
use crate::error::Result;
use crate::theme::Theme;

/// Parse raw content and convert it in one step
pub fn convert_content(
    raw: &str,
    format: ContentFormat,
    theme: &Theme,
) -> Result<Vec<ConvertedParagraph>> {
    let blocks = parse_content(raw, format)?;
    Ok(convert_blocks(&blocks, theme))
}
