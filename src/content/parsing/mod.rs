//! Content parsing utilities
//!
//! This module contains the front ends that turn raw editor content into
//! `BlockNode` trees, plus the inline run extractor shared by the converter.

pub(crate) mod formatting;
pub mod html;
pub mod tiptap;

use log::debug;

use super::models::BlockNode;
use crate::error::Result;
use crate::ContentFormat;

/// Parse raw content in the given format
///
/// `Auto` treats input starting with `{` as TipTap JSON and falls back to
/// HTML when it does not parse.
pub fn parse_content(raw: &str, format: ContentFormat) -> Result<Vec<BlockNode>> {
    match format {
        ContentFormat::Html => Ok(html::parse_html(raw)),
        ContentFormat::Tiptap => tiptap::parse_tiptap_str(raw),
        ContentFormat::Auto => {
            if looks_like_json(raw) {
                match tiptap::parse_tiptap_str(raw) {
                    Ok(blocks) => return Ok(blocks),
                    Err(err) => debug!("content is not TipTap JSON ({err}), parsing as HTML"),
                }
            }
            Ok(html::parse_html(raw))
        }
    }
}

fn looks_like_json(raw: &str) -> bool {
    raw.trim_start().starts_with('{')
}
