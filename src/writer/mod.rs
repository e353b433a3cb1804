//! Document serialisation

mod docx;
mod numbering;

pub use docx::{DocxWriter, EMU_PER_PIXEL};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// MIME type of a .docx package
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Wrap packed document bytes in a data URI, e.g. for an email attachment
pub fn to_data_uri(bytes: &[u8]) -> String {
    format!("data:{DOCX_MIME};base64,{}", STANDARD.encode(bytes))
}
