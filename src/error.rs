//! Error types for content conversion and document export

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid TipTap JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to pack DOCX: {0}")]
    Pack(String),

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
