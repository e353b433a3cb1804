//! Package validation and read-back
//!
//! Checks that produced bytes are a Word package and summarises what it
//! contains, by reading it back with docx-rs.

use anyhow::{Result, bail};
use serde::Serialize;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// What a packed document contains
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageSummary {
    /// Text of every top-level paragraph, in order
    pub paragraphs: Vec<String>,
    pub tables: usize,
    pub table_rows: usize,
    pub images: usize,
    pub hyperlinks: usize,
    pub has_header: bool,
}

/// Validates that the file is a readable .docx package
pub fn validate_docx_file(file_path: &Path) -> Result<PackageSummary> {
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if extension != "docx" {
        bail!(
            "Invalid file format. Expected .docx file, got .{}",
            extension
        );
    }

    let data = std::fs::read(file_path)?;
    inspect_package(&data)
}

fn check_archive<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<bool> {
    if archive.by_name("word/document.xml").is_err() {
        // Check if it might be an Excel file
        if archive.by_name("xl/workbook.xml").is_ok() {
            bail!("This appears to be an Excel file (.xlsx), not a Word document.");
        }

        bail!(
            "Invalid .docx file: missing word/document.xml\n\
            The package may be corrupted or is not a Word document."
        );
    }

    Ok(archive
        .file_names()
        .any(|name| name.starts_with("word/header")))
}

/// Read packed bytes back and summarise them
pub fn inspect_package(data: &[u8]) -> Result<PackageSummary> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let has_header = check_archive(&mut archive)?;

    let docx = docx_rs::read_docx(data)?;
    let mut summary = PackageSummary {
        has_header,
        ..PackageSummary::default()
    };

    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(para) => {
                summary.images += count_drawings(para);
                summary.hyperlinks += para
                    .children
                    .iter()
                    .filter(|c| matches!(c, docx_rs::ParagraphChild::Hyperlink(_)))
                    .count();
                summary.paragraphs.push(paragraph_text(para));
            }
            docx_rs::DocumentChild::Table(table) => {
                summary.tables += 1;
                summary.table_rows += table.rows.len();
            }
            _ => {}
        }
    }

    Ok(summary)
}

/// Extract plain text from a paragraph, hyperlinks included
pub(crate) fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    collect_children_text(&para.children, &mut text);
    text
}

fn collect_children_text(children: &[docx_rs::ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            docx_rs::ParagraphChild::Run(run) => text.push_str(&run_text(run)),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                collect_children_text(&link.children, text);
            }
            _ => {}
        }
    }
}

fn run_text(run: &docx_rs::Run) -> String {
    let mut text = String::new();

    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text_elem) => text.push_str(&text_elem.text),
            docx_rs::RunChild::Tab(_) => text.push('\t'),
            docx_rs::RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }

    text
}

fn count_drawings(para: &docx_rs::Paragraph) -> usize {
    para.children
        .iter()
        .filter_map(|child| match child {
            docx_rs::ParagraphChild::Run(run) => Some(run),
            _ => None,
        })
        .flat_map(|run| run.children.iter())
        .filter(|child| matches!(child, docx_rs::RunChild::Drawing(_)))
        .count()
}
