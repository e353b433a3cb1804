//! DOCX serialisation with docx-rs

use docx_rs::*;
use log::{debug, warn};
use std::io::Cursor;

use super::numbering::{LIST_LEVELS, ListNumbering};
use crate::briefing::{BriefingDocument, DocumentBlock, TableBlock};
use crate::content::{ConvertedParagraph, FormattedRun, TextAlignment};
use crate::error::{ExportError, Result};
use crate::theme::Theme;

/// English Metric Units per pixel at 96 DPI
pub const EMU_PER_PIXEL: u32 = 9525;

/// Serialises converted paragraphs and briefing documents into DOCX bytes
pub struct DocxWriter<'a> {
    theme: &'a Theme,
    numbering: ListNumbering,
}

impl<'a> DocxWriter<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            numbering: ListNumbering::new(),
        }
    }

    /// Write a full briefing, page header included
    pub fn write(&mut self, document: &BriefingDocument) -> Result<Vec<u8>> {
        self.numbering = ListNumbering::new();
        let mut docx = self.initialize_styles(Docx::new());

        if !document.header.is_empty() {
            let mut header = Header::new();
            for paragraph in &document.header {
                let (next, para) = self.build_paragraph(docx, paragraph);
                docx = next;
                header = header.add_paragraph(para);
            }
            docx = docx.header(header);
        }

        for block in &document.blocks {
            docx = match block {
                DocumentBlock::Paragraph(paragraph) => {
                    let (next, para) = self.build_paragraph(docx, paragraph);
                    next.add_paragraph(para)
                }
                DocumentBlock::Table(table) => docx.add_table(self.build_table(table)),
            };
        }

        debug!("packing {} blocks", document.blocks.len());
        Self::pack(docx)
    }

    /// Write bare converted content without any briefing layout
    pub fn write_paragraphs(&mut self, paragraphs: &[ConvertedParagraph]) -> Result<Vec<u8>> {
        self.numbering = ListNumbering::new();
        let mut docx = self.initialize_styles(Docx::new());

        for paragraph in paragraphs {
            let (next, para) = self.build_paragraph(docx, paragraph);
            docx = next.add_paragraph(para);
        }

        Self::pack(docx)
    }

    fn pack(docx: Docx) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        docx.build()
            .pack(&mut Cursor::new(&mut buffer))
            .map_err(|e| ExportError::Pack(e.to_string()))?;
        Ok(buffer)
    }

    fn initialize_styles(&self, docx: Docx) -> Docx {
        let heading = |level: usize, size: usize| {
            Style::new(format!("Heading{level}"), StyleType::Paragraph)
                .name(format!("Heading {level}"))
                .size(size)
                .bold()
        };

        let hyperlink = Style::new("Hyperlink", StyleType::Character)
            .name("Hyperlink")
            .color(self.theme.colors.link.as_str())
            .underline("single");

        docx.add_style(heading(1, 28))
            .add_style(heading(2, 24))
            .add_style(heading(3, 20))
            .add_style(hyperlink)
    }

    fn fonts(name: &str) -> RunFonts {
        RunFonts::new()
            .ascii(name)
            .hi_ansi(name)
            .east_asia(name)
            .cs(name)
    }

    fn build_paragraph(
        &mut self,
        mut docx: Docx,
        paragraph: &ConvertedParagraph,
    ) -> (Docx, Paragraph) {
        let props = &paragraph.properties;

        let mut para = Paragraph::new().align(alignment_type(props.alignment)).line_spacing(
            LineSpacing::new()
                .before(props.spacing.before)
                .after(props.spacing.after),
        );

        if let Some(level) = props.heading_level {
            para = para.style(&format!("Heading{level}"));
        }

        if let Some(marker) = props.list {
            let (next, id) = self.numbering.numbering_for(docx, marker);
            docx = next;
            let level = usize::from(marker.level).min(LIST_LEVELS - 1);
            para = para.numbering(NumberingId::new(id), IndentLevel::new(level));
        }

        if let Some(border) = &props.left_border {
            para = para.set_borders(
                ParagraphBorders::with_empty().set(
                    ParagraphBorder::new(ParagraphBorderPosition::Left)
                        .val(BorderType::Single)
                        .size(border.size)
                        .space(border.space)
                        .color(border.color.as_str()),
                ),
            );
        }

        if let Some(image) = &paragraph.image {
            if image.data.is_empty() {
                warn!("skipping image without data");
            } else {
                let pic = Pic::new(&image.data).size(
                    image.width.saturating_mul(EMU_PER_PIXEL),
                    image.height.saturating_mul(EMU_PER_PIXEL),
                );
                para = para.add_run(Run::new().add_image(pic));
            }
        }

        // Consecutive runs with the same target share one hyperlink
        let runs = &paragraph.runs;
        let shading = props.shading.as_deref();
        let mut index = 0;
        while index < runs.len() {
            match &runs[index].hyperlink {
                Some(url) => {
                    let mut link = Hyperlink::new(url.as_str(), HyperlinkType::External);
                    while index < runs.len() && runs[index].hyperlink.as_ref() == Some(url) {
                        link = link.add_run(self.build_run(&runs[index], shading));
                        index += 1;
                    }
                    para = para.add_hyperlink(link);
                }
                None => {
                    para = para.add_run(self.build_run(&runs[index], shading));
                    index += 1;
                }
            }
        }

        (docx, para)
    }

    fn build_run(&self, run: &FormattedRun, shading: Option<&str>) -> Run {
        let formatting = &run.formatting;
        let font = if formatting.code {
            &self.theme.fonts.monospace
        } else {
            &self.theme.fonts.body
        };

        let mut docx_run = Run::new().fonts(Self::fonts(font));

        if run.text.is_empty() {
            docx_run = docx_run.add_text("");
        }
        for (i, line) in run.text.split('\n').enumerate() {
            if i > 0 {
                docx_run = docx_run.add_break(BreakType::TextWrapping);
            }
            if !line.is_empty() {
                docx_run = docx_run.add_text(line);
            }
        }

        if formatting.bold {
            docx_run = docx_run.bold();
        }
        if formatting.italic {
            docx_run = docx_run.italic();
        }
        if formatting.underline {
            docx_run = docx_run.underline("single");
        }
        if formatting.strikethrough {
            docx_run = docx_run.strike();
        }
        if let Some(size) = formatting.font_size {
            docx_run = docx_run.size(size);
        }
        if let Some(color) = &formatting.color {
            docx_run = docx_run.color(color.as_str());
        }
        if let Some(fill) = shading {
            docx_run = docx_run.shading(Shading::new().fill(fill));
        }

        docx_run
    }

    fn build_table(&self, table: &TableBlock) -> Table {
        let width = |column: usize| table.widths.get(column).copied().unwrap_or(0);

        let mut rows = vec![TableRow::new(
            table
                .header
                .iter()
                .enumerate()
                .map(|(i, title)| self.table_cell(title, width(i), true))
                .collect(),
        )];
        rows.extend(table.rows.iter().map(|row| {
            TableRow::new(
                row.iter()
                    .enumerate()
                    .map(|(i, text)| self.table_cell(text, width(i), false))
                    .collect(),
            )
        }));

        // Percent widths are given in fiftieths of a percent
        Table::new(rows).width(5000, WidthType::Pct)
    }

    fn table_cell(&self, text: &str, width_percent: usize, header: bool) -> TableCell {
        let mut run = Run::new()
            .add_text(text)
            .size(20)
            .fonts(Self::fonts(&self.theme.fonts.body));
        if header {
            run = run
                .bold()
                .color(self.theme.colors.table_header_text.as_str());
        }

        let mut cell = TableCell::new()
            .width(width_percent * 50, WidthType::Pct)
            .vertical_align(VAlignType::Center)
            .add_paragraph(Paragraph::new().add_run(run));
        if header {
            cell = cell.shading(Shading::new().fill(self.theme.colors.accent.as_str()));
        }
        cell
    }
}

fn alignment_type(alignment: TextAlignment) -> AlignmentType {
    match alignment {
        TextAlignment::Left => AlignmentType::Left,
        TextAlignment::Center => AlignmentType::Center,
        TextAlignment::Right => AlignmentType::Right,
        TextAlignment::Justify => AlignmentType::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        BlockNode, EmbeddedImage, ImageSubtype, InlineNode, Spacing, TextFormatting, convert_block,
    };
    use crate::inspect::inspect_package;
    use std::io::Read;

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip package");
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .expect("document part")
            .read_to_string(&mut xml)
            .expect("utf-8 xml");
        xml
    }

    fn paragraph_texts(bytes: &[u8]) -> Vec<String> {
        inspect_package(bytes)
            .expect("package should read back")
            .paragraphs
    }

    #[test]
    fn test_empty_paragraph_list_still_packs() {
        let theme = Theme::default();
        let bytes = DocxWriter::new(&theme)
            .write_paragraphs(&[])
            .expect("packs");
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_paragraph_text_survives_packing() {
        let theme = Theme::default();
        let paragraphs = vec![
            ConvertedParagraph::new(vec![
                FormattedRun::plain("Plain "),
                FormattedRun::styled(
                    "bold",
                    TextFormatting {
                        bold: true,
                        ..TextFormatting::default()
                    },
                ),
            ])
            .spacing(Spacing::after(100)),
            ConvertedParagraph::new(vec![FormattedRun::plain("Second")]),
        ];

        let bytes = DocxWriter::new(&theme)
            .write_paragraphs(&paragraphs)
            .expect("packs");
        assert_eq!(paragraph_texts(&bytes), ["Plain bold", "Second"]);
    }

    #[test]
    fn test_blockquote_left_border_is_written() {
        let theme = Theme::default();
        let quote = convert_block(
            &BlockNode::Blockquote {
                children: vec![BlockNode::Paragraph {
                    alignment: None,
                    content: vec![InlineNode::Text("Official statement".to_string())],
                }],
            },
            &theme,
        );

        let bytes = DocxWriter::new(&theme)
            .write_paragraphs(&quote)
            .expect("packs");
        let xml = document_xml(&bytes);

        let borders = xml.find("<w:pBdr").expect("paragraph borders");
        let end = xml[borders..].find("</w:pBdr>").expect("closed borders") + borders;
        assert!(xml[borders..end].contains("<w:left"));
        assert!(xml[borders..end].contains("009EDB"));
    }

    #[test]
    fn test_oversized_image_dimensions_do_not_overflow() {
        let theme = Theme::default();
        let pixel = image::RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]));
        let mut png = Vec::new();
        pixel
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode png");

        let mut paragraph = ConvertedParagraph::new(Vec::new());
        paragraph.image = Some(EmbeddedImage {
            subtype: ImageSubtype::Png,
            data: png,
            width: u32::MAX,
            height: 1_000_000,
        });

        let bytes = DocxWriter::new(&theme)
            .write_paragraphs(&[paragraph])
            .expect("packs");
        assert_eq!(&bytes[..2], b"PK");
    }
}
