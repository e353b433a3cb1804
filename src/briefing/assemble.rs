//! Briefing document assembly
//!
//! Lays out a full briefing: title, date, table of contents, then every
//! entry grouped by region and country, and a closing timestamp.

use chrono::NaiveDateTime;
use log::{debug, warn};

use super::dates::{format_date_long, format_exported_at, format_source_date};
use super::grouping::{RegionGroup, group_entries};
use super::images::{strip_image_nodes, strip_images};
use super::models::*;
use crate::ContentFormat;
use crate::content::convert::{RULE_GLYPH, convert_blocks};
use crate::content::parsing::parse_content;
use crate::content::*;
use crate::theme::Theme;

/// Separator closing the title block, the contents and every group
pub const LONG_SEPARATOR: usize = 63;
/// Separator between entries of the same group
pub const SHORT_SEPARATOR: usize = 40;

const TOC_WIDTHS: [usize; 5] = [15, 15, 40, 15, 15];
const TOC_COLUMNS: [&str; 5] = ["Region", "Country", "Headline", "Category", "Priority"];
const NO_COUNTRY: &str = "(No country specified)";

pub struct BriefingAssembler<'a> {
    theme: &'a Theme,
    include_images: bool,
}

impl<'a> BriefingAssembler<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            include_images: true,
        }
    }

    /// Leave every image out of the entry bodies
    pub fn include_images(mut self, include: bool) -> Self {
        self.include_images = include;
        self
    }

    /// Assemble the briefing for `date` (`YYYY-MM-DD`)
    pub fn assemble(
        &self,
        entries: &[BriefingEntry],
        date: &str,
        exported_at: NaiveDateTime,
    ) -> crate::Result<BriefingDocument> {
        let groups = group_entries(entries);
        debug!(
            "assembling {} entries in {} regions",
            entries.len(),
            groups.len()
        );

        let mut blocks = vec![
            DocumentBlock::Paragraph(self.title()),
            DocumentBlock::Paragraph(self.date_line(date)?),
            DocumentBlock::Paragraph(separator(LONG_SEPARATOR, Spacing::after(200))),
        ];
        blocks.extend(self.table_of_contents(&groups));

        for group in &groups {
            blocks.push(DocumentBlock::Paragraph(self.region_heading(&group.region)));

            for country in &group.countries {
                blocks.push(DocumentBlock::Paragraph(self.country_heading(&country.country)));

                for (index, entry) in country.entries.iter().enumerate() {
                    blocks.extend(
                        self.entry_paragraphs(entry)
                            .into_iter()
                            .map(DocumentBlock::Paragraph),
                    );
                    if index + 1 < country.entries.len() {
                        blocks.push(DocumentBlock::Paragraph(separator(
                            SHORT_SEPARATOR,
                            Spacing::new(200, 200),
                        )));
                    }
                }

                blocks.push(DocumentBlock::Paragraph(separator(
                    LONG_SEPARATOR,
                    Spacing::after(200),
                )));
            }
        }

        blocks.push(DocumentBlock::Paragraph(self.footer(exported_at)));

        Ok(BriefingDocument {
            header: vec![self.classification_header()],
            blocks,
        })
    }

    fn accent(&self) -> Option<String> {
        Some(self.theme.colors.accent.clone())
    }

    fn title(&self) -> ConvertedParagraph {
        let run = FormattedRun::styled(
            self.theme.labels.title.as_str(),
            TextFormatting {
                bold: true,
                font_size: Some(32),
                color: self.accent(),
                ..TextFormatting::default()
            },
        );
        let mut paragraph = ConvertedParagraph::new(vec![run])
            .align(TextAlignment::Center)
            .spacing(Spacing::after(100));
        paragraph.properties.heading_level = Some(1);
        paragraph
    }

    fn date_line(&self, date: &str) -> crate::Result<ConvertedParagraph> {
        let run = FormattedRun::styled(
            format_date_long(date)?,
            TextFormatting {
                font_size: Some(24),
                color: self.accent(),
                ..TextFormatting::default()
            },
        );
        Ok(ConvertedParagraph::new(vec![run])
            .align(TextAlignment::Center)
            .spacing(Spacing::after(400)))
    }

    fn table_of_contents(&self, groups: &[RegionGroup<'_>]) -> Vec<DocumentBlock> {
        let mut heading = ConvertedParagraph::new(vec![FormattedRun::styled(
            self.theme.labels.table_of_contents.as_str(),
            TextFormatting {
                bold: true,
                font_size: Some(24),
                color: self.accent(),
                ..TextFormatting::default()
            },
        )])
        .spacing(Spacing::new(200, 300));
        heading.properties.heading_level = Some(2);

        let rows = groups
            .iter()
            .flat_map(|group| {
                group.countries.iter().flat_map(move |country| {
                    country.entries.iter().map(move |entry| {
                        let display = match entry.country.display() {
                            names if !names.is_empty() => names,
                            _ if !country.country.is_empty() => country.country.clone(),
                            _ => NO_COUNTRY.to_string(),
                        };
                        vec![
                            group.region.clone(),
                            display,
                            entry.headline.clone(),
                            entry.category.clone(),
                            entry.priority().label().to_string(),
                        ]
                    })
                })
            })
            .collect();

        let table = TableBlock {
            widths: TOC_WIDTHS.to_vec(),
            header: TOC_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        };

        vec![
            DocumentBlock::Paragraph(heading),
            DocumentBlock::Table(table),
            DocumentBlock::Paragraph(spacer(Spacing::after(200))),
            DocumentBlock::Paragraph(separator(LONG_SEPARATOR, Spacing::after(200))),
        ]
    }

    fn region_heading(&self, region: &str) -> ConvertedParagraph {
        let mut paragraph = ConvertedParagraph::new(vec![FormattedRun::styled(
            region,
            TextFormatting {
                bold: true,
                font_size: Some(24),
                color: self.accent(),
                ..TextFormatting::default()
            },
        )])
        .align(TextAlignment::Left)
        .spacing(Spacing::new(300, 200));
        paragraph.properties.heading_level = Some(2);
        paragraph
    }

    fn country_heading(&self, country: &str) -> ConvertedParagraph {
        if country.is_empty() {
            return spacer(Spacing::new(200, 100));
        }

        ConvertedParagraph::new(vec![FormattedRun::styled(
            country,
            TextFormatting {
                bold: true,
                font_size: Some(24),
                ..TextFormatting::default()
            },
        )])
        .spacing(Spacing::new(300, 200))
    }

    fn entry_paragraphs(&self, entry: &BriefingEntry) -> Vec<ConvertedParagraph> {
        let mut paragraphs = vec![
            ConvertedParagraph::new(vec![FormattedRun::styled(
                entry.headline.as_str(),
                TextFormatting {
                    bold: true,
                    font_size: Some(22),
                    ..TextFormatting::default()
                },
            )])
            .spacing(Spacing::after(100)),
        ];

        let meta = TextFormatting {
            italic: true,
            font_size: Some(20),
            ..TextFormatting::default()
        };
        paragraphs.push(
            ConvertedParagraph::new(vec![
                FormattedRun::styled(entry.priority().label(), meta.clone()),
                FormattedRun::styled(format!(" | {}", entry.category), meta),
            ])
            .spacing(Spacing::after(150)),
        );

        if !entry.entry.trim().is_empty() {
            paragraphs.extend(self.body(&entry.entry));
        }

        if let Some(source) = self.source_line(entry) {
            paragraphs.push(source);
        }

        if let Some(note) = entry.pu_note.as_deref().filter(|n| !n.trim().is_empty()) {
            paragraphs.extend(self.pu_note(note));
        }

        paragraphs
    }

    fn body(&self, raw: &str) -> Vec<ConvertedParagraph> {
        let raw = if self.include_images {
            raw.to_string()
        } else {
            strip_images(raw)
        };

        match parse_content(&raw, ContentFormat::Auto) {
            Ok(blocks) => {
                let blocks = if self.include_images {
                    blocks
                } else {
                    strip_image_nodes(blocks)
                };
                convert_blocks(&blocks, self.theme)
            }
            Err(err) => {
                warn!("entry body could not be parsed, using raw text: {err}");
                vec![ConvertedParagraph::new(vec![FormattedRun::plain(raw)]).spacing(Spacing::after(100))]
            }
        }
    }

    /// `Source: <name> | <date>`, with the name linked when a URL is known
    fn source_line(&self, entry: &BriefingEntry) -> Option<ConvertedParagraph> {
        let name = non_blank(entry.source_name.as_deref());
        let date = non_blank(entry.source_date.as_deref());
        if name.is_none() && date.is_none() {
            return None;
        }

        let italic = TextFormatting {
            italic: true,
            ..TextFormatting::default()
        };
        let mut runs = vec![FormattedRun::styled("Source: ", italic.clone())];

        if let Some(name) = name {
            match non_blank(entry.source_url.as_deref()) {
                Some(url) => {
                    let mut run = FormattedRun::styled(
                        name,
                        TextFormatting {
                            underline: true,
                            link: true,
                            color: Some(self.theme.colors.link.clone()),
                            ..italic.clone()
                        },
                    );
                    run.hyperlink = Some(url.to_string());
                    runs.push(run);
                }
                None => runs.push(FormattedRun::styled(name, italic.clone())),
            }
        }
        if name.is_some() && date.is_some() {
            runs.push(FormattedRun::styled(" | ", italic.clone()));
        }
        if let Some(date) = date {
            runs.push(FormattedRun::styled(format_source_date(date), italic));
        }

        Some(ConvertedParagraph::new(runs).spacing(Spacing::after(100)))
    }

    /// Note paragraphs; the first one is prefixed with a bold `PU Note:` label
    fn pu_note(&self, note: &str) -> Vec<ConvertedParagraph> {
        let prefix = FormattedRun::styled(
            "PU Note: ",
            TextFormatting {
                bold: true,
                italic: true,
                ..TextFormatting::default()
            },
        );
        let italic = TextFormatting {
            italic: true,
            ..TextFormatting::default()
        };

        let mut paragraphs = match parse_content(note, ContentFormat::Auto) {
            Ok(blocks) => convert_blocks(&blocks, self.theme),
            Err(err) => {
                warn!("PU note could not be parsed, using raw text: {err}");
                Vec::new()
            }
        };

        match paragraphs.first_mut() {
            Some(first) if first.image.is_none() => {
                for run in &mut first.runs {
                    run.formatting = run.formatting.merge(&italic);
                }
                first.runs.insert(0, prefix);
                first.properties.spacing = Spacing::after(100);
            }
            Some(_) => paragraphs.insert(
                0,
                ConvertedParagraph::new(vec![prefix]).spacing(Spacing::after(100)),
            ),
            None => paragraphs.push(
                ConvertedParagraph::new(vec![prefix, FormattedRun::styled(note.trim(), italic)])
                    .spacing(Spacing::after(100)),
            ),
        }

        paragraphs
    }

    fn footer(&self, exported_at: NaiveDateTime) -> ConvertedParagraph {
        ConvertedParagraph::new(vec![FormattedRun::styled(
            format!("Exported on {}", format_exported_at(exported_at)),
            TextFormatting {
                italic: true,
                ..TextFormatting::default()
            },
        )])
        .align(TextAlignment::Center)
        .spacing(Spacing::new(400, 0))
    }

    fn classification_header(&self) -> ConvertedParagraph {
        ConvertedParagraph::new(vec![FormattedRun::styled(
            self.theme.labels.classification.as_str(),
            TextFormatting {
                font_size: Some(18),
                color: Some(self.theme.colors.header_text.clone()),
                ..TextFormatting::default()
            },
        )])
        .align(TextAlignment::Right)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn separator(length: usize, spacing: Spacing) -> ConvertedParagraph {
    ConvertedParagraph::new(vec![FormattedRun::plain(
        RULE_GLYPH.to_string().repeat(length),
    )])
    .spacing(spacing)
}

fn spacer(spacing: Spacing) -> ConvertedParagraph {
    ConvertedParagraph::new(vec![FormattedRun::plain("")]).spacing(spacing)
}
