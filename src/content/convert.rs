//! Block-node conversion
//!
//! Maps each `BlockNode` onto one or more `ConvertedParagraph`s. Every
//! branch has a textual fallback, so conversion never fails and every block
//! yields at least one paragraph.

use log::{debug, warn};

use super::image::{ImageOutcome, decode_data_uri, is_data_uri};
use super::models::*;
use super::parsing::formatting::{extract_runs, extract_runs_or_fallback};
use crate::theme::Theme;

/// Glyph repeated to draw a horizontal rule
pub const RULE_GLYPH: char = '─';
pub const RULE_WIDTH: usize = 60;

/// Deepest list indent level Word numbering supports
const MAX_LIST_LEVEL: u8 = 8;

/// Heading font size in half-points; anything outside 1..=3 is treated as level 1
pub fn heading_size(level: u8) -> usize {
    match level {
        2 => 24,
        3 => 20,
        _ => 28,
    }
}

/// Convert a sequence of top-level blocks, preserving document order
pub fn convert_blocks(nodes: &[BlockNode], theme: &Theme) -> Vec<ConvertedParagraph> {
    nodes
        .iter()
        .flat_map(|node| convert_block(node, theme))
        .collect()
}

/// Convert one block into its paragraphs
pub fn convert_block(node: &BlockNode, theme: &Theme) -> Vec<ConvertedParagraph> {
    match node {
        BlockNode::Paragraph { alignment, content } => {
            vec![convert_paragraph(content, *alignment, theme)]
        }
        BlockNode::Heading {
            level,
            alignment,
            content,
        } => vec![convert_heading(*level, content, *alignment, theme)],
        BlockNode::BulletList { items } => convert_list(items, ListKind::Bullet, 0, theme),
        BlockNode::OrderedList { items } => convert_list(items, ListKind::Ordered, 0, theme),
        BlockNode::Blockquote { children } => vec![convert_blockquote(children, theme)],
        BlockNode::CodeBlock { text, .. } => vec![convert_code_block(text, theme)],
        BlockNode::HorizontalRule => vec![horizontal_rule(theme)],
        BlockNode::Image { src, alt } => vec![convert_image(src, alt.as_deref(), theme)],
        BlockNode::Link { href, text } => vec![convert_link(href, text, theme)],
        BlockNode::Unknown { children } => {
            if children.is_empty() {
                return vec![ConvertedParagraph::new(vec![FormattedRun::plain(
                    node.text_content().trim(),
                )])];
            }
            convert_blocks(children, theme)
        }
    }
}

/// Give link runs the theme link colour unless something already coloured them
fn color_links(runs: &mut [FormattedRun], theme: &Theme) {
    for run in runs.iter_mut() {
        if run.formatting.link && run.formatting.color.is_none() {
            run.formatting.color = Some(theme.colors.link.clone());
        }
    }
}

fn force_style(runs: &mut [FormattedRun], forced: &TextFormatting) {
    for run in runs.iter_mut() {
        run.formatting = run.formatting.merge(forced);
    }
}

fn convert_paragraph(
    content: &[InlineNode],
    alignment: Option<TextAlignment>,
    theme: &Theme,
) -> ConvertedParagraph {
    let mut runs = extract_runs_or_fallback(content, &TextFormatting::default());
    color_links(&mut runs, theme);

    ConvertedParagraph::new(runs)
        .align(alignment.unwrap_or_default())
        .spacing(Spacing::after(100))
}

fn convert_heading(
    level: u8,
    content: &[InlineNode],
    alignment: Option<TextAlignment>,
    theme: &Theme,
) -> ConvertedParagraph {
    let level = if (1..=3).contains(&level) { level } else { 1 };
    let forced = TextFormatting {
        bold: true,
        font_size: Some(heading_size(level)),
        ..TextFormatting::default()
    };

    let mut runs = extract_runs_or_fallback(content, &TextFormatting::default());
    force_style(&mut runs, &forced);
    color_links(&mut runs, theme);

    let mut paragraph = ConvertedParagraph::new(runs)
        .align(alignment.unwrap_or_default())
        .spacing(Spacing::new(100, 150));
    paragraph.properties.heading_level = Some(level);
    paragraph
}

/// Convert list items into marked paragraphs
///
/// Each item contributes the runs of its first block. Nested lists inside an
/// item follow it one level deeper; any other blocks in the item are
/// converted as ordinary blocks so nothing is dropped.
fn convert_list(
    items: &[ListItemNode],
    kind: ListKind,
    level: u8,
    theme: &Theme,
) -> Vec<ConvertedParagraph> {
    if items.is_empty() {
        return vec![ConvertedParagraph::new(vec![FormattedRun::plain("")])];
    }

    let mut paragraphs = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let (lead, rest) = match item.children.split_first() {
            Some((first, rest)) if !first.is_list() => (Some(first), rest),
            _ => (None, item.children.as_slice()),
        };

        let mut runs = match lead {
            Some(block) => match block.inline_content() {
                Some(content) => extract_runs_or_fallback(content, &TextFormatting::default()),
                None => vec![FormattedRun::plain(block.text_content().trim())],
            },
            None => vec![FormattedRun::plain("")],
        };
        color_links(&mut runs, theme);

        let mut paragraph = ConvertedParagraph::new(runs).spacing(Spacing::after(50));
        paragraph.properties.list = Some(ListMarker {
            kind,
            level,
            restart: index == 0,
        });
        paragraphs.push(paragraph);

        for block in rest {
            match block {
                BlockNode::BulletList { items } => paragraphs.extend(convert_list(
                    items,
                    ListKind::Bullet,
                    (level + 1).min(MAX_LIST_LEVEL),
                    theme,
                )),
                BlockNode::OrderedList { items } => paragraphs.extend(convert_list(
                    items,
                    ListKind::Ordered,
                    (level + 1).min(MAX_LIST_LEVEL),
                    theme,
                )),
                other => paragraphs.extend(convert_block(other, theme)),
            }
        }
    }

    paragraphs
}

fn convert_blockquote(children: &[BlockNode], theme: &Theme) -> ConvertedParagraph {
    let forced = TextFormatting {
        italic: true,
        color: Some(theme.colors.quote_text.clone()),
        ..TextFormatting::default()
    };

    let mut runs = Vec::new();
    for child in children {
        let child_runs = match child.inline_content() {
            Some(content) => extract_runs(content, &forced),
            None => {
                let text = child.text_content();
                let text = text.trim();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![FormattedRun::styled(text, forced.clone())]
                }
            }
        };

        if child_runs.is_empty() {
            continue;
        }
        if !runs.is_empty() {
            runs.push(FormattedRun::styled("\n", forced.clone()));
        }
        runs.extend(child_runs);
    }

    if runs.is_empty() {
        runs.push(FormattedRun::styled("", forced.clone()));
    }
    force_style(&mut runs, &forced);

    let mut paragraph = ConvertedParagraph::new(runs).spacing(Spacing::new(100, 100));
    paragraph.properties.left_border = Some(Border {
        color: theme.colors.quote_border.clone(),
        size: 12,
        space: 4,
    });
    paragraph
}

fn convert_code_block(text: &str, theme: &Theme) -> ConvertedParagraph {
    let formatting = TextFormatting {
        code: true,
        font_size: Some(18),
        color: Some(theme.colors.code_text.clone()),
        ..TextFormatting::default()
    };

    let mut paragraph = ConvertedParagraph::new(vec![FormattedRun::styled(text, formatting)])
        .spacing(Spacing::new(100, 100));
    paragraph.properties.shading = Some(theme.colors.code_background.clone());
    paragraph
}

fn horizontal_rule(theme: &Theme) -> ConvertedParagraph {
    let formatting = TextFormatting {
        color: Some(theme.colors.rule.clone()),
        ..TextFormatting::default()
    };

    ConvertedParagraph::new(vec![FormattedRun::styled(
        RULE_GLYPH.to_string().repeat(RULE_WIDTH),
        formatting,
    )])
    .spacing(Spacing::new(100, 100))
}

fn link_formatting(theme: &Theme) -> TextFormatting {
    TextFormatting {
        underline: true,
        link: true,
        color: Some(theme.colors.link.clone()),
        ..TextFormatting::default()
    }
}

fn convert_image(src: &str, alt: Option<&str>, theme: &Theme) -> ConvertedParagraph {
    let spacing = Spacing::new(100, 100);

    if is_data_uri(src) {
        match decode_data_uri(src, theme.images.width, theme.images.height) {
            ImageOutcome::Embedded(image) => {
                debug!("embedding {} image", image.subtype.extension());
                let mut paragraph = ConvertedParagraph::new(Vec::new()).spacing(spacing);
                paragraph.image = Some(image);
                return paragraph;
            }
            ImageOutcome::Placeholder { reason } => {
                warn!("image replaced by placeholder: {reason}");
                return image_placeholder(alt).spacing(spacing);
            }
        }
    }

    if src.trim().is_empty() {
        return image_placeholder(alt).spacing(spacing);
    }

    // External images are referenced, never fetched
    let mut run = FormattedRun::styled(format!("[Image: {src}]"), link_formatting(theme));
    run.hyperlink = Some(src.to_string());
    ConvertedParagraph::new(vec![run]).spacing(spacing)
}

fn image_placeholder(alt: Option<&str>) -> ConvertedParagraph {
    let alt = alt.map(str::trim).filter(|alt| !alt.is_empty()).unwrap_or("Image");
    let formatting = TextFormatting {
        italic: true,
        ..TextFormatting::default()
    };
    ConvertedParagraph::new(vec![FormattedRun::styled(format!("[{alt}]"), formatting)])
}

fn convert_link(href: &str, text: &str, theme: &Theme) -> ConvertedParagraph {
    let visible = if text.trim().is_empty() { href } else { text };
    let mut run = FormattedRun::styled(visible.trim(), link_formatting(theme));
    if !href.trim().is_empty() {
        run.hyperlink = Some(href.trim().to_string());
    }
    ConvertedParagraph::new(vec![run]).spacing(Spacing::after(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> InlineNode {
        InlineNode::Text(s.to_string())
    }

    fn paragraph(s: &str) -> BlockNode {
        BlockNode::Paragraph {
            alignment: None,
            content: vec![text(s)],
        }
    }

    #[test]
    fn test_heading_out_of_range_is_level_one() {
        let theme = Theme::default();
        for level in [0, 4, 6, 42] {
            let out = convert_block(
                &BlockNode::Heading {
                    level,
                    alignment: None,
                    content: vec![text("Title")],
                },
                &theme,
            );
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].properties.heading_level, Some(1));
            assert!(out[0].runs[0].formatting.bold);
            assert_eq!(out[0].runs[0].formatting.font_size, Some(28));
        }
    }

    #[test]
    fn test_heading_keeps_alignment_and_size() {
        let out = convert_block(
            &BlockNode::Heading {
                level: 3,
                alignment: Some(TextAlignment::Center),
                content: vec![text("Small")],
            },
            &Theme::default(),
        );
        assert_eq!(out[0].properties.alignment, TextAlignment::Center);
        assert_eq!(out[0].runs[0].formatting.font_size, Some(20));
    }

    #[test]
    fn test_nested_list_follows_item_one_level_deeper() {
        let list = BlockNode::BulletList {
            items: vec![ListItemNode {
                children: vec![
                    paragraph("Parent"),
                    BlockNode::OrderedList {
                        items: vec![
                            ListItemNode {
                                children: vec![paragraph("Child A")],
                            },
                            ListItemNode {
                                children: vec![paragraph("Child B")],
                            },
                        ],
                    },
                ],
            }],
        };

        let out = convert_block(&list, &Theme::default());
        let texts: Vec<String> = out.iter().map(ConvertedParagraph::text).collect();
        assert_eq!(texts, ["Parent", "Child A", "Child B"]);

        let markers: Vec<ListMarker> = out.iter().filter_map(|p| p.properties.list).collect();
        assert_eq!(markers[0].kind, ListKind::Bullet);
        assert_eq!(markers[0].level, 0);
        assert_eq!(markers[1].kind, ListKind::Ordered);
        assert_eq!(markers[1].level, 1);
        assert!(markers[1].restart);
        assert!(!markers[2].restart);
    }

    #[test]
    fn test_empty_list_still_yields_a_paragraph() {
        let out = convert_block(&BlockNode::OrderedList { items: vec![] }, &Theme::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text(), "");
    }

    #[test]
    fn test_code_block_is_one_opaque_run() {
        let theme = Theme::default();
        let out = convert_block(
            &BlockNode::CodeBlock {
                language: None,
                text: "let x = 1;\nlet y = 2;".to_string(),
            },
            &theme,
        );
        assert_eq!(out[0].runs.len(), 1);
        assert!(out[0].runs[0].formatting.code);
        assert_eq!(out[0].runs[0].formatting.font_size, Some(18));
        assert_eq!(
            out[0].runs[0].formatting.color.as_deref(),
            Some(theme.colors.code_text.as_str())
        );
        assert_eq!(
            out[0].properties.shading.as_deref(),
            Some(theme.colors.code_background.as_str())
        );
    }

    #[test]
    fn test_horizontal_rule_is_glyph_line() {
        let out = convert_block(&BlockNode::HorizontalRule, &Theme::default());
        assert_eq!(out[0].text().chars().count(), RULE_WIDTH);
        assert!(out[0].text().chars().all(|c| c == RULE_GLYPH));
    }

    #[test]
    fn test_link_block_falls_back_to_href() {
        let out = convert_block(
            &BlockNode::Link {
                href: "https://un.org".to_string(),
                text: "  ".to_string(),
            },
            &Theme::default(),
        );
        assert_eq!(out[0].text(), "https://un.org");
        assert!(out[0].runs[0].formatting.underline);
        assert_eq!(out[0].runs[0].hyperlink.as_deref(), Some("https://un.org"));
    }

    #[test]
    fn test_broken_data_uri_uses_alt_placeholder() {
        let theme = Theme::default();
        let out = convert_block(
            &BlockNode::Image {
                src: "data:image/png;base64,@@@".to_string(),
                alt: Some("Situation map".to_string()),
            },
            &theme,
        );
        assert!(out[0].image.is_none());
        assert_eq!(out[0].text(), "[Situation map]");
        assert!(out[0].runs[0].formatting.italic);

        let out = convert_block(
            &BlockNode::Image {
                src: "data:image/gif;base64,@@@".to_string(),
                alt: None,
            },
            &theme,
        );
        assert_eq!(out[0].text(), "[Image]");
    }

    #[test]
    fn test_unknown_flattens_children() {
        let node = BlockNode::Unknown {
            children: vec![
                paragraph("one"),
                BlockNode::Unknown {
                    children: vec![paragraph("two")],
                },
            ],
        };
        let out = convert_block(&node, &Theme::default());
        let texts: Vec<String> = out.iter().map(ConvertedParagraph::text).collect();
        assert_eq!(texts, ["one", "two"]);
    }

    #[test]
    fn test_inline_link_gets_theme_colour() {
        let theme = Theme::default();
        let out = convert_block(
            &BlockNode::Paragraph {
                alignment: None,
                content: vec![InlineNode::Marked {
                    mark: Mark::Link {
                        href: "https://un.org".to_string(),
                    },
                    children: vec![text("UN")],
                }],
            },
            &theme,
        );
        assert_eq!(
            out[0].runs[0].formatting.color.as_deref(),
            Some(theme.colors.link.as_str())
        );
    }

    #[test]
    fn test_alert_paragraph_splits_into_bold_and_plain_runs() {
        let blocks = crate::content::parsing::html::parse_html(
            "<p><strong>Alert</strong>: situation update</p>",
        );
        let out = convert_blocks(&blocks, &Theme::default());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].runs.len(), 2);
        assert_eq!(out[0].runs[0].text, "Alert");
        assert!(out[0].runs[0].formatting.bold);
        assert_eq!(out[0].runs[1].text, ": situation update");
        assert!(!out[0].runs[1].formatting.bold);
    }

    #[test]
    fn test_two_bullet_items_are_level_zero_in_order() {
        let list = BlockNode::BulletList {
            items: vec![
                ListItemNode {
                    children: vec![paragraph("First point")],
                },
                ListItemNode {
                    children: vec![paragraph("Second point")],
                },
            ],
        };

        let out = convert_block(&list, &Theme::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text(), "First point");
        assert_eq!(out[1].text(), "Second point");
        for paragraph in &out {
            let marker = paragraph.properties.list.expect("bullet marker");
            assert_eq!(marker.kind, ListKind::Bullet);
            assert_eq!(marker.level, 0);
        }
    }

    #[test]
    fn test_blockquote_is_italic_quote_coloured_and_bordered() {
        let theme = Theme::default();
        let out = convert_block(
            &BlockNode::Blockquote {
                children: vec![paragraph("Official statement")],
            },
            &theme,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text(), "Official statement");
        for run in &out[0].runs {
            assert!(run.formatting.italic);
            assert_eq!(
                run.formatting.color.as_deref(),
                Some(theme.colors.quote_text.as_str())
            );
        }
        let border = out[0].properties.left_border.as_ref().expect("left border");
        assert_eq!(border.color, theme.colors.quote_border);
    }

    #[test]
    fn test_external_image_is_referenced_not_embedded() {
        let out = convert_block(
            &BlockNode::Image {
                src: "https://example.org/map.png".to_string(),
                alt: Some("Map".to_string()),
            },
            &Theme::default(),
        );

        assert_eq!(out.len(), 1);
        assert!(out[0].image.is_none());
        assert!(out[0].text().contains("https://example.org/map.png"));
    }

    #[test]
    fn test_whitespace_paragraph_keeps_one_empty_run() {
        let out = convert_block(&paragraph("   "), &Theme::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].runs.len(), 1);
        assert_eq!(out[0].runs[0].text, "");
    }

    #[test]
    fn test_converting_twice_gives_identical_output() {
        let theme = Theme::default();
        let node = BlockNode::BulletList {
            items: vec![ListItemNode {
                children: vec![
                    BlockNode::Paragraph {
                        alignment: Some(TextAlignment::Right),
                        content: vec![InlineNode::Marked {
                            mark: Mark::Bold,
                            children: vec![InlineNode::Marked {
                                mark: Mark::Italic,
                                children: vec![text("Both")],
                            }],
                        }],
                    },
                    BlockNode::Blockquote {
                        children: vec![paragraph("Quoted")],
                    },
                ],
            }],
        };

        let first = convert_block(&node, &theme);
        let second = convert_block(&node, &theme);
        assert_eq!(first, second);
        assert!(first[0].runs[0].formatting.bold && first[0].runs[0].formatting.italic);
    }
}
