//! Inline run extraction
//!
//! Walks the inline children of a block and splits them into styled runs,
//! threading an immutable style context down the recursion.

use super::super::models::*;

/// Extract styled runs from inline content, preserving reading order
pub(crate) fn extract_runs(content: &[InlineNode], style: &TextFormatting) -> Vec<FormattedRun> {
    let mut runs = Vec::new();
    collect_runs(content, style, None, &mut runs);
    runs
}

/// Like [`extract_runs`], but never returns an empty list
///
/// When nothing structured comes back a single unstyled run holding the raw
/// trimmed text is produced instead (empty for whitespace-only content).
pub(crate) fn extract_runs_or_fallback(
    content: &[InlineNode],
    style: &TextFormatting,
) -> Vec<FormattedRun> {
    let runs = extract_runs(content, style);
    if !runs.is_empty() {
        return runs;
    }

    vec![FormattedRun::plain(inline_text(content).trim())]
}

fn collect_runs(
    content: &[InlineNode],
    style: &TextFormatting,
    hyperlink: Option<&str>,
    runs: &mut Vec<FormattedRun>,
) {
    for node in content {
        match node {
            InlineNode::Text(text) => {
                // Whitespace-only text carries nothing worth a run
                if text.trim().is_empty() {
                    continue;
                }
                runs.push(FormattedRun {
                    text: text.clone(),
                    formatting: style.clone(),
                    hyperlink: hyperlink.map(str::to_string),
                });
            }
            InlineNode::HardBreak => {
                runs.push(FormattedRun {
                    text: "\n".to_string(),
                    formatting: style.clone(),
                    hyperlink: None,
                });
            }
            InlineNode::Marked { mark, children } => {
                let nested = style.with_mark(mark);
                let target = match mark {
                    Mark::Link { href } if !href.is_empty() => Some(href.as_str()),
                    _ => hyperlink,
                };
                collect_runs(children, &nested, target, runs);
            }
            InlineNode::Container(children) => {
                collect_runs(children, style, hyperlink, runs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> InlineNode {
        InlineNode::Text(s.to_string())
    }

    fn marked(mark: Mark, children: Vec<InlineNode>) -> InlineNode {
        InlineNode::Marked { mark, children }
    }

    #[test]
    fn test_nested_marks_accumulate() {
        let content = vec![marked(
            Mark::Italic,
            vec![text("soft "), marked(Mark::Bold, vec![text("loud")])],
        )];

        let runs = extract_runs(&content, &TextFormatting::default());
        assert_eq!(runs.len(), 2);
        assert!(runs[0].formatting.italic && !runs[0].formatting.bold);
        assert!(runs[1].formatting.italic && runs[1].formatting.bold);
    }

    #[test]
    fn test_marks_are_set_not_toggled() {
        let content = vec![marked(
            Mark::Bold,
            vec![marked(Mark::Bold, vec![text("still bold")])],
        )];

        let runs = extract_runs(&content, &TextFormatting::default());
        assert!(runs[0].formatting.bold);
    }

    #[test]
    fn test_sibling_styles_do_not_leak() {
        let content = vec![
            marked(Mark::Strike, vec![text("gone")]),
            text("kept"),
        ];

        let runs = extract_runs(&content, &TextFormatting::default());
        assert!(runs[0].formatting.strikethrough);
        assert!(!runs[1].formatting.strikethrough);
    }

    #[test]
    fn test_link_mark_carries_target() {
        let content = vec![marked(
            Mark::Link {
                href: "https://un.org".to_string(),
            },
            vec![text("UN")],
        )];

        let runs = extract_runs(&content, &TextFormatting::default());
        assert_eq!(runs[0].hyperlink.as_deref(), Some("https://un.org"));
        assert!(runs[0].formatting.link);
        assert!(runs[0].formatting.underline);
    }

    #[test]
    fn test_container_passes_through() {
        let content = vec![InlineNode::Container(vec![
            text("a"),
            marked(Mark::Code, vec![text("b")]),
        ])];

        let runs = extract_runs(&content, &TextFormatting::default());
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].formatting.code);
        assert!(runs[1].formatting.code);
    }

    #[test]
    fn test_whitespace_only_falls_back_to_empty_run() {
        let content = vec![text("   "), InlineNode::Container(vec![text("\n\t")])];

        let runs = extract_runs_or_fallback(&content, &TextFormatting::default());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "");
        assert_eq!(runs[0].formatting, TextFormatting::default());
    }

    #[test]
    fn test_hard_break_becomes_newline_run() {
        let content = vec![text("line one"), InlineNode::HardBreak, text("line two")];

        let runs = extract_runs(&content, &TextFormatting::default());
        let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(joined, "line one\nline two");
    }
}
