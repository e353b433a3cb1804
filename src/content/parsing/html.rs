//! HTML content parsing
//!
//! Turns editor HTML (TipTap `getHTML()` output) into a `BlockNode` tree.
//! Whitespace inside text nodes is collapsed the way a browser renders it
//! and trimmed at paragraph edges, so markup indentation never turns into
//! runs while the space between `Follow up` and a following `<strong>` is
//! kept.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::super::models::*;

static TEXT_ALIGN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)text-align\s*:\s*([a-z]+)").expect("valid regex"));

static CODE_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)language-([\w+#.-]+)").expect("valid regex"));

/// Parse an HTML fragment into top-level block nodes
pub fn parse_html(html: &str) -> Vec<BlockNode> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let fragment = Html::parse_fragment(html);
    parse_blocks(fragment.root_element())
}

fn is_inline_tag(name: &str) -> bool {
    matches!(
        name,
        "strong"
            | "b"
            | "em"
            | "i"
            | "u"
            | "s"
            | "del"
            | "strike"
            | "code"
            | "a"
            | "br"
            | "span"
            | "mark"
            | "sub"
            | "sup"
            | "small"
    )
}

fn is_ignored_tag(name: &str) -> bool {
    matches!(name, "script" | "style" | "noscript" | "template")
}

/// Walk the children of `parent` in block context
///
/// Consecutive inline content is gathered into one paragraph. A lone `<a>`
/// standing between blocks becomes a link block.
fn parse_blocks(parent: ElementRef) -> Vec<BlockNode> {
    let mut blocks = Vec::new();
    let mut pending: Vec<InlineNode> = Vec::new();
    let mut lifted: Vec<BlockNode> = Vec::new();

    for child in parent.children() {
        if let Some(element) = ElementRef::wrap(child) {
            let name = element.value().name();

            if is_ignored_tag(name) {
                continue;
            }

            if is_inline_tag(name) {
                if let Some(node) = parse_inline_element(element, &mut lifted) {
                    pending.push(node);
                }
                continue;
            }

            flush_pending(&mut blocks, &mut pending, &mut lifted);

            if name == "img" {
                blocks.push(image_block(element));
            } else {
                blocks.extend(parse_block_element(element));
            }
        } else if let Some(text) = child.value().as_text() {
            push_text(&mut pending, text);
        }
    }

    flush_pending(&mut blocks, &mut pending, &mut lifted);
    blocks
}

/// Append a text node, collapsing whitespace
///
/// Whitespace-only text never becomes a node of its own; it only separates
/// the inline content already gathered from whatever follows.
fn push_text(content: &mut Vec<InlineNode>, text: &str) {
    let collapsed = collapse_whitespace(text);
    if collapsed.trim().is_empty() {
        if let Some(last) = last_text_mut(content) {
            if !last.ends_with(' ') {
                last.push(' ');
            }
        }
        return;
    }
    content.push(InlineNode::Text(collapsed));
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn first_text_mut(content: &mut [InlineNode]) -> Option<&mut String> {
    for node in content.iter_mut() {
        match node {
            InlineNode::Text(text) => return Some(text),
            InlineNode::Marked { children, .. } | InlineNode::Container(children) => {
                if let Some(text) = first_text_mut(children) {
                    return Some(text);
                }
            }
            InlineNode::HardBreak => return None,
        }
    }
    None
}

fn last_text_mut(content: &mut [InlineNode]) -> Option<&mut String> {
    for node in content.iter_mut().rev() {
        match node {
            InlineNode::Text(text) => return Some(text),
            InlineNode::Marked { children, .. } | InlineNode::Container(children) => {
                if let Some(text) = last_text_mut(children) {
                    return Some(text);
                }
            }
            InlineNode::HardBreak => return None,
        }
    }
    None
}

/// Trim the outer edges of a paragraph's inline content
fn trim_edges(mut content: Vec<InlineNode>) -> Vec<InlineNode> {
    if let Some(first) = first_text_mut(&mut content) {
        *first = first.trim_start().to_string();
    }
    if let Some(last) = last_text_mut(&mut content) {
        *last = last.trim_end().to_string();
    }
    content
}

fn flush_pending(
    blocks: &mut Vec<BlockNode>,
    pending: &mut Vec<InlineNode>,
    lifted: &mut Vec<BlockNode>,
) {
    if !pending.is_empty() {
        let content = trim_edges(std::mem::take(pending));
        let block = match content.as_slice() {
            [InlineNode::Marked {
                mark: Mark::Link { href },
                children,
            }] => BlockNode::Link {
                href: href.clone(),
                text: inline_text(children).trim().to_string(),
            },
            _ => BlockNode::Paragraph {
                alignment: None,
                content,
            },
        };
        blocks.push(block);
    }

    blocks.append(lifted);
}

fn parse_block_element(element: ElementRef) -> Vec<BlockNode> {
    let name = element.value().name();
    let mut lifted = Vec::new();

    let block = match name {
        "p" => BlockNode::Paragraph {
            alignment: alignment_of(element),
            content: trim_edges(parse_inline_children(element, &mut lifted)),
        },
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => BlockNode::Heading {
            level: name[1..].parse().unwrap_or(1),
            alignment: alignment_of(element),
            content: trim_edges(parse_inline_children(element, &mut lifted)),
        },
        "ul" => BlockNode::BulletList {
            items: parse_list_items(element),
        },
        "ol" => BlockNode::OrderedList {
            items: parse_list_items(element),
        },
        "blockquote" => BlockNode::Blockquote {
            children: parse_blocks(element),
        },
        "pre" => code_block(element),
        "hr" => BlockNode::HorizontalRule,
        _ => {
            debug!("treating <{name}> as a generic container");
            BlockNode::Unknown {
                children: parse_blocks(element),
            }
        }
    };

    let mut blocks = vec![block];
    blocks.append(&mut lifted);
    blocks
}

fn parse_list_items(list: ElementRef) -> Vec<ListItemNode> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .map(|item| ListItemNode {
            children: parse_blocks(item),
        })
        .collect()
}

fn code_block(pre: ElementRef) -> BlockNode {
    let language = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code")
        .and_then(|code| code.value().attr("class"))
        .and_then(|class| CODE_LANGUAGE.captures(class))
        .map(|caps| caps[1].to_string());

    let text: String = pre.text().collect();

    BlockNode::CodeBlock {
        language,
        text: text.trim_end_matches('\n').to_string(),
    }
}

fn image_block(img: ElementRef) -> BlockNode {
    let attr = |name: &str| {
        img.value()
            .attr(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    BlockNode::Image {
        src: attr("src").unwrap_or_default(),
        alt: attr("alt"),
    }
}

fn parse_inline_children(element: ElementRef, lifted: &mut Vec<BlockNode>) -> Vec<InlineNode> {
    let mut content = Vec::new();

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if let Some(node) = parse_inline_element(child_element, lifted) {
                content.push(node);
            }
        } else if let Some(text) = child.value().as_text() {
            push_text(&mut content, text);
        }
    }

    content
}

fn parse_inline_element(element: ElementRef, lifted: &mut Vec<BlockNode>) -> Option<InlineNode> {
    let name = element.value().name();

    let mark = match name {
        "br" => return Some(InlineNode::HardBreak),
        "img" => {
            // Images cannot live inside a run; they follow the enclosing paragraph
            lifted.push(image_block(element));
            return None;
        }
        _ if is_ignored_tag(name) => return None,
        "strong" | "b" => Mark::Bold,
        "em" | "i" => Mark::Italic,
        "u" => Mark::Underline,
        "s" | "del" | "strike" => Mark::Strike,
        "code" => Mark::Code,
        "a" => Mark::Link {
            href: element.value().attr("href").unwrap_or_default().to_string(),
        },
        _ => {
            return Some(InlineNode::Container(parse_inline_children(
                element, lifted,
            )));
        }
    };

    Some(InlineNode::Marked {
        mark,
        children: parse_inline_children(element, lifted),
    })
}

fn alignment_of(element: ElementRef) -> Option<TextAlignment> {
    let style = element.value().attr("style")?;
    let caps = TEXT_ALIGN.captures(style)?;
    TextAlignment::from_attr(&caps[1])
}
