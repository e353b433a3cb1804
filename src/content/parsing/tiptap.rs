//! TipTap JSON parsing
//!
//! TipTap stores the editor state as a ProseMirror-style JSON tree. This
//! module deserialises that tree and maps it onto `BlockNode`s.

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::super::models::*;
use crate::error::Result;

/// One node of the editor tree
///
/// Every field is read leniently: a value of the wrong type counts as
/// absent, and a child that is not an object is skipped, so one malformed
/// node never costs the rest of the document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TiptapNode {
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_seq")]
    pub content: Vec<TiptapNode>,
    #[serde(deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient_seq")]
    pub marks: Vec<TiptapMark>,
    #[serde(deserialize_with = "lenient")]
    pub attrs: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TiptapMark {
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub kind: String,
    #[serde(deserialize_with = "lenient")]
    pub attrs: Map<String, Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(node) => Some(node),
            Err(err) => {
                debug!("skipping malformed TipTap node: {err}");
                None
            }
        })
        .collect())
}

impl TiptapNode {
    fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn alignment(&self) -> Option<TextAlignment> {
        self.attr_str("textAlign").and_then(TextAlignment::from_attr)
    }
}

/// Parse a TipTap document given as a JSON string
pub fn parse_tiptap_str(json: &str) -> Result<Vec<BlockNode>> {
    let value: Value = serde_json::from_str(json)?;
    parse_tiptap(&value)
}

/// Parse a TipTap document (`{"type": "doc", "content": [...]}`)
pub fn parse_tiptap(value: &Value) -> Result<Vec<BlockNode>> {
    let doc = TiptapNode::deserialize(value)?;
    Ok(doc.content.iter().map(convert_block).collect())
}

fn convert_block(node: &TiptapNode) -> BlockNode {
    match node.kind.as_str() {
        "paragraph" => BlockNode::Paragraph {
            alignment: node.alignment(),
            content: convert_inline(&node.content),
        },
        "heading" => BlockNode::Heading {
            level: node
                .attrs
                .get("level")
                .and_then(Value::as_u64)
                .and_then(|level| u8::try_from(level).ok())
                .unwrap_or(1),
            alignment: node.alignment(),
            content: convert_inline(&node.content),
        },
        "bulletList" => BlockNode::BulletList {
            items: convert_list_items(&node.content),
        },
        "orderedList" => BlockNode::OrderedList {
            items: convert_list_items(&node.content),
        },
        "blockquote" => BlockNode::Blockquote {
            children: node.content.iter().map(convert_block).collect(),
        },
        "codeBlock" => BlockNode::CodeBlock {
            language: node.attr_str("language").map(str::to_string),
            text: plain_text(node),
        },
        "image" => BlockNode::Image {
            src: node.attr_str("src").unwrap_or_default().to_string(),
            alt: node.attr_str("alt").map(str::to_string),
        },
        "horizontalRule" => BlockNode::HorizontalRule,
        // Inline nodes that show up at block level get their own paragraph
        "text" | "hardBreak" => BlockNode::Paragraph {
            alignment: None,
            content: convert_inline(std::slice::from_ref(node)),
        },
        other => {
            debug!("treating TipTap node {other:?} as a generic container");
            BlockNode::Unknown {
                children: node.content.iter().map(convert_block).collect(),
            }
        }
    }
}

fn convert_list_items(content: &[TiptapNode]) -> Vec<ListItemNode> {
    content
        .iter()
        .filter(|item| item.kind == "listItem")
        .map(|item| ListItemNode {
            children: item.content.iter().map(convert_block).collect(),
        })
        .collect()
}

fn convert_inline(content: &[TiptapNode]) -> Vec<InlineNode> {
    let mut inline = Vec::new();

    for node in content {
        match node.kind.as_str() {
            "text" => {
                let text = node.text.clone().unwrap_or_default();
                inline.push(wrap_marks(InlineNode::Text(text), &node.marks));
            }
            "hardBreak" => inline.push(InlineNode::HardBreak),
            _ => {
                // Nested content of unknown inline nodes is passed through
                inline.push(InlineNode::Container(convert_inline(&node.content)));
            }
        }
    }

    inline
}

/// Wrap a text node in its marks, innermost mark last
fn wrap_marks(node: InlineNode, marks: &[TiptapMark]) -> InlineNode {
    marks.iter().rev().fold(node, |inner, mark| {
        let mark = match mark.kind.as_str() {
            "bold" => Mark::Bold,
            "italic" => Mark::Italic,
            "underline" => Mark::Underline,
            "strike" => Mark::Strike,
            "code" => Mark::Code,
            "link" => Mark::Link {
                href: mark
                    .attrs
                    .get("href")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => return inner,
        };
        InlineNode::Marked {
            mark,
            children: vec![inner],
        }
    })
}

fn plain_text(node: &TiptapNode) -> String {
    if node.kind == "text" {
        return node.text.clone().unwrap_or_default();
    }
    if node.kind == "hardBreak" {
        return "\n".to_string();
    }

    node.content.iter().map(plain_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_marks_wrap_text() {
        let doc = json!({
            "type": "doc",
            "content": [{
                "type": "paragraph",
                "attrs": {"textAlign": "right"},
                "content": [
                    {"type": "text", "text": "Both", "marks": [{"type": "bold"}, {"type": "italic"}]},
                    {"type": "text", "text": " plain"}
                ]
            }]
        });

        let blocks = parse_tiptap(&doc).expect("valid doc");
        let BlockNode::Paragraph { alignment, content } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(*alignment, Some(TextAlignment::Right));
        assert_eq!(content.len(), 2);
        assert_eq!(inline_text(content), "Both plain");
    }

    #[test]
    fn test_heading_level_defaults_to_one() {
        let blocks = parse_tiptap(&json!({
            "type": "doc",
            "content": [{"type": "heading", "content": [{"type": "text", "text": "H"}]}]
        }))
        .expect("valid doc");
        assert!(matches!(blocks[0], BlockNode::Heading { level: 1, .. }));
    }

    #[test]
    fn test_code_block_text_is_flattened() {
        let blocks = parse_tiptap(&json!({
            "type": "doc",
            "content": [{
                "type": "codeBlock",
                "attrs": {"language": "sql"},
                "content": [{"type": "text", "text": "SELECT 1;"}]
            }]
        }))
        .expect("valid doc");
        assert_eq!(
            blocks[0],
            BlockNode::CodeBlock {
                language: Some("sql".to_string()),
                text: "SELECT 1;".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_node_becomes_container() {
        let blocks = parse_tiptap(&json!({
            "type": "doc",
            "content": [{
                "type": "details",
                "content": [{"type": "paragraph", "content": [{"type": "text", "text": "hidden"}]}]
            }]
        }))
        .expect("valid doc");
        let BlockNode::Unknown { children } = &blocks[0] else {
            panic!("expected container");
        };
        assert_eq!(children[0].text_content(), "hidden");
    }

    #[test]
    fn test_missing_content_is_empty() {
        assert!(parse_tiptap(&json!({"type": "doc"})).expect("valid").is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_tiptap_str("{\"type\": ").is_err());
    }

    #[test]
    fn test_malformed_node_does_not_lose_its_siblings() {
        let raw = r#"{
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Keep me"}]},
                {"type": "image", "attrs": {"src": "https://example.org/a.png"}, "content": null},
                {"type": "paragraph", "content": [{"type": "text", "text": 42}, {"type": "text", "text": "ok"}]},
                7,
                {"type": "heading", "attrs": null, "marks": "bold", "content": [{"type": "text", "text": "Title"}]}
            ]
        }"#;

        let blocks = parse_tiptap_str(raw).expect("valid JSON document");
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].text_content(), "Keep me");
        assert!(matches!(&blocks[1], BlockNode::Image { src, .. } if src == "https://example.org/a.png"));
        assert_eq!(blocks[2].text_content(), "ok");
        assert!(matches!(blocks[3], BlockNode::Heading { level: 1, .. }));
        assert_eq!(blocks[3].text_content(), "Title");
    }
}
