//! Image handling for entry bodies
//!
//! Uploaded images are referenced from entry bodies as
//! `image-ref://img-<position>` and inlined as data URIs before conversion.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::models::{BriefingEntry, EntryImage};
use crate::content::BlockNode;

static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid regex"));

/// Remove every `<img>` tag from an HTML body
pub fn strip_images(html: &str) -> String {
    IMG_TAG.replace_all(html, "").into_owned()
}

/// Drop image nodes from a parsed tree, for bodies that are not HTML
pub fn strip_image_nodes(blocks: Vec<BlockNode>) -> Vec<BlockNode> {
    blocks
        .into_iter()
        .filter(|block| !matches!(block, BlockNode::Image { .. }))
        .map(|block| match block {
            BlockNode::Blockquote { children } => BlockNode::Blockquote {
                children: strip_image_nodes(children),
            },
            BlockNode::Unknown { children } => BlockNode::Unknown {
                children: strip_image_nodes(children),
            },
            BlockNode::BulletList { mut items } => {
                for item in &mut items {
                    item.children = strip_image_nodes(std::mem::take(&mut item.children));
                }
                BlockNode::BulletList { items }
            }
            BlockNode::OrderedList { mut items } => {
                for item in &mut items {
                    item.children = strip_image_nodes(std::mem::take(&mut item.children));
                }
                BlockNode::OrderedList { items }
            }
            other => other,
        })
        .collect()
}

pub fn image_reference(position: u32) -> String {
    format!("image-ref://img-{position}")
}

/// Replace image references in `body` with data URIs
///
/// `load` produces the bytes for an image. When it fails the `<img>` tag
/// carrying the reference is removed and a warning is logged. Images
/// without a position cannot be referenced and are skipped. The reference is
/// matched only when quoted, so this works for HTML attributes and TipTap
/// JSON alike.
pub fn resolve_image_references<F>(body: &str, images: &[EntryImage], mut load: F) -> String
where
    F: FnMut(&EntryImage) -> std::io::Result<Vec<u8>>,
{
    let mut body = body.to_string();

    for image in images {
        let Some(position) = image.position else {
            debug!("image {} has no position, skipping", image.id);
            continue;
        };
        let reference = image_reference(position);
        let quoted = [format!("\"{reference}\""), format!("'{reference}'")];

        if !quoted.iter().any(|q| body.contains(q.as_str())) {
            continue;
        }

        match load(image) {
            Ok(bytes) => {
                let mime = if image.mime_type.trim().is_empty() {
                    "image/png"
                } else {
                    image.mime_type.trim()
                };
                let uri = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
                debug!("inlined image {} as {reference}", image.id);
                body = body
                    .replace(&quoted[0], &format!("\"{uri}\""))
                    .replace(&quoted[1], &format!("'{uri}'"));
            }
            Err(err) => {
                warn!("could not load image {} ({reference}): {err}", image.id);
                body = IMG_TAG
                    .replace_all(&body, |caps: &Captures| {
                        if quoted.iter().any(|q| caps[0].contains(q.as_str())) {
                            String::new()
                        } else {
                            caps[0].to_string()
                        }
                    })
                    .into_owned();
            }
        }
    }

    body
}

/// Resolve image references in the body of every entry
pub fn resolve_entry_images<F>(entries: &mut [BriefingEntry], mut load: F)
where
    F: FnMut(&EntryImage) -> std::io::Result<Vec<u8>>,
{
    for entry in entries.iter_mut() {
        if entry.images.is_empty() {
            continue;
        }
        entry.entry = resolve_image_references(&entry.entry, &entry.images, &mut load);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn image(position: Option<u32>) -> EntryImage {
        EntryImage {
            id: "img".to_string(),
            position,
            mime_type: "image/png".to_string(),
            path: None,
        }
    }

    #[test]
    fn test_strip_images() {
        assert_eq!(
            strip_images(r#"<p>Map <IMG src="a.png" alt="x"/>here</p>"#),
            "<p>Map here</p>"
        );
    }

    #[test]
    fn test_reference_becomes_data_uri() {
        let html = r#"<p>x</p><img src="image-ref://img-1"><img src="image-ref://img-10">"#;
        let images = [image(Some(1))];

        let resolved = resolve_image_references(html, &images, |_| Ok(vec![1, 2, 3]));
        assert!(resolved.contains(r#"src="data:image/png;base64,AQID""#));
        // img-10 is a different reference
        assert!(resolved.contains("image-ref://img-10"));
    }

    #[test]
    fn test_failed_load_removes_tag() {
        let html = r#"<p>before</p><img alt="m" src="image-ref://img-0"><p>after</p>"#;
        let images = [image(Some(0))];

        let resolved = resolve_image_references(html, &images, |_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        });
        assert_eq!(resolved, "<p>before</p><p>after</p>");
    }

    #[test]
    fn test_tiptap_json_reference() {
        let json = r#"{"type":"image","attrs":{"src":"image-ref://img-2"}}"#;
        let resolved = resolve_image_references(json, &[image(Some(2))], |_| Ok(vec![0]));
        assert!(resolved.contains(r#""src":"data:image/png;base64,AA==""#));
    }

    #[test]
    fn test_image_nodes_are_stripped_recursively() {
        let blocks = vec![
            BlockNode::Image {
                src: "x".to_string(),
                alt: None,
            },
            BlockNode::Blockquote {
                children: vec![
                    BlockNode::HorizontalRule,
                    BlockNode::Image {
                        src: "y".to_string(),
                        alt: None,
                    },
                ],
            },
        ];
        assert_eq!(
            strip_image_nodes(blocks),
            vec![BlockNode::Blockquote {
                children: vec![BlockNode::HorizontalRule],
            }]
        );
    }

    #[test]
    fn test_image_without_position_is_skipped() {
        let html = r#"<img src="image-ref://img-0"><img src="image-ref://img-1">"#;
        let images = [image(None), image(Some(1))];

        let mut loaded = 0;
        let resolved = resolve_image_references(html, &images, |_| {
            loaded += 1;
            Ok(vec![1])
        });
        assert_eq!(loaded, 1);
        assert!(resolved.contains(r#"src="image-ref://img-0""#));
        assert!(!resolved.contains("image-ref://img-1"));
    }
}
