//! List numbering definitions
//!
//! All bullet paragraphs share one numbering instance. Every ordered list
//! gets a fresh instance when its first item arrives, so numbering starts
//! again from 1 instead of continuing the previous list.

use docx_rs::*;

use crate::content::{ListKind, ListMarker};

/// Word supports nine indent levels per list
pub(crate) const LIST_LEVELS: usize = 9;

#[derive(Debug)]
pub(crate) struct ListNumbering {
    next_id: usize,
    bullet_id: Option<usize>,
    /// Current ordered instance for each indent level
    ordered_ids: [Option<usize>; LIST_LEVELS],
}

impl ListNumbering {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            bullet_id: None,
            ordered_ids: [None; LIST_LEVELS],
        }
    }

    fn level(id: usize, format: &str, text: &str, bullet: bool) -> Level {
        let indent = 720 * (id as i32 + 1);
        let hanging = if bullet { 360 } else { 420 };

        Level::new(
            id,
            Start::new(1),
            NumberFormat::new(format),
            LevelText::new(text),
            LevelJc::new("left"),
        )
        .indent(
            Some(indent),
            Some(SpecialIndentType::Hanging(hanging)),
            None,
            None,
        )
    }

    fn add_definition(&mut self, docx: Docx, kind: ListKind) -> (Docx, usize) {
        let id = self.next_id;
        self.next_id += 1;

        let mut abstract_numbering = AbstractNumbering::new(id);
        for i in 0..LIST_LEVELS {
            let level = match kind {
                ListKind::Bullet => {
                    let glyph = match i % 3 {
                        0 => "•",
                        1 => "○",
                        _ => "▪",
                    };
                    Self::level(i, "bullet", glyph, true)
                }
                ListKind::Ordered => {
                    let format = match i % 3 {
                        0 => "decimal",
                        1 => "lowerLetter",
                        _ => "lowerRoman",
                    };
                    Self::level(i, format, &format!("%{}.", i + 1), false)
                }
            };
            abstract_numbering = abstract_numbering.add_level(level);
        }

        let docx = docx
            .add_abstract_numbering(abstract_numbering)
            .add_numbering(Numbering::new(id, id));
        (docx, id)
    }

    /// Numbering instance for a list paragraph, defining it on first use
    pub(crate) fn numbering_for(&mut self, docx: Docx, marker: ListMarker) -> (Docx, usize) {
        let level = usize::from(marker.level).min(LIST_LEVELS - 1);

        match marker.kind {
            ListKind::Bullet => match self.bullet_id {
                Some(id) => (docx, id),
                None => {
                    let (docx, id) = self.add_definition(docx, ListKind::Bullet);
                    self.bullet_id = Some(id);
                    (docx, id)
                }
            },
            ListKind::Ordered => match self.ordered_ids[level] {
                Some(id) if !marker.restart => (docx, id),
                _ => {
                    let (docx, id) = self.add_definition(docx, ListKind::Ordered);
                    self.ordered_ids[level] = Some(id);
                    (docx, id)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(level: u8, restart: bool) -> ListMarker {
        ListMarker {
            kind: ListKind::Ordered,
            level,
            restart,
        }
    }

    #[test]
    fn test_bullets_share_one_instance() {
        let mut numbering = ListNumbering::new();
        let marker = ListMarker {
            kind: ListKind::Bullet,
            level: 0,
            restart: true,
        };
        let (docx, first) = numbering.numbering_for(Docx::new(), marker);
        let (_, second) = numbering.numbering_for(docx, ListMarker { level: 2, ..marker });
        assert_eq!(first, second);
    }

    #[test]
    fn test_ordered_lists_restart() {
        let mut numbering = ListNumbering::new();
        let (docx, a) = numbering.numbering_for(Docx::new(), ordered(0, true));
        let (docx, b) = numbering.numbering_for(docx, ordered(0, false));
        let (docx, nested) = numbering.numbering_for(docx, ordered(1, true));
        let (docx, c) = numbering.numbering_for(docx, ordered(0, false));
        let (_, d) = numbering.numbering_for(docx, ordered(0, true));

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, nested);
        assert_ne!(a, d);
    }
}
