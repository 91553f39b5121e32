//! Text-unit extraction.
//!
//! Pulls positioned spans per page out of the document model and merges
//! vertically-adjacent raw blocks into paragraph-scale text units, so the
//! translator sees coherent prose instead of isolated lines.

use mupdf::TextPageOptions;

use crate::config::{ExtractConfig, TextColor};
use crate::error::{Error, Result};

use super::document::PdfDocument;
use super::page_index::PageIndex;

/// Bounding box in page coordinates (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Coordinate-wise union of two boxes
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Create from mupdf Quad (4 points defining a quadrilateral)
    pub const fn from_quad(quad: &mupdf::Quad) -> Self {
        let x0 = quad.ul.x.min(quad.ur.x).min(quad.ll.x).min(quad.lr.x);
        let y0 = quad.ul.y.min(quad.ur.y).min(quad.ll.y).min(quad.lr.y);
        let x1 = quad.ul.x.max(quad.ur.x).max(quad.ll.x).max(quad.lr.x);
        let y1 = quad.ul.y.max(quad.ur.y).max(quad.ll.y).max(quad.lr.y);
        Self { x0, y0, x1, y1 }
    }
}

/// Page dimensions, one per page of the source document
#[derive(Debug, Clone, Copy)]
pub struct PageGeometry {
    pub page_index: usize,
    pub width: f32,
    pub height: f32,
}

/// The smallest addressable unit of styled text
#[derive(Debug, Clone)]
pub struct Span {
    pub text: String,
    pub bbox: BoundingBox,
    /// Font size in points, estimated from the line height
    pub font_size: f32,
    pub color: TextColor,
    /// Font name as reported by the document model, when available
    pub font_name: Option<String>,
}

/// Whether a block carries text or something else (image, vector art)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    NonText,
}

/// A paragraph-scale group of merged spans, treated as one translation and
/// layout item.
///
/// Invariants: `bbox` is the coordinate-wise min/max over all contained
/// non-empty spans' bboxes, and `spans` are in document order (top-to-bottom,
/// then left-to-right) as originally encountered.
#[derive(Debug, Clone)]
pub struct TextUnit {
    pub page_index: usize,
    /// Space-joined concatenation of the span texts
    pub text: String,
    pub spans: Vec<Span>,
    pub bbox: BoundingBox,
    pub kind: BlockKind,
}

impl TextUnit {
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, BlockKind::Text)
    }
}

/// A raw block as read from the document model, before merging.
///
/// Lines hold one span each in the mupdf path; synthetic inputs in tests may
/// carry several.
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub kind: BlockKind,
    pub bbox: BoundingBox,
    pub lines: Vec<Vec<Span>>,
}

/// Merge pass: raw blocks sorted by top edge, vertically-adjacent text
/// blocks folded into a single accumulator.
///
/// Non-text blocks are emitted unchanged and never participate in merging.
/// A new accumulator starts whenever the incoming block's top edge is more
/// than `merge_gap` away from the accumulator's running bottom edge.
pub fn merge_raw_blocks(mut blocks: Vec<RawBlock>, merge_gap: f32) -> Vec<RawBlock> {
    // Stable sort keeps original order for ties
    blocks.sort_by(|a, b| {
        a.bbox
            .y0
            .partial_cmp(&b.bbox.y0)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut merged: Vec<RawBlock> = Vec::with_capacity(blocks.len());
    let mut current: Option<RawBlock> = None;
    let mut running_bottom = 0.0_f32;

    for block in blocks {
        if block.kind == BlockKind::NonText {
            merged.push(block);
            continue;
        }

        match current.take() {
            Some(acc) if (block.bbox.y0 - running_bottom).abs() <= merge_gap => {
                let mut acc = acc;
                acc.lines.extend(block.lines);
                acc.bbox = acc.bbox.union(&block.bbox);
                running_bottom = acc.bbox.y1;
                current = Some(acc);
            }
            other => {
                if let Some(acc) = other {
                    merged.push(acc);
                }
                running_bottom = block.bbox.y1;
                current = Some(block);
            }
        }
    }

    if let Some(acc) = current {
        merged.push(acc);
    }

    merged
}

/// Turn a merged raw block into a text unit.
///
/// Spans whose text is empty or whitespace-only are excluded from both the
/// concatenation and the bbox union, so the bbox is recomputed tight around
/// real content rather than carried over from the merge step. Returns `None`
/// for text blocks whose merged text is empty.
pub fn finalize_unit(block: RawBlock, page_index: usize) -> Option<TextUnit> {
    if block.kind == BlockKind::NonText {
        return Some(TextUnit {
            page_index,
            text: String::new(),
            spans: Vec::new(),
            bbox: block.bbox,
            kind: BlockKind::NonText,
        });
    }

    let mut spans = Vec::new();
    let mut text = String::new();
    let mut bbox: Option<BoundingBox> = None;

    for line in block.lines {
        for span in line {
            if span.text.trim().is_empty() {
                continue;
            }

            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(span.text.trim());

            bbox = Some(bbox.map_or(span.bbox, |b| b.union(&span.bbox)));
            spans.push(span);
        }
    }

    let bbox = bbox?;
    if text.trim().is_empty() {
        return None;
    }

    Some(TextUnit {
        page_index,
        text,
        spans,
        bbox,
        kind: BlockKind::Text,
    })
}

/// Text-unit extraction from PDF pages
pub struct TextUnitExtractor<'a> {
    doc: &'a PdfDocument,
    config: ExtractConfig,
}

impl<'a> TextUnitExtractor<'a> {
    pub const fn new(doc: &'a PdfDocument, config: ExtractConfig) -> Self {
        Self { doc, config }
    }

    /// Extract merged text units from one page, in reading order.
    ///
    /// An empty page yields zero units.
    pub fn extract_page_units(&self, page_num: usize) -> Result<Vec<TextUnit>> {
        let raw = self.read_raw_blocks(page_num)?;
        let merged = merge_raw_blocks(raw, self.config.merge_gap);

        Ok(merged
            .into_iter()
            .filter_map(|block| finalize_unit(block, page_num))
            .collect())
    }

    /// Read raw positioned blocks from the document model, one span per line.
    fn read_raw_blocks(&self, page_num: usize) -> Result<Vec<RawBlock>> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;

        let doc = self.doc.open_document()?;
        let page = doc
            .load_page(page_index.into())
            .map_err(|e| Error::TextExtraction {
                page: page_num,
                reason: format!("Failed to load page: {e}"),
            })?;

        let text_page = page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| Error::TextExtraction {
                page: page_num,
                reason: format!("Failed to get text page: {e}"),
            })?;

        let mut blocks = Vec::new();

        for block in text_page.blocks() {
            let mut lines: Vec<Vec<Span>> = Vec::new();
            let mut block_bbox: Option<BoundingBox> = None;

            for line in block.lines() {
                let mut line_text = String::new();
                let mut line_bbox: Option<BoundingBox> = None;

                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        line_text.push(c);
                    }

                    let char_bbox = BoundingBox::from_quad(&text_char.quad());
                    line_bbox = Some(line_bbox.map_or(char_bbox, |b| b.union(&char_bbox)));
                }

                let Some(lb) = line_bbox else { continue };
                if line_text.trim().is_empty() {
                    continue;
                }

                block_bbox = Some(block_bbox.map_or(lb, |b| b.union(&lb)));

                // The structured-text line height runs slightly under the
                // visual font size; scale up to compensate.
                let font_size = (lb.height() * 1.18).clamp(6.0, 36.0);

                lines.push(vec![Span {
                    text: line_text,
                    bbox: lb,
                    font_size,
                    color: TextColor::black(),
                    font_name: None,
                }]);
            }

            if let Some(bbox) = block_bbox
                && !lines.is_empty()
            {
                blocks.push(RawBlock {
                    kind: BlockKind::Text,
                    bbox,
                    lines,
                });
            }
        }

        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, bbox: BoundingBox) -> Span {
        Span {
            text: text.to_string(),
            bbox,
            font_size: 12.0,
            color: TextColor::black(),
            font_name: None,
        }
    }

    fn text_block(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> RawBlock {
        let bbox = BoundingBox::new(x0, y0, x1, y1);
        RawBlock {
            kind: BlockKind::Text,
            bbox,
            lines: vec![vec![span(text, bbox)]],
        }
    }

    #[test]
    fn test_merge_adjacent_blocks() {
        // Two blocks 5 units apart merge; a distant third stays separate
        let blocks = vec![
            text_block("first line", 10.0, 100.0, 200.0, 120.0),
            text_block("second line", 10.0, 125.0, 200.0, 145.0),
            text_block("footer", 10.0, 500.0, 200.0, 520.0),
        ];

        let merged = merge_raw_blocks(blocks, 15.0);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].lines.len(), 2);
        assert_eq!(merged[0].bbox, BoundingBox::new(10.0, 100.0, 200.0, 145.0));
        assert_eq!(merged[1].lines.len(), 1);
    }

    #[test]
    fn test_merge_sorts_by_top_edge() {
        let blocks = vec![
            text_block("second", 10.0, 125.0, 200.0, 145.0),
            text_block("first", 10.0, 100.0, 200.0, 120.0),
        ];

        let merged = merge_raw_blocks(blocks, 15.0);
        assert_eq!(merged.len(), 1);
        let unit = finalize_unit(merged.into_iter().next().expect("one block"), 0)
            .expect("non-empty unit");
        assert_eq!(unit.text, "first second");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let blocks = vec![
            text_block("a", 10.0, 100.0, 200.0, 110.0),
            text_block("b", 10.0, 115.0, 200.0, 125.0),
            text_block("c", 10.0, 400.0, 200.0, 410.0),
        ];

        let once = merge_raw_blocks(blocks, 15.0);
        let bboxes: Vec<BoundingBox> = once.iter().map(|b| b.bbox).collect();
        let twice = merge_raw_blocks(once, 15.0);
        let bboxes_again: Vec<BoundingBox> = twice.iter().map(|b| b.bbox).collect();
        assert_eq!(bboxes, bboxes_again);
    }

    #[test]
    fn test_non_text_blocks_never_merge() {
        let image = RawBlock {
            kind: BlockKind::NonText,
            bbox: BoundingBox::new(10.0, 108.0, 200.0, 140.0),
            lines: Vec::new(),
        };
        let blocks = vec![
            text_block("above", 10.0, 100.0, 200.0, 110.0),
            image,
            text_block("below", 10.0, 115.0, 200.0, 125.0),
        ];

        let merged = merge_raw_blocks(blocks, 15.0);
        // Image passes through; the two text blocks still merge around it
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|b| b.kind == BlockKind::NonText));
        let text = merged
            .iter()
            .find(|b| b.kind == BlockKind::Text)
            .expect("text block");
        assert_eq!(text.lines.len(), 2);
    }

    #[test]
    fn test_finalize_bbox_is_union_of_nonempty_spans() {
        // The raw bbox is deliberately oversized; finalize recomputes it
        // tight around the spans that carry text.
        let block = RawBlock {
            kind: BlockKind::Text,
            bbox: BoundingBox::new(0.0, 0.0, 999.0, 999.0),
            lines: vec![
                vec![span("alpha", BoundingBox::new(10.0, 100.0, 60.0, 112.0))],
                vec![span("   ", BoundingBox::new(0.0, 0.0, 5.0, 5.0))],
                vec![span("beta", BoundingBox::new(20.0, 115.0, 80.0, 127.0))],
            ],
        };

        let unit = finalize_unit(block, 3).expect("non-empty unit");
        assert_eq!(unit.page_index, 3);
        assert_eq!(unit.text, "alpha beta");
        assert_eq!(unit.spans.len(), 2);
        assert_eq!(unit.bbox, BoundingBox::new(10.0, 100.0, 80.0, 127.0));
    }

    #[test]
    fn test_finalize_drops_whitespace_only_unit() {
        let block = RawBlock {
            kind: BlockKind::Text,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            lines: vec![vec![span("  \t ", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]],
        };
        assert!(finalize_unit(block, 0).is_none());
    }

    #[test]
    fn test_bbox_union() {
        let a = BoundingBox::new(0.0, 5.0, 10.0, 15.0);
        let b = BoundingBox::new(5.0, 0.0, 20.0, 10.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 20.0, 15.0));
    }
}
