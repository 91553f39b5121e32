//! Page rewriting: redact original text units and re-insert translations.
//!
//! # Coordinate System
//!
//! PDF uses a **bottom-left origin** coordinate system where:
//! - (0, 0) is at the bottom-left corner of the page
//! - X increases to the right
//! - Y increases upward
//!
//! However, the extraction side (MuPDF) uses a **top-left origin**:
//! - (0, 0) is at the top-left corner
//! - Y increases downward
//!
//! This module converts between the two when positioning rewrites:
//! ```text
//! pdf_y = page_height - mupdf_y
//! ```
//!
//! # Rewrite Strategy
//!
//! Every unit is planned in full (translation, font size, wrapped lines,
//! content operations) before the document is touched. A unit whose plan
//! fails contributes nothing; the page keeps its original rendering there.
//! Planned operations are appended as one extra content stream per page, so
//! the original page content is never rewritten in place.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, warn};

use crate::config::{ExtractConfig, Lang, LayoutConfig, TextColor};
use crate::error::{Error, Result};
use crate::layout::LayoutFitter;
use crate::pdf::{PageGeometry, PdfDocument, PageIndex, TextUnit, TextUnitExtractor};
use crate::translator::{ChunkedTranslator, WarningFn};
use crate::util::{contains_letters, is_numeric};

/// Callback reporting overall progress as a fraction in 0.0..=1.0.
///
/// The lifetime parameter keeps the trait object's lifetime tied to the
/// borrow, so callers can pass references to closures capturing locals.
pub type ProgressFn<'a> = dyn Fn(f32) + Send + Sync + 'a;

/// Units narrower or shorter than this (in points) are decorative
/// fragments, not prose; they are left untouched.
const MIN_UNIT_DIMENSION: f32 = 10.0;

/// Name under which the rewrite font is registered in page resources
const FONT_RESOURCE_NAME: &str = "FRel";

/// Horizontal inset of re-inserted text from the unit's left edge (points)
const TEXT_LEFT_INSET: f32 = 2.0;

/// Rewrites a document page by page, unit by unit.
pub struct PageRewriter {
    extract: ExtractConfig,
    fitter: LayoutFitter,
    translator: ChunkedTranslator,
    /// Color override for re-inserted text; `None` keeps each unit's color
    text_color: Option<TextColor>,
}

impl PageRewriter {
    pub fn new(
        extract: ExtractConfig,
        layout: LayoutConfig,
        translator: ChunkedTranslator,
        text_color: Option<TextColor>,
    ) -> Self {
        Self {
            extract,
            fitter: LayoutFitter::new(layout),
            translator,
            text_color,
        }
    }

    /// Translate and rewrite every page, returning the new PDF bytes.
    ///
    /// Only a document that cannot be loaded or saved fails the whole run;
    /// page and unit level problems surface through `on_warning` and leave
    /// the affected content in its original form.
    pub async fn rewrite_document(
        &self,
        source_doc: &PdfDocument,
        source: &Lang,
        target: &Lang,
        on_progress: Option<&ProgressFn<'_>>,
        on_warning: Option<&WarningFn<'_>>,
    ) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(source_doc.bytes())
            .map_err(|e| Error::Lopdf(format!("Failed to load PDF: {e}")))?;

        let pages = doc.get_pages();
        let total = source_doc.page_count();
        let extractor = TextUnitExtractor::new(source_doc, self.extract.clone());

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));

        for page_num in 0..total {
            let page_index = PageIndex::try_from_page_num(page_num, total)?;

            let Some(&page_id) = pages.get(&page_index.as_lopdf_page_number()) else {
                // Extraction and rewriting disagree on the page tree
                emit(on_warning, &format!("Page {} missing from page tree, skipped", page_num + 1));
                report_progress(on_progress, page_num + 1, total);
                continue;
            };

            let media_box = {
                let page_obj = doc
                    .get_object(page_id)
                    .map_err(|e| Error::Lopdf(format!("Failed to get page object: {e}")))?;
                get_media_box(&doc, page_obj)
            };
            let geometry = PageGeometry {
                page_index: page_num,
                width: media_box[2] - media_box[0],
                height: media_box[3] - media_box[1],
            };

            let units = match extractor.extract_page_units(page_num) {
                Ok(units) => units,
                Err(e) => {
                    warn!("Skipping page {}: {}", page_num + 1, e);
                    emit(on_warning, &format!("Page {} could not be read: {e}", page_num + 1));
                    report_progress(on_progress, page_num + 1, total);
                    continue;
                }
            };

            let mut operations: Vec<Operation> = Vec::new();

            for unit in &units {
                if should_skip(unit) {
                    continue;
                }

                let outcome = self
                    .translator
                    .translate(&unit.text, source, target, on_warning)
                    .await;

                // A failed unit keeps its original rendering on the page
                if !outcome.success || outcome.translated_text.trim().is_empty() {
                    continue;
                }

                operations.extend(self.plan_unit_ops(
                    unit,
                    &outcome.translated_text,
                    target,
                    &geometry,
                    on_warning,
                ));
            }

            if !operations.is_empty() {
                ensure_font_resource(&mut doc, page_id, font_id)?;
                match append_content_to_page(&mut doc, page_id, page_num, operations) {
                    Ok(()) => debug!("Rewrote page {} ({} units)", page_num + 1, units.len()),
                    Err(e) => {
                        // The page keeps its original content
                        warn!("{}", e);
                        emit(on_warning, &e.to_string());
                    }
                }
            }

            report_progress(on_progress, page_num + 1, total);
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }

    /// Plan the full operation sequence for one unit: white rectangle over
    /// the original text, then the wrapped translation on top. Pure with
    /// respect to the document; the caller decides whether to apply it.
    fn plan_unit_ops(
        &self,
        unit: &TextUnit,
        translated: &str,
        target: &Lang,
        geometry: &PageGeometry,
        on_warning: Option<&WarningFn<'_>>,
    ) -> Vec<Operation> {
        let first_span = unit.spans.first();
        let original_font_size = first_span.map_or(12.0, |s| s.font_size);
        let color = self
            .text_color
            .or_else(|| first_span.map(|s| s.color))
            .unwrap_or_default();

        let plan = self
            .fitter
            .fit(translated, target, original_font_size, unit.bbox.width());
        let line_height = self.fitter.line_height(plan.font_size);

        let mut ops = vec![
            Operation::new("q", vec![]),
            // Cover the original text with a white rectangle
            Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
            Operation::new(
                "re",
                vec![
                    unit.bbox.x0.into(),
                    (geometry.height - unit.bbox.y1).into(),
                    unit.bbox.width().into(),
                    unit.bbox.height().into(),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("rg", vec![color.r.into(), color.g.into(), color.b.into()]),
            // Fill mode; OCR layers leave invisible-text mode (3) behind
            Operation::new("Tr", vec![0.into()]),
        ];

        let mut truncated = false;
        for (i, line) in plan.lines.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let baseline = unit.bbox.y0 + plan.font_size + i as f32 * line_height;

            // The first line always renders; past the box bottom we stop
            if i > 0 && baseline > unit.bbox.y1 {
                truncated = true;
                break;
            }

            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![FONT_RESOURCE_NAME.into(), plan.font_size.into()],
            ));
            ops.push(Operation::new(
                "Td",
                vec![
                    (unit.bbox.x0 + TEXT_LEFT_INSET).into(),
                    (geometry.height - baseline).into(),
                ],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(winansi_bytes(line), StringFormat::Literal)],
            ));
            ops.push(Operation::new("ET", vec![]));
        }

        if truncated {
            emit(
                on_warning,
                &format!(
                    "Translation truncated on page {} (text exceeds original box)",
                    unit.page_index + 1
                ),
            );
        }

        ops.push(Operation::new("Q", vec![]));
        ops
    }
}

fn emit(on_warning: Option<&WarningFn<'_>>, message: &str) {
    if let Some(callback) = on_warning {
        callback(message);
    }
}

fn report_progress(on_progress: Option<&ProgressFn<'_>>, done: usize, total: usize) {
    if let Some(callback) = on_progress
        && total > 0
    {
        #[allow(clippy::cast_precision_loss)]
        callback(done as f32 / total as f32);
    }
}

/// Gates deciding whether a unit is worth translating and rewriting at all.
///
/// Non-text blocks, whitespace, bare numbers (page numbers), fragments
/// shorter than three characters, letterless runs of symbols and units with
/// degenerate boxes all pass through untouched.
fn should_skip(unit: &TextUnit) -> bool {
    if !unit.is_text() {
        return true;
    }

    let text = unit.text.trim();
    if text.is_empty() || is_numeric(text) || text.chars().count() < 3 || !contains_letters(text) {
        return true;
    }

    unit.bbox.width() < MIN_UNIT_DIMENSION || unit.bbox.height() < MIN_UNIT_DIMENSION
}

/// Encode text for a WinAnsi-encoded base font. Code points outside the
/// single-byte range have no glyph there and degrade to `?`.
fn winansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Get media box from a page object, following `Parent` links up the page
/// tree. Falls back to US Letter.
fn get_media_box(doc: &Document, page_obj: &Object) -> [f32; 4] {
    if let Object::Dictionary(dict) = page_obj {
        if let Ok(Object::Array(arr)) = dict.get(b"MediaBox")
            && arr.len() == 4
        {
            let values: Vec<f32> = arr
                .iter()
                .filter_map(|o| match o {
                    #[allow(clippy::cast_precision_loss)]
                    Object::Integer(i) => Some(*i as f32),
                    Object::Real(r) => Some(*r),
                    _ => None,
                })
                .collect();

            if values.len() == 4 {
                return [values[0], values[1], values[2], values[3]];
            }
        }

        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent")
            && let Ok(parent) = doc.get_object(*parent_id)
        {
            return get_media_box(doc, parent);
        }
    }

    [0.0, 0.0, 612.0, 792.0]
}

/// Register the rewrite font in the page's resource dictionary, handling
/// referenced, inline and missing `Resources` entries.
fn ensure_font_resource(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<()> {
    let resources = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|dict| dict.get(b"Resources").ok().cloned());

    match resources {
        Some(Object::Reference(res_id)) => set_font_entry(doc, res_id, font_id),
        Some(Object::Dictionary(mut res)) => {
            let fonts_entry = res.get(b"Font").ok().cloned();
            if let Some(Object::Reference(fonts_id)) = fonts_entry {
                if let Ok(Object::Dictionary(fonts)) = doc.get_object_mut(fonts_id) {
                    fonts.set(FONT_RESOURCE_NAME, Object::Reference(font_id));
                }
                return Ok(());
            }

            let mut fonts = match fonts_entry {
                Some(Object::Dictionary(fonts)) => fonts,
                _ => Dictionary::new(),
            };
            fonts.set(FONT_RESOURCE_NAME, Object::Reference(font_id));
            res.set("Font", Object::Dictionary(fonts));
            set_dict_entry(doc, page_id, "Resources", Object::Dictionary(res))
        }
        _ => {
            let mut fonts = Dictionary::new();
            fonts.set(FONT_RESOURCE_NAME, Object::Reference(font_id));
            let mut res = Dictionary::new();
            res.set("Font", Object::Dictionary(fonts));
            set_dict_entry(doc, page_id, "Resources", Object::Dictionary(res))
        }
    }
}

fn set_font_entry(doc: &mut Document, res_id: ObjectId, font_id: ObjectId) -> Result<()> {
    let fonts_entry = doc
        .get_dictionary(res_id)
        .ok()
        .and_then(|res| res.get(b"Font").ok().cloned());

    match fonts_entry {
        Some(Object::Reference(fonts_id)) => {
            if let Ok(Object::Dictionary(fonts)) = doc.get_object_mut(fonts_id) {
                fonts.set(FONT_RESOURCE_NAME, Object::Reference(font_id));
            }
            Ok(())
        }
        Some(Object::Dictionary(mut fonts)) => {
            fonts.set(FONT_RESOURCE_NAME, Object::Reference(font_id));
            set_dict_entry(doc, res_id, "Font", Object::Dictionary(fonts))
        }
        _ => {
            let mut fonts = Dictionary::new();
            fonts.set(FONT_RESOURCE_NAME, Object::Reference(font_id));
            set_dict_entry(doc, res_id, "Font", Object::Dictionary(fonts))
        }
    }
}

fn set_dict_entry(doc: &mut Document, id: ObjectId, key: &str, value: Object) -> Result<()> {
    match doc.get_object_mut(id) {
        Ok(Object::Dictionary(dict)) => {
            dict.set(key, value);
            Ok(())
        }
        Ok(_) => Err(Error::Lopdf(format!("Object {id:?} is not a dictionary"))),
        Err(e) => Err(Error::Lopdf(format!("Failed to get object: {e}"))),
    }
}

/// Append an extra content stream to a page, preserving its existing
/// content in place.
fn append_content_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    page_num: usize,
    operations: Vec<Operation>,
) -> Result<()> {
    let content = Content { operations };
    let encoded = content.encode().map_err(|e| Error::UnitRender {
        page: page_num,
        reason: format!("Failed to encode content stream: {e}"),
    })?;

    let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

    let page = doc.get_object_mut(page_id).map_err(|e| Error::UnitRender {
        page: page_num,
        reason: format!("Failed to get page: {e}"),
    })?;

    if let Object::Dictionary(dict) = page {
        let existing_contents = dict.get(b"Contents").ok().cloned();

        match existing_contents {
            Some(Object::Reference(existing_id)) => {
                dict.set(
                    "Contents",
                    Object::Array(vec![
                        Object::Reference(existing_id),
                        Object::Reference(content_id),
                    ]),
                );
            }
            Some(Object::Array(mut arr)) => {
                arr.push(Object::Reference(content_id));
                dict.set("Contents", Object::Array(arr));
            }
            _ => {
                dict.set("Contents", Object::Reference(content_id));
            }
        }
    }

    Ok(())
}
