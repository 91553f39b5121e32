//! Layout fitting: font-size adaptation and line wrapping.
//!
//! No real glyph metrics are consulted. Both the shrink decision and the
//! wrap decision use the same character-count estimate, so a line that
//! "fits" by the wrap estimate is the same estimate that sized the font.

use crate::config::{Lang, LayoutConfig};
use crate::util::split_sentences;

/// Code points above this are treated as wide-glyph script (CJK, Cyrillic,
/// Arabic and friends) for width estimation.
const WIDE_GLYPH_THRESHOLD: u32 = 1000;

/// The computed font size and wrapped lines for one text unit, ready for
/// insertion into its bounding box. Transient: created and consumed within
/// the rewrite of a single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub font_size: f32,
    pub lines: Vec<String>,
}

/// Per-language width factor for wide-glyph text.
///
/// CJK glyphs occupy roughly a full em; German compounds and
/// Russian/Arabic words run long relative to their character count.
fn wide_glyph_factor(lang: &Lang) -> f32 {
    match lang.as_str() {
        "zh-CN" | "zh-TW" | "ja" | "ko" => 1.0,
        "de" => 1.2,
        "ru" | "ar" => 1.1,
        _ => 1.0,
    }
}

/// Fits translated text into the original bounding box
#[derive(Debug, Clone)]
pub struct LayoutFitter {
    config: LayoutConfig,
}

impl LayoutFitter {
    pub const fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Vertical advance between consecutive lines at a given font size.
    pub const fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.config.line_height_factor
    }

    /// Compute the layout plan for `text` against the original font size and
    /// box width.
    pub fn fit(
        &self,
        text: &str,
        target_lang: &Lang,
        original_font_size: f32,
        box_width: f32,
    ) -> LayoutPlan {
        let font_size = self.adjust_font_size(text, target_lang, original_font_size, box_width);
        let lines = self.wrap(text, font_size, box_width);
        LayoutPlan { font_size, lines }
    }

    /// Shrink the font when the estimated rendered width exceeds the box,
    /// but never below `min_scale` of the original size; past that the text
    /// is allowed to overflow rather than become illegible.
    pub fn adjust_font_size(
        &self,
        text: &str,
        target_lang: &Lang,
        original_font_size: f32,
        box_width: f32,
    ) -> f32 {
        let wide = text
            .chars()
            .any(|c| u32::from(c) > WIDE_GLYPH_THRESHOLD);
        let factor = if wide {
            wide_glyph_factor(target_lang)
        } else {
            self.config.char_width_factor
        };

        #[allow(clippy::cast_precision_loss)]
        let approx_width = text.chars().count() as f32 * original_font_size * factor;

        if approx_width <= box_width {
            return original_font_size;
        }

        let scaled = original_font_size * (box_width / approx_width);
        scaled.max(original_font_size * self.config.min_scale)
    }

    /// Wrap text to the per-line character budget derived from the font
    /// size. Sentences are kept together where possible; a sentence longer
    /// than a full line is split at word boundaries.
    pub fn wrap(&self, text: &str, font_size: f32, box_width: f32) -> Vec<String> {
        let avg_char_width = font_size * self.config.char_width_factor;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_chars = ((box_width / avg_char_width).floor() as usize).max(1);

        if text.chars().count() <= max_chars {
            return vec![text.to_string()];
        }

        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_count = 0usize;

        let mut push_piece = |piece: &str,
                              lines: &mut Vec<String>,
                              current: &mut String,
                              current_count: &mut usize| {
            let piece_len = piece.chars().count();
            if *current_count == 0 {
                current.push_str(piece);
                *current_count = piece_len;
            } else if *current_count + 1 + piece_len <= max_chars {
                current.push(' ');
                current.push_str(piece);
                *current_count += 1 + piece_len;
            } else {
                lines.push(std::mem::take(current));
                current.push_str(piece);
                *current_count = piece_len;
            }
        };

        for sentence in split_sentences(text) {
            if sentence.chars().count() <= max_chars {
                push_piece(&sentence, &mut lines, &mut current, &mut current_count);
            } else {
                for word in sentence.split_whitespace() {
                    push_piece(word, &mut lines, &mut current, &mut current_count);
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }

        lines
    }
}

impl Default for LayoutFitter {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
