//! PDF Relayout Core Library
//!
//! This library provides the core functionality for layout-preserving PDF
//! translation:
//! - Text-unit extraction (positioned, paragraph-scale groups of text)
//! - Chunked translation via OpenAI-compatible APIs, with retry and fallback
//! - Layout fitting (font-size adaptation and line wrapping)
//! - Page rewriting (redact original units, re-insert translations in place)
//! - Caching of translations (memory and disk)

pub mod cache;
pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod rewrite;
pub mod translator;
pub mod util;

pub use cache::{CacheKey, TranslationCache};
pub use config::{
    AppConfig, ChunkConfig, ExtractConfig, Lang, LayoutConfig, TextColor, TranslatorConfig,
    DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG,
};
pub use error::{Error, Result};
pub use layout::{LayoutFitter, LayoutPlan};
pub use pdf::{BoundingBox, PdfDocument, TextUnit, TextUnitExtractor};
pub use rewrite::{PageRewriter, ProgressFn};
pub use translator::{
    create_translator, ChunkedTranslator, FallbackGlossary, OpenAiTranslator, TranslationOutcome,
    Translator, WarningFn,
};

use std::sync::Arc;

/// High-level document translator that combines all components.
///
/// Wires the configured provider, glossary, cache, extractor, fitter and
/// rewriter together behind a single call.
pub struct DocumentTranslator {
    rewriter: PageRewriter,
    source_lang: Lang,
    target_lang: Lang,
}

impl DocumentTranslator {
    /// Create a new document translator with the given configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let provider = create_translator(&config.translator)?;
        Self::with_translator(provider, config)
    }

    /// Create with a custom translation backend
    pub fn with_translator(provider: Arc<dyn Translator>, config: AppConfig) -> Result<Self> {
        let glossary = FallbackGlossary::with_extra(&config.fallback);
        let cache = TranslationCache::new(&config.cache)?;
        let chunked = ChunkedTranslator::new(provider, glossary, cache, config.chunk.clone());

        Ok(Self {
            rewriter: PageRewriter::new(
                config.extract.clone(),
                config.layout.clone(),
                chunked,
                config.text_color,
            ),
            source_lang: config.source_lang,
            target_lang: config.target_lang,
        })
    }

    /// Translate a whole document, returning the rewritten PDF bytes.
    ///
    /// `on_progress` receives the completed fraction after each page;
    /// `on_warning` receives every recoverable problem (failed units,
    /// truncated layouts, unreadable pages).
    pub async fn translate_document(
        &self,
        doc: &PdfDocument,
        on_progress: Option<&ProgressFn<'_>>,
        on_warning: Option<&WarningFn<'_>>,
    ) -> Result<Vec<u8>> {
        self.rewriter
            .rewrite_document(
                doc,
                &self.source_lang,
                &self.target_lang,
                on_progress,
                on_warning,
            )
            .await
    }
}
