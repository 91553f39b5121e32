//! Chunked translation with retry, caching and glossary fallback.
//!
//! Sits between the page rewriter and a [`Translator`] backend. Splits long
//! inputs at sentence boundaries so every provider call stays under the
//! backend's input limit, retries transient failures with a fixed delay, and
//! degrades to a static glossary when the provider is exhausted. Failures are
//! soft: the caller always gets text back, flagged with a success bit.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::cache::{CacheKey, TranslationCache};
use crate::config::{ChunkConfig, Lang};
use crate::util::{is_numeric, split_sentences};

use super::fallback::FallbackGlossary;
use super::traits::Translator;

/// Callback for non-fatal translation warnings.
///
/// The lifetime parameter keeps the trait object's lifetime tied to the
/// borrow, so callers can pass references to closures capturing locals.
pub type WarningFn<'a> = dyn Fn(&str) + Send + Sync + 'a;

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\n\s*\n").unwrap()
});

/// Result of translating one text unit.
///
/// `success` is false only when the output is the untouched original after
/// the provider and the fallback glossary both failed.
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub original_text: String,
    pub translated_text: String,
    pub success: bool,
}

/// Translator wrapper that handles chunking, retries and fallback.
pub struct ChunkedTranslator {
    provider: Arc<dyn Translator>,
    glossary: FallbackGlossary,
    cache: TranslationCache,
    config: ChunkConfig,
}

impl ChunkedTranslator {
    pub fn new(
        provider: Arc<dyn Translator>,
        glossary: FallbackGlossary,
        cache: TranslationCache,
        config: ChunkConfig,
    ) -> Self {
        Self {
            provider,
            glossary,
            cache,
            config,
        }
    }

    /// Translate one text unit.
    ///
    /// Paragraphs (separated by blank lines) are translated independently and
    /// rejoined, so a failure in one paragraph does not poison the others.
    /// Never returns an error; provider failures surface as warnings and an
    /// unsuccessful outcome carrying the original text.
    pub async fn translate(
        &self,
        text: &str,
        source: &Lang,
        target: &Lang,
        on_warning: Option<&WarningFn<'_>>,
    ) -> TranslationOutcome {
        if text.trim().is_empty() {
            return TranslationOutcome {
                original_text: text.to_string(),
                translated_text: String::new(),
                success: true,
            };
        }

        // Normalize whitespace up front: trimmed paragraphs, empties dropped
        let paragraphs: Vec<&str> = PARAGRAPH_RE
            .split(text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if paragraphs.len() < 2 {
            let block = paragraphs.first().copied().unwrap_or_default();
            let (translated, success) =
                self.translate_block(block, source, target, on_warning).await;
            return TranslationOutcome {
                original_text: text.to_string(),
                translated_text: translated,
                success,
            };
        }

        let mut translated_paragraphs = Vec::with_capacity(paragraphs.len());
        let mut success = true;

        for paragraph in paragraphs {
            // Page numbers, list markers and similar fragments pass through
            if is_numeric(paragraph) || paragraph.chars().count() < 3 {
                translated_paragraphs.push(paragraph.to_string());
                continue;
            }

            let (translated, ok) = self
                .translate_block(paragraph, source, target, on_warning)
                .await;
            success &= ok;
            translated_paragraphs.push(translated);
        }

        TranslationOutcome {
            original_text: text.to_string(),
            translated_text: translated_paragraphs.join("\n\n"),
            success,
        }
    }

    /// Translate one paragraph-sized block: cache, retries, then fallback.
    async fn translate_block(
        &self,
        text: &str,
        source: &Lang,
        target: &Lang,
        on_warning: Option<&WarningFn<'_>>,
    ) -> (String, bool) {
        let key = CacheKey::new(text, self.provider.name(), source, target);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Translation cache hit ({} chars)", text.len());
            return (cached, true);
        }

        for attempt in 1..=self.config.max_retries {
            match self.translate_attempt(text, source, target).await {
                Ok(translated) => {
                    self.cache.insert(&key, translated.clone()).await;
                    return (translated, true);
                }
                Err(e) => {
                    warn!(
                        "Translation attempt {}/{} failed: {}",
                        attempt, self.config.max_retries, e
                    );
                    emit(on_warning, &format!("Translation attempt {attempt} failed: {e}"));

                    if attempt < self.config.max_retries {
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    }
                }
            }
        }

        if let Some(substituted) = self.glossary.substitute(text, target) {
            warn!("Provider exhausted, applied fallback glossary");
            emit(on_warning, "Provider unavailable, applied fallback glossary");
            return (substituted, true);
        }

        emit(
            on_warning,
            "Translation failed, keeping original text for this unit",
        );
        (text.to_string(), false)
    }

    /// One full translation pass, chunking the input if it exceeds the
    /// provider's limit. Fails if any chunk fails.
    async fn translate_attempt(&self, text: &str, source: &Lang, target: &Lang) -> crate::error::Result<String> {
        let max_len = self.provider.max_input_len();

        if text.chars().count() <= max_len {
            return self.provider.translate_chunk(text, source, target).await;
        }

        let chunks = pack_chunks(text, max_len);
        debug!("Splitting {} chars into {} chunks", text.len(), chunks.len());

        let mut translated = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                // Pace requests against the provider
                tokio::time::sleep(Duration::from_millis(self.config.chunk_delay_ms)).await;
            }
            translated.push(self.provider.translate_chunk(chunk, source, target).await?);
        }

        Ok(translated.join(" "))
    }
}

fn emit(on_warning: Option<&WarningFn<'_>>, message: &str) {
    if let Some(callback) = on_warning {
        callback(message);
    }
}

/// Greedy sentence packing: each chunk holds as many whole sentences as fit
/// under `max_len` characters. Sentences that exceed the limit on their own
/// are split on whitespace, and pathological unbroken runs are sliced hard,
/// so every returned chunk is within the limit.
fn pack_chunks(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();

        if sentence_len > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            split_oversized(&sentence, max_len, &mut chunks);
            continue;
        }

        let extra = if current.is_empty() { sentence_len } else { sentence_len + 1 };
        if current_len + extra > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&sentence);
        current_len += sentence_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn split_oversized(sentence: &str, max_len: usize, chunks: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0;

    for word in sentence.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let glyphs: Vec<char> = word.chars().collect();
            for piece in glyphs.chunks(max_len.max(1)) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let extra = if current.is_empty() { word_len } else { word_len + 1 };
        if current_len + extra > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::Error;

    use super::*;

    /// Records every chunk it sees; uppercases or fails per `failing`.
    struct MockProvider {
        max_input_len: usize,
        failing: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new(max_input_len: usize) -> Self {
            Self {
                max_input_len,
                failing: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(max_input_len: usize) -> Self {
            Self {
                failing: true,
                ..Self::new(max_input_len)
            }
        }
    }

    #[async_trait]
    impl Translator for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn max_input_len(&self) -> usize {
            self.max_input_len
        }

        async fn translate_chunk(&self, text: &str, _: &Lang, _: &Lang) -> crate::error::Result<String> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.failing {
                return Err(Error::ProviderTimeout);
            }
            Ok(text.to_uppercase())
        }
    }

    fn fast_config() -> ChunkConfig {
        ChunkConfig {
            max_retries: 2,
            chunk_delay_ms: 0,
            retry_delay_ms: 0,
        }
    }

    fn chunker(provider: Arc<dyn Translator>) -> ChunkedTranslator {
        ChunkedTranslator::new(
            provider,
            FallbackGlossary::builtin(),
            TranslationCache::disabled(),
            fast_config(),
        )
    }

    #[tokio::test]
    async fn test_empty_input_is_trivial_success() {
        let translator = chunker(Arc::new(MockProvider::new(100)));
        let outcome = translator
            .translate("   ", &Lang::auto(), &Lang::new("es"), None)
            .await;
        assert!(outcome.success);
        assert!(outcome.translated_text.is_empty());
    }

    #[tokio::test]
    async fn test_paragraphs_translated_independently() {
        let translator = chunker(Arc::new(MockProvider::new(100)));
        let outcome = translator
            .translate(
                "First paragraph here.\n\nSecond paragraph here.",
                &Lang::auto(),
                &Lang::new("es"),
                None,
            )
            .await;
        assert!(outcome.success);
        assert_eq!(
            outcome.translated_text,
            "FIRST PARAGRAPH HERE.\n\nSECOND PARAGRAPH HERE."
        );
    }

    #[tokio::test]
    async fn test_blank_trailing_paragraphs_are_dropped() {
        let translator = chunker(Arc::new(MockProvider::new(100)));
        let outcome = translator
            .translate(
                "First sentence.\n\nSecond sentence.\n\n",
                &Lang::auto(),
                &Lang::new("es"),
                None,
            )
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.translated_text, "FIRST SENTENCE.\n\nSECOND SENTENCE.");
    }

    #[tokio::test]
    async fn test_paragraph_padding_stripped_before_provider() {
        let provider = Arc::new(MockProvider::new(100));
        let translator = chunker(provider.clone());
        let outcome = translator
            .translate("  First sentence here.  ", &Lang::auto(), &Lang::new("es"), None)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.translated_text, "FIRST SENTENCE HERE.");
        assert_eq!(provider.calls.lock().unwrap()[0], "First sentence here.");
    }

    #[tokio::test]
    async fn test_numeric_paragraph_passes_through_untranslated() {
        let provider = Arc::new(MockProvider::new(100));
        let translator = chunker(provider.clone());
        let outcome = translator
            .translate("42\n\nReal content here.", &Lang::auto(), &Lang::new("es"), None)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.translated_text, "42\n\nREAL CONTENT HERE.");
        // The digits-only paragraph never reaches the provider
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("Real content"));
    }

    #[tokio::test]
    async fn test_long_input_chunks_stay_under_limit() {
        let provider = Arc::new(MockProvider::new(40));
        let translator = chunker(provider.clone());
        let text = "One short sentence here. Another short sentence. A third sentence follows it. And one more to finish with.";

        let outcome = translator
            .translate(text, &Lang::auto(), &Lang::new("es"), None)
            .await;

        assert!(outcome.success);
        let calls = provider.calls.lock().unwrap();
        assert!(calls.len() > 1);
        for call in calls.iter() {
            assert!(call.chars().count() <= 40, "oversized chunk: {call:?}");
        }
    }

    #[tokio::test]
    async fn test_unbroken_run_is_hard_sliced() {
        let monster = "x".repeat(95);
        let calls = {
            let provider = Arc::new(MockProvider::new(30));
            let translator = chunker(provider.clone());
            let outcome = translator
                .translate(&monster, &Lang::auto(), &Lang::new("es"), None)
                .await;
            assert!(outcome.success);
            provider.calls.lock().unwrap().clone()
        };
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| c.chars().count() <= 30));
    }

    #[tokio::test]
    async fn test_failed_provider_falls_back_to_glossary() {
        let translator = chunker(Arc::new(MockProvider::failing(100)));
        let outcome = translator
            .translate("Hello", &Lang::auto(), &Lang::new("es"), None)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.translated_text, "Hola");
    }

    #[tokio::test]
    async fn test_failed_provider_without_glossary_match_keeps_original() {
        let translator = chunker(Arc::new(MockProvider::failing(100)));
        let warnings = Mutex::new(Vec::new());
        let warn = |msg: &str| warnings.lock().unwrap().push(msg.to_string());

        let outcome = translator
            .translate("untranslatable gibberish", &Lang::auto(), &Lang::new("es"), Some(&warn))
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.translated_text, "untranslatable gibberish");
        assert!(!warnings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_provider_is_retried() {
        let provider = Arc::new(MockProvider::failing(100));
        let translator = chunker(provider.clone());
        translator
            .translate("some longer prose", &Lang::auto(), &Lang::new("es"), None)
            .await;
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cache_short_circuits_provider() {
        let provider = Arc::new(MockProvider::new(100));
        let cache = TranslationCache::new(&crate::config::CacheConfig {
            memory_enabled: true,
            memory_max_entries: 16,
            memory_ttl_seconds: 0,
            disk_enabled: false,
            disk_path: None,
        })
        .unwrap();
        let translator = ChunkedTranslator::new(
            provider.clone(),
            FallbackGlossary::builtin(),
            cache,
            fast_config(),
        );

        let first = translator
            .translate("cache me please", &Lang::auto(), &Lang::new("es"), None)
            .await;
        let second = translator
            .translate("cache me please", &Lang::auto(), &Lang::new("es"), None)
            .await;

        assert_eq!(first.translated_text, second.translated_text);
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }
}
