use async_trait::async_trait;

use crate::config::Lang;
use crate::error::Result;

/// Trait for translation provider backends.
///
/// Backends perform a single best-effort translation call; retry, chunking
/// and fallback live in [`crate::translator::ChunkedTranslator`]. Modeled as
/// an injected capability so the pipeline can be tested against
/// deterministic stubs.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short backend name, used in logs and cache keys
    fn name(&self) -> &'static str;

    /// Maximum input length per call, in characters.
    ///
    /// Inputs longer than this must be chunked by the caller.
    fn max_input_len(&self) -> usize;

    /// Translate one chunk of text from source to target language.
    ///
    /// `source` may be `auto` to let the provider detect the language.
    async fn translate_chunk(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;
}
