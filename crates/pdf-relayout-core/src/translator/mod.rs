mod chunk;
mod fallback;
mod openai;
mod traits;

pub use chunk::{ChunkedTranslator, TranslationOutcome, WarningFn};
pub use fallback::FallbackGlossary;
pub use openai::OpenAiTranslator;
pub use traits::Translator;

use std::sync::Arc;

use crate::config::TranslatorConfig;
use crate::error::Result;

/// Create a translation backend from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let translator = OpenAiTranslator::new(
        config.api_base.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.max_input_len,
    );

    Ok(Arc::new(translator))
}
