use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Lang;
use crate::error::{Error, Result};

use super::traits::Translator;

/// OpenAI-compatible API translator.
/// Works with: llama.cpp server, Ollama, DeepSeek, OpenAI, etc.
///
/// Performs exactly one request per call; retry and backoff are owned by
/// the chunked translator layered on top.
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    pub api_base: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Maximum input length per call, in characters
    pub max_input_len: usize,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiTranslator {
    /// Create a new OpenAI-compatible translator.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created, which should only happen
    /// in extreme circumstances (e.g., TLS backend unavailable on the system).
    #[allow(clippy::expect_used)]
    pub fn new(
        api_base: String,
        api_key: Option<String>,
        model: String,
        max_input_len: usize,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base,
            api_key,
            model,
            max_input_len,
        }
    }

    /// Create translation prompt
    fn create_prompt(text: &str, source: &Lang, target: &Lang) -> String {
        let source_hint = if source.as_str() == "auto" {
            String::new()
        } else {
            format!(" from {}", language_name(source))
        };
        format!(
            "Translate the following text{} into {}. Output only the translation, no explanations.\n\nText: \"{}\"",
            source_hint,
            language_name(target),
            text
        )
    }

    async fn request(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let prompt = Self::create_prompt(text, source, target);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            // Lower temperature for more consistent translations
            temperature: Some(0.3),
        };

        debug!("Translation request to {} ({} chars)", url, text.len());

        let mut req = self.client.post(&url).json(&request);

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::ProviderTimeout
            } else {
                Error::ProviderRequest(e.to_string())
            }
        })?;

        if response.status().as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());

            warn!("Rate limited, retry after {:?}s", retry_after);
            return Err(Error::ProviderRateLimited { retry_after });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderRequest(format!("HTTP {status}: {body}")));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ProviderInvalidResponse(e.to_string()))?;

        let Some(choice) = chat_response.choices.first() else {
            return Err(Error::ProviderInvalidResponse(
                "No choices in response".to_string(),
            ));
        };

        // Remove quotes if the model wrapped the response
        let translated = choice
            .message
            .content
            .trim()
            .trim_start_matches('"')
            .trim_end_matches('"')
            .to_string();

        Ok(translated)
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    fn max_input_len(&self) -> usize {
        self.max_input_len
    }

    async fn translate_chunk(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        // Nothing to do when the languages match
        if source.as_str() == target.as_str() && source.as_str() != "auto" {
            return Ok(text.to_string());
        }

        self.request(text, source, target).await
    }
}

/// Convert language code to human-readable name for prompts
fn language_name(lang: &Lang) -> &'static str {
    match lang.as_str() {
        "en" => "English",
        "zh-CN" => "Simplified Chinese",
        "zh-TW" => "Traditional Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        // The model should still understand most ISO codes
        _ => "the specified language",
    }
}
