use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Language codes following ISO 639-1 with regional variants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Source wildcard: let the provider detect the input language.
    pub fn auto() -> Self {
        Self::new("auto")
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn default_source_lang() -> Lang {
    Lang::auto()
}

fn default_target_lang() -> Lang {
    Lang::new("es")
}

/// Text color for re-inserted translations, components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl TextColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn dark_red() -> Self {
        Self::new(0.8, 0.0, 0.0)
    }

    pub const fn blue() -> Self {
        Self::new(0.0, 0.0, 0.8)
    }

    pub const fn dark_green() -> Self {
        Self::new(0.0, 0.5, 0.0)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "black" => Some(Self::black()),
            "darkred" | "dark_red" | "dark-red" => Some(Self::dark_red()),
            "blue" => Some(Self::blue()),
            "darkgreen" | "dark_green" | "dark-green" => Some(Self::dark_green()),
            _ => None,
        }
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::black()
    }
}

/// Translation backend configuration for OpenAI-compatible APIs.
///
/// Supports llama.cpp, Ollama, DeepSeek, OpenAI, and any other OpenAI-compatible API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Maximum input length per provider call, in characters
    #[serde(default = "default_max_input_len")]
    pub max_input_len: usize,
}

impl TranslatorConfig {
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key,
            model: model.into(),
            max_input_len: default_max_input_len(),
        }
    }
}

const fn default_max_input_len() -> usize {
    4000
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/v1".to_string(),
            api_key: None,
            model: "default_model".to_string(),
            max_input_len: default_max_input_len(),
        }
    }
}

/// Text-unit extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Maximum vertical gap (in layout units) between two raw blocks for
    /// them to be merged into one text unit
    #[serde(default = "default_merge_gap")]
    pub merge_gap: f32,
}

const fn default_merge_gap() -> f32 {
    15.0
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            merge_gap: default_merge_gap(),
        }
    }
}

/// Chunked-translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Number of attempts per translation call before falling back
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between consecutive chunk requests (rate limiting)
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    /// Backoff delay after a failed attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_chunk_delay_ms() -> u64 {
    500
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            chunk_delay_ms: default_chunk_delay_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Layout-fitting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Average character width as a fraction of the font size
    #[serde(default = "default_char_width_factor")]
    pub char_width_factor: f32,

    /// Minimum font scale relative to the original size; below this the
    /// text is allowed to overflow rather than become illegible
    #[serde(default = "default_min_scale")]
    pub min_scale: f32,

    /// Line height as a multiple of the font size
    #[serde(default = "default_line_height_factor")]
    pub line_height_factor: f32,
}

const fn default_char_width_factor() -> f32 {
    0.6
}

const fn default_min_scale() -> f32 {
    0.7
}

const fn default_line_height_factor() -> f32 {
    1.3
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            char_width_factor: default_char_width_factor(),
            min_scale: default_min_scale(),
            line_height_factor: default_line_height_factor(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable memory cache
    #[serde(default = "default_true")]
    pub memory_enabled: bool,

    /// Maximum memory cache entries
    #[serde(default = "default_memory_max_entries")]
    pub memory_max_entries: u64,

    /// Memory cache TTL in seconds (0 = no expiry)
    #[serde(default)]
    pub memory_ttl_seconds: u64,

    /// Enable disk cache
    #[serde(default = "default_true")]
    pub disk_enabled: bool,

    /// Disk cache directory (defaults to .cache/pdf-relayout)
    pub disk_path: Option<PathBuf>,
}

const fn default_true() -> bool {
    true
}

const fn default_memory_max_entries() -> u64 {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_enabled: true,
            memory_max_entries: default_memory_max_entries(),
            memory_ttl_seconds: 0,
            disk_enabled: true,
            disk_path: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source language (`auto` lets the provider detect it)
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    /// Target language
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Color override for re-inserted text; `None` keeps each unit's own color
    #[serde(default)]
    pub text_color: Option<TextColor>,

    /// Translation backend configuration
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Text-unit extraction tuning
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Chunked-translation tuning
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Layout-fitting tuning
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Extra fallback glossary entries, merged over the built-in tables:
    /// target language code -> source phrase -> replacement
    #[serde(default)]
    pub fallback: HashMap<String, BTreeMap<String, String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            text_color: None,
            translator: TranslatorConfig::default(),
            extract: ExtractConfig::default(),
            chunk: ChunkConfig::default(),
            layout: LayoutConfig::default(),
            cache: CacheConfig::default(),
            fallback: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations (~/.config/pdf-relayout/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-relayout").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "auto";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "es";
