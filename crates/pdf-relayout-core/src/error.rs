use thiserror::Error;

/// Unified error type for pdf-relayout-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Document operations (parsing, extraction, rewriting, saving)
/// - Translation provider operations (requests, responses, rate limiting)
/// - Cache operations (initialization, writing; reads degrade to misses)
/// - Configuration operations (loading)
///
/// Only `DocumentParse` is fatal to a whole run; provider and per-unit
/// failures are absorbed by the pipeline and surfaced as warnings.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Document Errors
    // ==========================================================================
    /// Input bytes cannot be parsed as a PDF document (fatal)
    #[error("failed to parse PDF document: {0}")]
    DocumentParse(String),

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    InvalidPage { page: usize, total: usize },

    /// Failed to extract text units from a page
    #[error("failed to extract text from page {page}: {reason}")]
    TextExtraction { page: usize, reason: String },

    /// Failed to redact or re-insert a single text unit (recoverable, per unit)
    #[error("failed to rewrite unit on page {page}: {reason}")]
    UnitRender { page: usize, reason: String },

    /// Failed to serialize the rewritten document
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation provider request failed
    #[error("translation request failed: {0}")]
    ProviderRequest(String),

    /// Invalid response from the translation provider
    #[error("invalid translation response: {0}")]
    ProviderInvalidResponse(String),

    /// Rate limited by the translation provider
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    ProviderRateLimited { retry_after: Option<u64> },

    /// Translation request timed out
    #[error("translation request timed out")]
    ProviderTimeout,

    // ==========================================================================
    // Cache Errors
    // ==========================================================================
    /// Failed to initialize the cache
    #[error("failed to initialize cache: {0}")]
    CacheInit(String),

    /// Failed to write to cache
    #[error("failed to write to cache: {0}")]
    CacheWrite(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),
}

pub type Result<T> = std::result::Result<T, Error>;
