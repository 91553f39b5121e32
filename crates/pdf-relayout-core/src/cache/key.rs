use crate::config::Lang;

/// Cache key for translated text units.
///
/// Keys are opaque MD5 hashes over all inputs that influence a translation:
/// the unit text, the provider, and the language pair. Fixed-length
/// (32 hex chars) for consistent storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hash: String,
}

impl CacheKey {
    pub fn new(text: &str, provider: &str, source_lang: &Lang, target_lang: &Lang) -> Self {
        // Null-byte separators prevent collisions between
        // inputs like ("a", "bc") and ("ab", "c").
        let combined = format!(
            "{}\0{}\0{}\0{}",
            text,
            provider.to_lowercase(),
            source_lang.as_str(),
            target_lang.as_str(),
        );

        Self {
            hash: format!("{:x}", md5::compute(combined.as_bytes())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}
