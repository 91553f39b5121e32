//! Static fallback substitution tables.
//!
//! Used only when the provider path is exhausted: a last-resort word/phrase
//! glossary per target language, applied as case-insensitive whole-word
//! replacement.

use std::collections::{BTreeMap, HashMap};

use regex::{NoExpand, Regex};
use tracing::warn;

use crate::config::Lang;

/// One compiled substitution entry
struct Entry {
    pattern: Regex,
    replacement: String,
}

/// Per-target-language phrase substitution tables, compiled once at
/// construction and passed by reference into the chunked translator.
pub struct FallbackGlossary {
    tables: HashMap<String, Vec<Entry>>,
}

impl FallbackGlossary {
    /// Built-in seed tables for common target languages.
    pub fn builtin() -> Self {
        let mut tables: HashMap<String, Vec<Entry>> = HashMap::new();

        let seed: [(&str, &[(&str, &str)]); 3] = [
            (
                "es",
                &[
                    ("Hello", "Hola"),
                    ("Document", "Documento"),
                    ("Translation", "Traducción"),
                    ("File", "Archivo"),
                    ("Text", "Texto"),
                    ("Language", "Idioma"),
                ],
            ),
            (
                "fr",
                &[
                    ("Hello", "Bonjour"),
                    ("Translation", "Traduction"),
                    ("File", "Fichier"),
                    ("Text", "Texte"),
                    ("Language", "Langue"),
                ],
            ),
            (
                "de",
                &[
                    ("Hello", "Hallo"),
                    ("Document", "Dokument"),
                    ("Translation", "Übersetzung"),
                    ("File", "Datei"),
                    ("Language", "Sprache"),
                ],
            ),
        ];

        for (lang, entries) in seed {
            let compiled = entries
                .iter()
                .filter_map(|(phrase, replacement)| compile_entry(phrase, replacement))
                .collect();
            tables.insert(lang.to_string(), compiled);
        }

        Self { tables }
    }

    /// Built-in tables extended with user-configured entries
    /// (target language code -> source phrase -> replacement).
    pub fn with_extra(extra: &HashMap<String, BTreeMap<String, String>>) -> Self {
        let mut glossary = Self::builtin();

        for (lang, entries) in extra {
            let table = glossary.tables.entry(lang.clone()).or_default();
            for (phrase, replacement) in entries {
                if let Some(entry) = compile_entry(phrase, replacement) {
                    table.push(entry);
                }
            }
        }

        glossary
    }

    /// Apply the target language's table to `text`.
    ///
    /// Returns `Some(substituted)` only when at least one replacement
    /// changed the text; `None` when the language is unsupported or no
    /// entry matched (soft failure, never an error).
    pub fn substitute(&self, text: &str, target_lang: &Lang) -> Option<String> {
        let table = self.tables.get(target_lang.as_str())?;

        let mut result = text.to_string();
        for entry in table {
            result = entry
                .pattern
                .replace_all(&result, NoExpand(&entry.replacement))
                .into_owned();
        }

        (result != text).then_some(result)
    }
}

impl Default for FallbackGlossary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Compile a case-insensitive whole-word pattern for one phrase.
fn compile_entry(phrase: &str, replacement: &str) -> Option<Entry> {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase))) {
        Ok(pattern) => Some(Entry {
            pattern,
            replacement: replacement.to_string(),
        }),
        Err(e) => {
            warn!("Skipping unusable glossary entry '{}': {}", phrase, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_whole_words_case_insensitive() {
        let glossary = FallbackGlossary::builtin();
        // Matching is case-insensitive; the replacement is inserted verbatim
        let result = glossary
            .substitute("hello, this document", &Lang::new("es"))
            .expect("should substitute");
        assert_eq!(result, "Hola, this Documento");
    }

    #[test]
    fn test_substitute_does_not_touch_partial_words() {
        let glossary = FallbackGlossary::builtin();
        // "Textual" must not match the whole-word "Text" entry
        assert!(glossary.substitute("Textual analysis", &Lang::new("es")).is_none());
    }

    #[test]
    fn test_unsupported_language_is_soft() {
        let glossary = FallbackGlossary::builtin();
        assert!(glossary.substitute("Hello", &Lang::new("xx")).is_none());
    }

    #[test]
    fn test_no_match_returns_none() {
        let glossary = FallbackGlossary::builtin();
        assert!(glossary.substitute("nothing to see", &Lang::new("es")).is_none());
    }

    #[test]
    fn test_extra_entries_extend_builtin() {
        let mut extra = HashMap::new();
        extra.insert(
            "es".to_string(),
            BTreeMap::from([("Page".to_string(), "Página".to_string())]),
        );
        let glossary = FallbackGlossary::with_extra(&extra);

        let result = glossary
            .substitute("Page one", &Lang::new("es"))
            .expect("extra entry should apply");
        assert_eq!(result, "Página one");
    }
}
