use std::path::Path;
use std::sync::Arc;

use mupdf::Document as MuDocument;

use crate::error::{Error, Result};

/// Thread-safe wrapper around an input PDF document.
///
/// Holds the raw bytes only; every extraction pass opens a fresh mupdf
/// handle, and the rewrite step always produces a new byte artifact rather
/// than mutating the input.
pub struct PdfDocument {
    /// The raw PDF bytes
    bytes: Arc<Vec<u8>>,
    /// Number of pages
    page_count: usize,
    /// Content-based id (MD5 hex), computed once on load
    content_id: String,
}

impl PdfDocument {
    /// Open a PDF from bytes.
    ///
    /// Fails with [`Error::DocumentParse`] if the bytes are not a well-formed
    /// PDF; this is the only fatal error of a translation run.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        let doc = MuDocument::from_bytes(&bytes, "")
            .map_err(|e| Error::DocumentParse(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::DocumentParse(format!("Failed to get page count: {e}")))?;

        let content_id = format!("{:x}", md5::compute(&bytes));

        Ok(Self {
            bytes: Arc::new(bytes),
            page_count: usize::try_from(page_count).unwrap_or(0),
            content_id,
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            Error::DocumentParse(format!(
                "Failed to read file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_bytes(bytes)
    }

    /// Get number of pages
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get raw PDF bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Open the document for extraction (creates a temporary handle)
    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        MuDocument::from_bytes(&self.bytes, "")
            .map_err(|e| Error::DocumentParse(format!("Failed to open document: {e}")))
    }

    /// Cache key component derived from document content.
    pub fn content_id(&self) -> &str {
        &self.content_id
    }
}

impl Clone for PdfDocument {
    /// O(1): clones the `Arc` pointer to the underlying bytes, not the bytes.
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
            content_id: self.content_id.clone(),
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
