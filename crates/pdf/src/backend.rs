use std::collections::BTreeMap;
use std::path::Path;

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Thin owner of a parsed [`lopdf::Document`].
///
/// Loading is the only step allowed to fail for structural reasons; once a
/// backend exists, per-object problems are reported by the callers.
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        // A salvaged object table without a catalog has no page tree to walk.
        doc.catalog()
            .map_err(|e| PdfError::Parse(format!("no document catalog: {}", e)))?;

        Ok(Self { doc })
    }

    pub fn load_path(path: &Path) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::load_bytes(&bytes)
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &lopdf::Document {
        &self.doc
    }

    /// Mapping from 1-based page number to [`PageId`], in document order.
    pub fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    /// The text layer of every page, in page order.
    pub fn extract_text(&self) -> Result<String, PdfError> {
        let page_numbers: Vec<u32> = self.pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Ok(String::new());
        }
        self.doc
            .extract_text(&page_numbers)
            .map_err(|e| PdfError::Parse(format!("cannot extract text: {}", e)))
    }
}
