use std::path::Path;

use image::RgbImage;
use thiserror::Error;

pub mod backend;
pub mod compose;
pub mod decode;
pub mod images;
pub mod sparse;
pub mod tiff;
pub mod types;

pub use backend::LopdfBackend;
pub use decode::{detect_image_format, DecodeError};
pub use images::{ExtractOptions, ExtractedImages, ExtractionSummary};
pub use sparse::{KeyScheme, SparseList, DEFAULT_PAGE_STRIDE};
pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("No images to composite")]
    NoImages,
    #[error("Composite image exceeds the maximum canvas size")]
    CompositeTooLarge,
}

impl PdfError {
    /// The document itself could not be read; callers fall back to
    /// whole-page rasterization.
    pub fn is_structural(&self) -> bool {
        matches!(self, PdfError::Parse(_) | PdfError::Encrypted)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decode every image XObject of a PDF held in memory.
pub fn extract_images(bytes: &[u8], options: &ExtractOptions) -> Result<ExtractedImages, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    images::extract_images(&backend, options)
}

/// [`extract_images`] on a file.
pub fn extract_images_from_path(
    path: &Path,
    options: &ExtractOptions,
) -> Result<ExtractedImages, PdfError> {
    let backend = LopdfBackend::load_path(path)?;
    images::extract_images(&backend, options)
}

/// The document's text layer, all pages concatenated.
pub fn extract_text(bytes: &[u8]) -> Result<String, PdfError> {
    LopdfBackend::load_bytes(bytes)?.extract_text()
}

/// What [`convert_to_image`] produced.
#[derive(Debug)]
pub struct Conversion {
    /// `None` when the document held no decodable image, which is the cue to
    /// rasterize it by other means.
    pub canvas: Option<RgbImage>,
    pub summary: ExtractionSummary,
}

/// Walk, composite and save a PDF's embedded images to `out`.
pub fn convert_to_image(
    bytes: &[u8],
    options: &ExtractOptions,
    axis: Axis,
    out: &Path,
) -> Result<Conversion, PdfError> {
    let extracted = extract_images(bytes, options)?;
    let summary = extracted.summary();
    if extracted.is_empty() {
        log::warn!("No decodable images found, nothing to composite");
        return Ok(Conversion {
            canvas: None,
            summary,
        });
    }
    let slots: Vec<_> = extracted.images().map(Some).collect();
    let canvas = compose::merge_to_path(&slots, axis, out)?;
    Ok(Conversion {
        canvas: Some(canvas),
        summary,
    })
}
