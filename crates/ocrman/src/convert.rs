//! PDF to single-image conversion with the ImageMagick fallback.

use std::fs;
use std::path::{Path, PathBuf};

use pdf::{Axis, ExtractOptions, ExtractionSummary};

use crate::prelude::*;
use crate::tools::ImageMagick;

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub extract: ExtractOptions,
    pub axis: Axis,
    /// Rasterize whole pages when no embedded image could be used.
    pub force: bool,
}

/// `{stem}.force.png` next to `output`.
pub fn forced_output(output: &Path) -> PathBuf {
    output.with_extension("force.png")
}

/// Where a converted image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Composited from the document's embedded images.
    Embedded,
    /// Rendered by ImageMagick.
    Rasterized,
}

#[derive(Debug)]
pub struct Converted {
    /// The image actually produced, if any.
    pub image: Option<(PathBuf, Source)>,
    /// Present whenever the document could be walked.
    pub summary: Option<ExtractionSummary>,
}

impl Converted {
    pub fn path(&self) -> Option<&Path> {
        self.image.as_ref().map(|(path, _)| path.as_path())
    }
}

/// Composite the embedded images of `input` into `output`.
///
/// When the document cannot be parsed or holds no decodable image, and
/// `force` is set, ImageMagick renders the pages into [`forced_output`]
/// instead.
pub fn convert_pdf_to_image(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> Result<Converted> {
    let bytes = fs::read(input).with_context(|| f!("Failed to read {}", input.display()))?;

    let summary = match pdf::convert_to_image(&bytes, &options.extract, options.axis, output) {
        Ok(conversion) if conversion.canvas.is_some() => {
            return Ok(Converted {
                image: Some((output.to_path_buf(), Source::Embedded)),
                summary: Some(conversion.summary),
            });
        }
        Ok(conversion) => {
            log::warn!("{}: no decodable images", input.display());
            Some(conversion.summary)
        }
        Err(e) if e.is_structural() => {
            log::warn!("{}: {}", input.display(), e);
            None
        }
        Err(e) => return Err(eyre!("Failed to convert {}: {}", input.display(), e)),
    };

    let image = if options.force {
        rasterize_fallback(input, &forced_output(output))?.map(|path| (path, Source::Rasterized))
    } else {
        None
    };
    Ok(Converted { image, summary })
}

/// Render every page of `input` into `output` with ImageMagick.
///
/// A missing ImageMagick is not an error: nothing is produced.
pub fn rasterize_fallback(input: &Path, output: &Path) -> Result<Option<PathBuf>> {
    let Some(magick) = ImageMagick::locate() else {
        log::warn!(
            "ImageMagick not found, cannot rasterize {}",
            input.display()
        );
        return Ok(None);
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    magick.rasterize(input, output)?;
    log::info!("Rasterized {} -> {}", input.display(), output.display());
    Ok(Some(output.to_path_buf()))
}
