//! Concatenate decoded slices into one RGB page image.

use std::path::Path;

use image::{DynamicImage, RgbImage};

use crate::types::Axis;
use crate::PdfError;

/// Canvas dimensions for the present slices: the main axis is summed, the
/// cross axis is the maximum.
pub fn canvas_size(slots: &[Option<&DynamicImage>], axis: Axis) -> Option<(u32, u32)> {
    let mut main: u64 = 0;
    let mut cross: u32 = 0;
    let mut any = false;

    for image in slots.iter().flatten() {
        any = true;
        let (w, h) = (image.width(), image.height());
        let (along, across) = match axis {
            Axis::Vertical => (h, w),
            Axis::Horizontal => (w, h),
        };
        main += u64::from(along);
        cross = cross.max(across);
    }

    if !any {
        return None;
    }
    let main = u32::try_from(main).ok()?;
    Some(match axis {
        Axis::Vertical => (cross, main),
        Axis::Horizontal => (main, cross),
    })
}

/// Paint every present slice in order along `axis`.
///
/// Absent slots neither paint nor advance the offset. Narrower slices are
/// anchored at the canvas origin of the cross axis and the remainder stays
/// black.
pub fn merge(slots: &[Option<&DynamicImage>], axis: Axis) -> Result<RgbImage, PdfError> {
    let present = slots.iter().flatten().count();
    if present == 0 {
        return Err(PdfError::NoImages);
    }
    let (width, height) = canvas_size(slots, axis).ok_or(PdfError::CompositeTooLarge)?;

    let mut canvas = RgbImage::new(width, height);
    let mut offset: i64 = 0;

    for image in slots.iter().flatten() {
        let rgb = image.to_rgb8();
        let (x, y, advance) = match axis {
            Axis::Vertical => (0, offset, rgb.height()),
            Axis::Horizontal => (offset, 0, rgb.width()),
        };
        image::imageops::replace(&mut canvas, &rgb, x, y);
        offset += i64::from(advance);
    }

    log::debug!("Composited {} slice(s) into {}x{}", present, width, height);
    Ok(canvas)
}

/// [`merge`], then save to `path` in the format its extension names.
pub fn merge_to_path(
    slots: &[Option<&DynamicImage>],
    axis: Axis,
    path: &Path,
) -> Result<RgbImage, PdfError> {
    let canvas = merge(slots, axis)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    canvas.save(path)?;
    log::info!("Saved composite {}", path.display());
    Ok(canvas)
}
