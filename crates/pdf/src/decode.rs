use std::borrow::Cow;
use std::io::{Cursor, Read};

use flate2::read::ZlibDecoder;
use image::DynamicImage;
use thiserror::Error;

use crate::tiff;
use crate::types::{CcittGroup, ColorSpace, DecodeParams, FilterKind, ImageFormat, SampleLayout};

/// Why a single image object could not be turned into pixels.
///
/// Both variants only cost the document one slot; neither aborts a walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
    #[error("malformed image data: {0}")]
    MalformedData(String),
}

// ---------------------------------------------------------------------------
// Format sniffing
// ---------------------------------------------------------------------------

/// Detect the image format from raw bytes using magic byte signatures.
///
/// Returns `ImageFormat::Unknown` if the bytes are too short (< 8) or no
/// known signature matches.
pub fn detect_image_format(bytes: &[u8]) -> ImageFormat {
    if bytes.len() < 8 {
        return ImageFormat::Unknown;
    }

    // JPEG: FF D8 FF
    if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        return ImageFormat::Jpeg;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if bytes[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return ImageFormat::Png;
    }

    // JPEG2000: 00 00 00 0C 6A 50 20 20
    if bytes[..8] == [0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20] {
        return ImageFormat::Jpeg2000;
    }

    // GIF: "GIF87a" or "GIF89a"
    if &bytes[..6] == b"GIF87a" || &bytes[..6] == b"GIF89a" {
        return ImageFormat::Gif;
    }

    // TIFF: little-endian (49 49 2A 00) or big-endian (4D 4D 00 2A)
    if bytes[..4] == [0x49, 0x49, 0x2A, 0x00] || bytes[..4] == [0x4D, 0x4D, 0x00, 0x2A] {
        return ImageFormat::Tiff;
    }

    // BMP: "BM"
    if bytes[0] == b'B' && bytes[1] == b'M' {
        return ImageFormat::Bmp;
    }

    // WebP: "RIFF" at offset 0 and "WEBP" at offset 8
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return ImageFormat::WebP;
    }

    ImageFormat::Unknown
}

// ---------------------------------------------------------------------------
// Filter chain resolution
// ---------------------------------------------------------------------------

/// The payload left once any wrapping compression layer has been removed.
#[derive(Debug, Clone)]
pub struct Unwrapped<'a> {
    /// The filter still to be decoded, or `None` for bare samples.
    pub filter: Option<FilterKind>,
    pub bytes: Cow<'a, [u8]>,
}

/// Resolve a filter chain in two passes: strip a leading Flate layer if it
/// wraps another filter, then report the inner filter for dispatch.
pub fn unwrap_filters<'a>(
    filters: &[FilterKind],
    raw: &'a [u8],
) -> Result<Unwrapped<'a>, DecodeError> {
    match filters {
        [] => Ok(Unwrapped {
            filter: None,
            bytes: Cow::Borrowed(raw),
        }),
        [only] => Ok(Unwrapped {
            filter: Some(only.clone()),
            bytes: Cow::Borrowed(raw),
        }),
        [FilterKind::Flate, inner, ..] => Ok(Unwrapped {
            filter: Some(inner.clone()),
            bytes: Cow::Owned(inflate(raw)?),
        }),
        [outer, ..] => Err(DecodeError::UnsupportedFilter(format!(
            "{} wrapping another filter",
            outer
        ))),
    }
}

/// Zlib-inflate a Flate stream.
pub fn inflate(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::MalformedData(format!("inflate failed: {}", e)))?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Per-filter decoding
// ---------------------------------------------------------------------------

/// Decode an unwrapped payload into pixels.
pub fn decode(
    filter: Option<&FilterKind>,
    bytes: &[u8],
    params: &DecodeParams,
) -> Result<DynamicImage, DecodeError> {
    match filter {
        Some(FilterKind::CcittFax) => decode_ccitt(bytes, params),
        Some(FilterKind::Dct) => decode_container(bytes, image::ImageFormat::Jpeg),
        Some(FilterKind::Jpx) => decode_jpx(bytes),
        Some(FilterKind::Flate) => decode_flate(bytes, params),
        Some(FilterKind::Jbig2) => Err(DecodeError::UnsupportedFilter(
            FilterKind::Jbig2.to_string(),
        )),
        Some(FilterKind::Other(name)) => Err(DecodeError::UnsupportedFilter(name.clone())),
        None => decode_samples(bytes, params),
    }
}

fn decode_ccitt(bytes: &[u8], params: &DecodeParams) -> Result<DynamicImage, DecodeError> {
    let (Some(width), Some(height)) = (params.width, params.height) else {
        return Err(DecodeError::MalformedData(
            "CCITT image without Width/Height".into(),
        ));
    };
    let group = CcittGroup::from_k(params.ccitt.k);
    let container = tiff::wrap_ccitt(width, height, group, bytes)?;
    let gray = tiff::decode_ccitt_tiff(&container, &params.ccitt)?;
    Ok(DynamicImage::ImageLuma8(gray))
}

fn decode_container(bytes: &[u8], format: image::ImageFormat) -> Result<DynamicImage, DecodeError> {
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DecodeError::MalformedData(format!("{:?}: {}", format, e)))
}

fn decode_jpx(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let settings = hayro_jpeg2000::DecodeSettings::default();
    let decoder = hayro_jpeg2000::Image::new(bytes, &settings)
        .map_err(|e| DecodeError::MalformedData(format!("JPEG2000: {:?}", e)))?;
    DynamicImage::from_decoder(decoder)
        .map_err(|e| DecodeError::MalformedData(format!("JPEG2000: {}", e)))
}

/// A Flate image may already be a complete container; failing that, the
/// inflated stream is either a container or bare samples.
fn decode_flate(bytes: &[u8], params: &DecodeParams) -> Result<DynamicImage, DecodeError> {
    if let Some(image) = decode_sniffed(bytes) {
        return Ok(image);
    }

    let inflated = inflate(bytes)?;
    if let Some(image) = decode_sniffed(&inflated) {
        return Ok(image);
    }

    decode_samples(&inflated, params)
}

fn decode_sniffed(bytes: &[u8]) -> Option<DynamicImage> {
    let format = match detect_image_format(bytes) {
        ImageFormat::Unknown | ImageFormat::Jpeg2000 => return None,
        _ => image::guess_format(bytes).ok()?,
    };
    image::ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .ok()
}

fn decode_samples(bytes: &[u8], params: &DecodeParams) -> Result<DynamicImage, DecodeError> {
    let layout = params.layout.as_ref().ok_or_else(|| {
        DecodeError::MalformedData("bare samples without a usable color space".into())
    })?;
    samples_to_image(layout, bytes).ok_or_else(|| {
        DecodeError::MalformedData(format!(
            "expected {} sample bytes, found {}",
            layout.expected_byte_count(),
            bytes.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Bare sample conversion
// ---------------------------------------------------------------------------

/// Build an image from bare samples.
///
/// Trailing bytes beyond the expected count are ignored; short data fails.
pub fn samples_to_image(layout: &SampleLayout, raw_bytes: &[u8]) -> Option<DynamicImage> {
    let expected = layout.expected_byte_count();
    if expected == 0 || raw_bytes.len() < expected {
        return None;
    }
    let raw_bytes = &raw_bytes[..expected];

    let expanded = match layout.bits_per_component {
        8 => raw_bytes.to_vec(),
        1 | 2 | 4 => expand_sub_byte_pixels(raw_bytes, layout),
        16 => raw_bytes.chunks_exact(2).map(|pair| pair[0]).collect(),
        _ => return None,
    };

    let image = match layout.color_space {
        ColorSpace::Gray => {
            DynamicImage::ImageLuma8(image::GrayImage::from_raw(layout.width, layout.height, expanded)?)
        }
        ColorSpace::Rgb => {
            DynamicImage::ImageRgb8(image::RgbImage::from_raw(layout.width, layout.height, expanded)?)
        }
        ColorSpace::Cmyk => DynamicImage::ImageRgb8(image::RgbImage::from_raw(
            layout.width,
            layout.height,
            cmyk_to_rgb(&expanded),
        )?),
    };
    Some(image)
}

/// Expand sub-byte packed pixels (1-bit, 2-bit, 4-bit) to 8-bit per component.
fn expand_sub_byte_pixels(raw_bytes: &[u8], layout: &SampleLayout) -> Vec<u8> {
    let samples_per_row = layout.width as usize * layout.color_space.channels() as usize;
    let bytes_per_row = layout.bytes_per_row();
    let bpc = layout.bits_per_component;
    let max_val = (1u16 << bpc) - 1;

    let mut result = Vec::with_capacity(samples_per_row * layout.height as usize);

    for row_bytes in raw_bytes.chunks_exact(bytes_per_row) {
        let mut sample_count = 0;

        for &byte in row_bytes {
            let samples_in_byte = 8 / bpc as usize;
            for i in 0..samples_in_byte {
                if sample_count >= samples_per_row {
                    break;
                }
                let shift = 8 - bpc * (i as u8 + 1);
                let val = (byte >> shift) & (max_val as u8);
                let scaled = (val as u16 * 255 / max_val) as u8;
                result.push(scaled);
                sample_count += 1;
            }
        }
    }

    result
}

/// Convert CMYK pixel bytes to RGB.
fn cmyk_to_rgb(cmyk_bytes: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk_bytes.len() / 4 * 3);
    for pixel in cmyk_bytes.chunks_exact(4) {
        let (c, m, y, k) = (
            pixel[0] as u16,
            pixel[1] as u16,
            pixel[2] as u16,
            pixel[3] as u16,
        );
        let r = 255u16.saturating_sub((c + k).min(255)) as u8;
        let g = 255u16.saturating_sub((m + k).min(255)) as u8;
        let b = 255u16.saturating_sub((y + k).min(255)) as u8;
        rgb.extend_from_slice(&[r, g, b]);
    }
    rgb
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
