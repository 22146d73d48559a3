use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A PDF stream filter, as named by the `/Filter` entry of an image XObject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    Flate,
    CcittFax,
    Dct,
    Jpx,
    Jbig2,
    Other(String),
}

impl FilterKind {
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"FlateDecode" | b"Fl" => FilterKind::Flate,
            b"CCITTFaxDecode" | b"CCF" => FilterKind::CcittFax,
            b"DCTDecode" | b"DCT" => FilterKind::Dct,
            b"JPXDecode" => FilterKind::Jpx,
            b"JBIG2Decode" => FilterKind::Jbig2,
            other => FilterKind::Other(String::from_utf8_lossy(other).into_owned()),
        }
    }

    /// File extension used for the raw audit dump of an object carrying this filter.
    pub fn dump_extension(&self) -> &'static str {
        match self {
            FilterKind::CcittFax => "tiff",
            FilterKind::Dct => "jpg",
            FilterKind::Jpx => "jp2",
            FilterKind::Flate => "png",
            FilterKind::Jbig2 => "jbig2",
            FilterKind::Other(_) => "",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Flate => write!(f, "FlateDecode"),
            FilterKind::CcittFax => write!(f, "CCITTFaxDecode"),
            FilterKind::Dct => write!(f, "DCTDecode"),
            FilterKind::Jpx => write!(f, "JPXDecode"),
            FilterKind::Jbig2 => write!(f, "JBIG2Decode"),
            FilterKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// CCITT fax encoding family, selected by the `/K` decode parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcittGroup {
    Group3,
    Group4,
}

impl CcittGroup {
    /// `K < 0` is pure two-dimensional coding (Group 4); `K >= 0` is Group 3.
    pub fn from_k(k: i64) -> Self {
        if k < 0 {
            CcittGroup::Group4
        } else {
            CcittGroup::Group3
        }
    }

    /// Value of the TIFF `Compression` tag for this group.
    pub fn tiff_compression(self) -> u16 {
        match self {
            CcittGroup::Group3 => 3,
            CcittGroup::Group4 => 4,
        }
    }

    pub fn from_tiff_compression(value: u16) -> Option<Self> {
        match value {
            3 => Some(CcittGroup::Group3),
            4 => Some(CcittGroup::Group4),
            _ => None,
        }
    }
}

/// Device color space of uncompressed image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorSpace {
    pub fn channels(self) -> u8 {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }
}

/// Geometry of raw image samples, needed when a stream holds bare pixels
/// rather than a self-describing container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLayout {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
}

impl SampleLayout {
    /// Expected raw byte count for this image's pixel data.
    /// Accounts for sub-byte pixel packing with per-row byte alignment.
    pub fn expected_byte_count(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }

    pub fn bytes_per_row(&self) -> usize {
        let bits_per_row = self.width as usize
            * self.color_space.channels() as usize
            * self.bits_per_component as usize;
        bits_per_row.div_ceil(8)
    }
}

/// `DecodeParms` of a `CCITTFaxDecode` filter, with the PDF defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcittParams {
    /// `< 0` Group 4, `0` Group 3 one-dimensional, `> 0` Group 3 mixed.
    pub k: i64,
    pub end_of_line: bool,
    pub encoded_byte_align: bool,
    pub end_of_block: bool,
    pub black_is_1: bool,
    /// The image's `Decode` array is `[1 0]`.
    pub decode_inverted: bool,
}

impl Default for CcittParams {
    fn default() -> Self {
        Self {
            k: 0,
            end_of_line: false,
            encoded_byte_align: false,
            end_of_block: true,
            black_is_1: false,
            decode_inverted: false,
        }
    }
}

impl CcittParams {
    /// Whether decoded black pixels end up painted white.
    pub fn inverted(&self) -> bool {
        self.black_is_1 != self.decode_inverted
    }
}

/// Filter-specific parameters gathered from an image XObject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ccitt: CcittParams,
    pub layout: Option<SampleLayout>,
}

/// One image XObject discovered on a page, before decoding.
#[derive(Debug, Clone)]
pub struct EncodedImageObject {
    pub page_index: usize,
    /// Resource name of the XObject without the leading slash, e.g. `Im12`.
    pub name: String,
    /// Number parsed from `name`; `None` when the name has no numeric suffix.
    pub object_id: Option<u32>,
    /// At most a leading Flate layer followed by the image filter.
    pub filters: Vec<FilterKind>,
    pub params: DecodeParams,
    pub raw_bytes: Vec<u8>,
}

/// The decoded pixels of one image object.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub page_index: usize,
    pub name: String,
    pub filter: Option<FilterKind>,
    pub image: DynamicImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// An image object that was found but left out of the composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedImage {
    pub page_index: usize,
    pub name: String,
    pub reason: String,
}

/// Axis along which page images are stacked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Jpeg2000,
    Gif,
    Tiff,
    Bmp,
    WebP,
    Unknown,
}

impl ImageFormat {
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ImageFormat::Jpeg => Some("jpg"),
            ImageFormat::Png => Some("png"),
            ImageFormat::Jpeg2000 => Some("jp2"),
            ImageFormat::Gif => Some("gif"),
            ImageFormat::Tiff => Some("tiff"),
            ImageFormat::Bmp => Some("bmp"),
            ImageFormat::WebP => Some("webp"),
            ImageFormat::Unknown => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => write!(f, "jpeg"),
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Jpeg2000 => write!(f, "jpeg2000"),
            ImageFormat::Gif => write!(f, "gif"),
            ImageFormat::Tiff => write!(f, "tiff"),
            ImageFormat::Bmp => write!(f, "bmp"),
            ImageFormat::WebP => write!(f, "webp"),
            ImageFormat::Unknown => write!(f, "unknown"),
        }
    }
}
