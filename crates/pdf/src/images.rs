use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::backend::{LopdfBackend, PageId};
use crate::decode::{self, DecodeError};
use crate::sparse::{KeyScheme, SparseList};
use crate::types::{
    CcittParams, ColorSpace, DecodeParams, DecodedImage, EncodedImageObject, FilterKind, SampleLayout,
    SkippedImage,
};
use crate::PdfError;

/// Guards the walk up the page tree against `Parent` cycles.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Knobs for one extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub keys: KeyScheme,
    /// Directory receiving one raw dump per classified image object.
    /// Use a directory per document when documents are processed in parallel.
    pub audit_dir: Option<PathBuf>,
}

/// Everything the walker recovered from one document.
#[derive(Debug, Clone, Default)]
pub struct ExtractedImages {
    /// Decoded images keyed by `page * stride + object id`.
    pub ordered: SparseList<DecodedImage>,
    /// Decoded images whose name could not be mapped to a key.
    pub overflow: Vec<DecodedImage>,
    /// Image objects that produced no pixels.
    pub skipped: Vec<SkippedImage>,
}

impl ExtractedImages {
    /// Number of decoded images, ordered and overflow together.
    pub fn defined(&self) -> usize {
        self.ordered.defined() + self.overflow.len()
    }

    /// `true` when nothing decodable was found; the caller's cue to fall back
    /// to whole-page rasterization.
    pub fn is_empty(&self) -> bool {
        self.defined() == 0
    }

    /// Composition order: the defined ordered slots by key, then overflow.
    ///
    /// Gaps are skipped rather than materialized, so sparse keys cost nothing.
    pub fn images(&self) -> impl Iterator<Item = &DynamicImage> + '_ {
        self.ordered
            .values()
            .chain(self.overflow.iter())
            .map(|decoded| &decoded.image)
    }

    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary {
            defined: self.ordered.defined(),
            slots: self.ordered.len(),
            overflow: self.overflow.len(),
            skipped: self.skipped.clone(),
        }
    }
}

/// Serializable digest of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub defined: usize,
    pub slots: usize,
    pub overflow: usize,
    pub skipped: Vec<SkippedImage>,
}

/// Walk every page of the document and decode its image XObjects.
///
/// Only a broken page tree fails the walk. Objects that cannot be decoded are
/// recorded in [`ExtractedImages::skipped`] and leave their slot absent.
pub fn extract_images(
    backend: &LopdfBackend,
    options: &ExtractOptions,
) -> Result<ExtractedImages, PdfError> {
    let audit_dir = options
        .audit_dir
        .as_deref()
        .and_then(|dir| match fs::create_dir_all(dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                log::warn!("Audit dumps disabled, cannot create {}: {}", dir.display(), e);
                None
            }
        });

    let mut extracted = ExtractedImages::default();

    for (page_index, &page_id) in backend.pages().values().enumerate() {
        for object in list_image_objects(backend, page_index, page_id)? {
            place(&mut extracted, object, &options.keys, audit_dir);
        }
    }

    log::info!(
        "Extracted {} image(s) ({} overflow), skipped {}",
        extracted.defined(),
        extracted.overflow.len(),
        extracted.skipped.len()
    );

    Ok(extracted)
}

/// Decode one object and file the result under its ordering key.
fn place(
    extracted: &mut ExtractedImages,
    object: EncodedImageObject,
    keys: &KeyScheme,
    audit_dir: Option<&Path>,
) {
    let page_index = object.page_index;
    let name = object.name.clone();

    let decoded = match decode_object(&object, audit_dir) {
        Ok(decoded) => decoded,
        Err(e) => {
            log::warn!("Skipping image {} on page {}: {}", name, page_index, e);
            extracted.skipped.push(SkippedImage {
                page_index,
                name,
                reason: e.to_string(),
            });
            return;
        }
    };

    let key = object
        .object_id
        .and_then(|id| keys.index(page_index, id))
        .filter(|key| extracted.ordered.get(*key).is_none());

    match key {
        Some(key) => {
            extracted.ordered.set(key, decoded);
        }
        None => {
            log::warn!(
                "Image {} on page {} has no usable ordering key, appending unordered",
                name,
                page_index
            );
            extracted.overflow.push(decoded);
        }
    }
}

/// Unwrap, audit, then decode a single object.
pub fn decode_object(
    object: &EncodedImageObject,
    audit_dir: Option<&Path>,
) -> Result<DecodedImage, DecodeError> {
    let unwrapped = decode::unwrap_filters(&object.filters, &object.raw_bytes)?;

    if let Some(dir) = audit_dir {
        let ext = unwrapped
            .filter
            .as_ref()
            .map(FilterKind::dump_extension)
            .unwrap_or("");
        let path = dir.join(audit_file_name(object.page_index, &object.name, ext));
        if let Err(e) = fs::write(&path, &unwrapped.bytes) {
            log::warn!("Cannot write audit dump {}: {}", path.display(), e);
        }
    }

    log::debug!(
        "Decoding image {} on page {} ({:?})",
        object.name,
        object.page_index,
        unwrapped.filter
    );

    let image = decode::decode(unwrapped.filter.as_ref(), &unwrapped.bytes, &object.params)?;

    Ok(DecodedImage {
        page_index: object.page_index,
        name: object.name.clone(),
        filter: unwrapped.filter,
        image,
    })
}

/// `{page_index}_{name}.{ext}`, without the dot when the extension is unknown.
pub fn audit_file_name(page_index: usize, name: &str, ext: &str) -> String {
    if ext.is_empty() {
        format!("{}_{}", page_index, name)
    } else {
        format!("{}_{}.{}", page_index, name, ext)
    }
}

/// Number carried by an XObject name such as `Im12` or `img3`.
///
/// The alphabetic prefix is dropped and the rest must be all digits.
pub fn parse_object_id(name: &str) -> Option<u32> {
    let digits = name.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// List all image XObjects on a given page, undecoded.
pub fn list_image_objects(
    backend: &LopdfBackend,
    page_index: usize,
    page_id: PageId,
) -> Result<Vec<EncodedImageObject>, PdfError> {
    let doc = backend.raw_doc();
    let mut objects = Vec::new();

    let page_obj = doc
        .get_object(page_id)
        .map_err(|e| PdfError::Parse(format!("cannot get page object: {}", e)))?;

    let page_dict = page_obj
        .as_dict()
        .map_err(|e| PdfError::Parse(format!("page object is not a dictionary: {}", e)))?;

    let xobject_dict = match resolve_xobject_dict(doc, page_dict) {
        Some(d) => d,
        None => return Ok(objects),
    };

    for (name, obj) in xobject_dict.iter() {
        let resolved = resolve_object(doc, obj);
        let Some(stream) = as_stream(resolved) else {
            continue;
        };

        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Image");

        if !is_image {
            continue;
        }

        let name = String::from_utf8_lossy(name).into_owned();
        let filters = extract_filter_chain(doc, &stream.dict);
        let params = extract_decode_params(doc, &stream.dict, filters.len());

        objects.push(EncodedImageObject {
            page_index,
            object_id: parse_object_id(&name),
            name,
            filters,
            params,
            raw_bytes: stream.content.clone(),
        });
    }

    Ok(objects)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Resolve a `lopdf::Object` that might be a `Reference` to the actual object.
fn resolve_object<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Resolve an object to a `Dictionary`, following one level of reference
/// indirection if needed.
fn resolve_dict<'a>(
    doc: &'a lopdf::Document,
    obj: &'a lopdf::Object,
) -> Option<&'a lopdf::Dictionary> {
    match resolve_object(doc, obj) {
        lopdf::Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

/// Find the page's Resources, inheriting from ancestors in the page tree.
fn resolve_resources<'a>(
    doc: &'a lopdf::Document,
    page_dict: &'a lopdf::Dictionary,
) -> Option<&'a lopdf::Dictionary> {
    let mut dict = page_dict;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Some(resources) = dict.get(b"Resources").ok().and_then(|o| resolve_dict(doc, o)) {
            return Some(resources);
        }
        dict = dict.get(b"Parent").ok().and_then(|o| resolve_dict(doc, o))?;
    }
    None
}

/// Resolve the XObject dictionary from a page dictionary, following references
/// through Resources -> XObject.
fn resolve_xobject_dict<'a>(
    doc: &'a lopdf::Document,
    page_dict: &'a lopdf::Dictionary,
) -> Option<&'a lopdf::Dictionary> {
    let resources_dict = resolve_resources(doc, page_dict)?;
    let xobject_obj = resources_dict.get(b"XObject").ok()?;
    resolve_dict(doc, xobject_obj)
}

/// Extract the stream from an object, if it is a `Stream`.
fn as_stream(obj: &lopdf::Object) -> Option<&lopdf::Stream> {
    match obj {
        lopdf::Object::Stream(s) => Some(s),
        _ => None,
    }
}

/// Read the `Filter` entry, a single `Name` or an `Array` of names.
fn extract_filter_chain(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Vec<FilterKind> {
    let Ok(filter_obj) = dict.get(b"Filter") else {
        return Vec::new();
    };
    match resolve_object(doc, filter_obj) {
        lopdf::Object::Name(name) => vec![FilterKind::from_name(name)],
        lopdf::Object::Array(arr) => arr
            .iter()
            .filter_map(|o| match resolve_object(doc, o) {
                lopdf::Object::Name(name) => Some(FilterKind::from_name(name)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Pick the `DecodeParms` dictionary belonging to the innermost filter.
///
/// With a filter array, `DecodeParms` is a parallel array; fall back to the
/// first dictionary in it.
fn select_decode_parms<'a>(
    doc: &'a lopdf::Document,
    dict: &'a lopdf::Dictionary,
    filter_count: usize,
) -> Option<&'a lopdf::Dictionary> {
    let obj = dict.get(b"DecodeParms").ok()?;
    match resolve_object(doc, obj) {
        lopdf::Object::Dictionary(d) => Some(d),
        lopdf::Object::Array(arr) => filter_count
            .checked_sub(1)
            .and_then(|last| arr.get(last))
            .and_then(|o| resolve_dict(doc, o))
            .or_else(|| arr.iter().find_map(|o| resolve_dict(doc, o))),
        _ => None,
    }
}

fn positive_u32(obj: &lopdf::Object) -> Option<u32> {
    obj.as_i64()
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
}

fn extract_decode_params(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
    filter_count: usize,
) -> DecodeParams {
    let width = dict.get(b"Width").ok().and_then(positive_u32);
    let height = dict.get(b"Height").ok().and_then(positive_u32);

    let mut ccitt = match select_decode_parms(doc, dict, filter_count) {
        Some(parms) => ccitt_params(doc, parms),
        None => CcittParams::default(),
    };
    ccitt.decode_inverted = decode_array_inverted(doc, dict);

    DecodeParams {
        width,
        height,
        ccitt,
        layout: extract_sample_layout(doc, dict, width, height),
    }
}

fn ccitt_params(doc: &lopdf::Document, parms: &lopdf::Dictionary) -> CcittParams {
    let defaults = CcittParams::default();
    let flag = |key: &[u8], default: bool| {
        parms
            .get(key)
            .ok()
            .and_then(|o| resolve_object(doc, o).as_bool().ok())
            .unwrap_or(default)
    };

    CcittParams {
        k: parms
            .get(b"K")
            .ok()
            .and_then(|o| resolve_object(doc, o).as_i64().ok())
            .unwrap_or(defaults.k),
        end_of_line: flag(b"EndOfLine", defaults.end_of_line),
        encoded_byte_align: flag(b"EncodedByteAlign", defaults.encoded_byte_align),
        end_of_block: flag(b"EndOfBlock", defaults.end_of_block),
        black_is_1: flag(b"BlackIs1", defaults.black_is_1),
        decode_inverted: defaults.decode_inverted,
    }
}

/// `Decode [1 0]` on a one-component image swaps black and white.
fn decode_array_inverted(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> bool {
    let Some(lopdf::Object::Array(arr)) = dict.get(b"Decode").ok().map(|o| resolve_object(doc, o))
    else {
        return false;
    };
    let number = |o: &lopdf::Object| match o {
        lopdf::Object::Integer(i) => Some(*i as f64),
        lopdf::Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    };
    matches!(
        (arr.first().and_then(number), arr.get(1).and_then(number)),
        (Some(lo), Some(hi)) if lo == 1.0 && hi == 0.0
    )
}

/// Geometry of bare samples, when the color space is one we can paint.
fn extract_sample_layout(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<SampleLayout> {
    let (width, height) = (width?, height?);

    let is_mask = dict
        .get(b"ImageMask")
        .ok()
        .and_then(|o| o.as_bool().ok())
        .unwrap_or(false);
    if is_mask {
        return Some(SampleLayout {
            width,
            height,
            bits_per_component: 1,
            color_space: ColorSpace::Gray,
        });
    }

    let bits_per_component = match dict.get(b"BitsPerComponent") {
        Ok(obj) => obj
            .as_i64()
            .ok()
            .and_then(|v| u8::try_from(v).ok())
            .filter(|bpc| matches!(bpc, 1 | 2 | 4 | 8 | 16))?,
        Err(_) => 8,
    };

    let color_space = resolve_color_space(doc, dict.get(b"ColorSpace").ok()?)?;

    Some(SampleLayout {
        width,
        height,
        bits_per_component,
        color_space,
    })
}

fn resolve_color_space(doc: &lopdf::Document, obj: &lopdf::Object) -> Option<ColorSpace> {
    match resolve_object(doc, obj) {
        lopdf::Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Some(ColorSpace::Rgb),
            b"DeviceGray" | b"CalGray" => Some(ColorSpace::Gray),
            b"DeviceCMYK" => Some(ColorSpace::Cmyk),
            _ => None,
        },
        // [/ICCBased stream]: the profile's component count decides.
        lopdf::Object::Array(arr) => {
            let family = arr.first()?.as_name().ok()?;
            if family != b"ICCBased" {
                return None;
            }
            let profile = as_stream(resolve_object(doc, arr.get(1)?))?;
            match profile.dict.get(b"N").ok()?.as_i64().ok()? {
                1 => Some(ColorSpace::Gray),
                3 => Some(ColorSpace::Rgb),
                4 => Some(ColorSpace::Cmyk),
                _ => None,
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use std::io::{Cursor, Write};

    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use lopdf::{dictionary, Dictionary, Document, Object, Stream};

    use super::*;

    fn name(n: &str) -> Object {
        Object::Name(n.as_bytes().to_vec())
    }

    pub(crate) fn jpeg_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    fn deflate(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn image_stream(filter: Object, width: i64, height: i64, content: Vec<u8>) -> Stream {
        let dict = dictionary! {
            "Type" => name("XObject"),
            "Subtype" => name("Image"),
            "Width" => Object::Integer(width),
            "Height" => Object::Integer(height),
            "BitsPerComponent" => Object::Integer(8),
            "ColorSpace" => name("DeviceRGB"),
            "Filter" => filter,
        };
        Stream::new(dict, content)
    }

    pub(crate) fn dct_stream(width: u32, height: u32, shade: u8) -> Stream {
        image_stream(
            name("DCTDecode"),
            width as i64,
            height as i64,
            jpeg_bytes(width, height, shade),
        )
    }

    fn ccitt_stream(width: i64, height: i64, wrapped: bool) -> Stream {
        // Two all-white Group 4 rows followed by EOFB.
        let payload = vec![0xC0, 0x04, 0x00, 0x40];
        let parms = dictionary! {
            "K" => Object::Integer(-1),
            "Columns" => Object::Integer(width),
            "Rows" => Object::Integer(height),
        };
        let (filter, content, decode_parms) = if wrapped {
            (
                Object::Array(vec![name("FlateDecode"), name("CCITTFaxDecode")]),
                deflate(&payload),
                Object::Array(vec![Object::Null, Object::Dictionary(parms)]),
            )
        } else {
            (name("CCITTFaxDecode"), payload, Object::Dictionary(parms))
        };
        let mut stream = image_stream(filter, width, height, content);
        stream.dict.set("DecodeParms", decode_parms);
        stream.dict.set("BitsPerComponent", Object::Integer(1));
        stream.dict.set("ColorSpace", name("DeviceGray"));
        stream
    }

    /// Build a PDF whose pages carry the given named image streams.
    pub(crate) fn build_pdf(pages: Vec<Vec<(&str, Stream)>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();

        for images in pages {
            let mut xobjects = Dictionary::new();
            for (image_name, stream) in images {
                let id = doc.add_object(stream);
                xobjects.set(image_name, Object::Reference(id));
            }
            let contents_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => name("Page"),
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
                "Resources" => dictionary! { "XObject" => Object::Dictionary(xobjects) },
                "Contents" => Object::Reference(contents_id),
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => name("Pages"),
                "Kids" => Object::Array(kids),
                "Count" => Object::Integer(count),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => name("Catalog"),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn extract(bytes: &[u8], options: &ExtractOptions) -> ExtractedImages {
        let backend = LopdfBackend::load_bytes(bytes).unwrap();
        extract_images(&backend, options).unwrap()
    }

    // -- parse_object_id ----------------------------------------------------

    #[test]
    fn object_id_from_common_names() {
        assert_eq!(parse_object_id("Im12"), Some(12));
        assert_eq!(parse_object_id("img3"), Some(3));
        assert_eq!(parse_object_id("X0"), Some(0));
    }

    #[test]
    fn object_id_unparseable() {
        assert_eq!(parse_object_id("Logo"), None);
        assert_eq!(parse_object_id("Im1a"), None);
        assert_eq!(parse_object_id("Im_1"), None);
        assert_eq!(parse_object_id(""), None);
    }

    #[test]
    fn audit_names() {
        assert_eq!(audit_file_name(0, "Im3", "tiff"), "0_Im3.tiff");
        assert_eq!(audit_file_name(2, "X", ""), "2_X");
    }

    // -- extract_images -----------------------------------------------------

    #[test]
    fn images_ordered_by_page_then_object() {
        let bytes = build_pdf(vec![
            vec![("Im2", dct_stream(4, 2, 10)), ("Im1", dct_stream(4, 3, 20))],
            vec![("Im0", dct_stream(4, 5, 30))],
        ]);
        let extracted = extract(&bytes, &ExtractOptions::default());

        assert_eq!(extracted.defined(), 3);
        let keys: Vec<usize> = extracted.ordered.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 1000]);
        let heights: Vec<u32> = extracted.ordered.values().map(|d| d.height()).collect();
        assert_eq!(heights, vec![3, 2, 5]);
        assert!(extracted.ordered.get(0).is_none());
    }

    #[test]
    fn jbig2_only_document_yields_zero_images() {
        let dir = tempfile::TempDir::new().unwrap();
        let stream = image_stream(name("JBIG2Decode"), 8, 8, vec![0u8; 32]);
        let bytes = build_pdf(vec![vec![("Im1", stream)]]);
        let options = ExtractOptions {
            audit_dir: Some(dir.path().to_path_buf()),
            ..ExtractOptions::default()
        };

        let extracted = extract(&bytes, &options);

        assert!(extracted.is_empty());
        assert_eq!(extracted.skipped.len(), 1);
        assert!(dir.path().join("0_Im1.jbig2").exists());
    }

    #[test]
    fn unparseable_names_go_to_overflow() {
        let bytes = build_pdf(vec![vec![
            ("Logo", dct_stream(2, 2, 0)),
            ("Im1", dct_stream(2, 2, 0)),
        ]]);
        let extracted = extract(&bytes, &ExtractOptions::default());

        assert_eq!(extracted.ordered.defined(), 1);
        assert_eq!(extracted.overflow.len(), 1);
        assert_eq!(extracted.overflow[0].name, "Logo");
        assert_eq!(extracted.images().count(), 2);
    }

    #[test]
    fn object_ids_beyond_stride_go_to_overflow() {
        let bytes = build_pdf(vec![vec![("Im1500", dct_stream(2, 2, 0))]]);
        let extracted = extract(&bytes, &ExtractOptions::default());
        assert_eq!(extracted.overflow.len(), 1);

        let wide = ExtractOptions {
            keys: KeyScheme::new(10_000),
            ..ExtractOptions::default()
        };
        let extracted = extract(&bytes, &wide);
        assert!(extracted.ordered.get(1500).is_some());
    }

    #[test]
    fn colliding_ids_keep_both_images() {
        let bytes = build_pdf(vec![vec![
            ("Im1", dct_stream(2, 2, 0)),
            ("Im01", dct_stream(2, 2, 0)),
        ]]);
        let extracted = extract(&bytes, &ExtractOptions::default());
        assert_eq!(extracted.defined(), 2);
        assert_eq!(extracted.overflow.len(), 1);
    }

    #[test]
    fn corrupt_image_is_skipped_not_fatal() {
        let broken = image_stream(name("FlateDecode"), 4, 4, b"not deflate".to_vec());
        let bytes = build_pdf(vec![vec![("Im1", broken), ("Im2", dct_stream(4, 4, 0))]]);
        let extracted = extract(&bytes, &ExtractOptions::default());

        assert_eq!(extracted.defined(), 1);
        assert_eq!(extracted.skipped.len(), 1);
        assert_eq!(extracted.skipped[0].name, "Im1");
        assert!(extracted.ordered.get(1).is_none());
        assert!(extracted.ordered.get(2).is_some());
    }

    #[test]
    fn flate_wrapped_ccitt_is_unwrapped_and_dumped() {
        let dir = tempfile::TempDir::new().unwrap();
        let bytes = build_pdf(vec![vec![("Im3", ccitt_stream(8, 2, true))]]);
        let options = ExtractOptions {
            audit_dir: Some(dir.path().to_path_buf()),
            ..ExtractOptions::default()
        };

        let extracted = extract(&bytes, &options);

        let decoded = extracted.ordered.get(3).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 2));
        assert_eq!(decoded.filter, Some(FilterKind::CcittFax));
        let dump = fs::read(dir.path().join("0_Im3.tiff")).unwrap();
        assert_eq!(dump, vec![0xC0, 0x04, 0x00, 0x40]);
    }

    #[test]
    fn bare_ccitt_decodes() {
        let bytes = build_pdf(vec![vec![("Im0", ccitt_stream(8, 2, false))]]);
        let extracted = extract(&bytes, &ExtractOptions::default());
        assert!(extracted.ordered.get(0).is_some());
    }

    #[test]
    fn non_image_xobjects_are_ignored() {
        let form = Stream::new(
            dictionary! { "Type" => name("XObject"), "Subtype" => name("Form") },
            b"q Q".to_vec(),
        );
        let bytes = build_pdf(vec![vec![("Fm1", form)]]);
        let backend = LopdfBackend::load_bytes(&bytes).unwrap();
        let page_id = *backend.pages().values().next().unwrap();
        assert!(list_image_objects(&backend, 0, page_id).unwrap().is_empty());
    }

    #[test]
    fn listing_reads_filters_and_params() {
        let bytes = build_pdf(vec![vec![("Im7", ccitt_stream(8, 2, true))]]);
        let backend = LopdfBackend::load_bytes(&bytes).unwrap();
        let page_id = *backend.pages().values().next().unwrap();
        let objects = list_image_objects(&backend, 0, page_id).unwrap();

        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.object_id, Some(7));
        assert_eq!(object.filters, vec![FilterKind::Flate, FilterKind::CcittFax]);
        assert_eq!(object.params.ccitt.k, -1);
        assert_eq!(object.params.width, Some(8));
        assert_eq!(object.params.height, Some(2));
    }

    #[test]
    fn listing_reads_ccitt_flags_and_decode_array() {
        let mut stream = ccitt_stream(8, 2, false);
        stream.dict.set(
            "DecodeParms",
            dictionary! {
                "K" => Object::Integer(2),
                "Columns" => Object::Integer(8),
                "EndOfLine" => Object::Boolean(true),
                "EncodedByteAlign" => Object::Boolean(true),
                "EndOfBlock" => Object::Boolean(false),
                "BlackIs1" => Object::Boolean(true),
            },
        );
        stream.dict.set(
            "Decode",
            Object::Array(vec![Object::Real(1.0), Object::Integer(0)]),
        );
        let bytes = build_pdf(vec![vec![("Im1", stream)]]);
        let backend = LopdfBackend::load_bytes(&bytes).unwrap();
        let page_id = *backend.pages().values().next().unwrap();
        let objects = list_image_objects(&backend, 0, page_id).unwrap();

        assert_eq!(
            objects[0].params.ccitt,
            CcittParams {
                k: 2,
                end_of_line: true,
                encoded_byte_align: true,
                end_of_block: false,
                black_is_1: true,
                decode_inverted: true,
            }
        );
    }

    #[test]
    fn ccitt_defaults_without_decode_parms() {
        let mut stream = ccitt_stream(8, 2, false);
        stream.dict.remove(b"DecodeParms");
        let bytes = build_pdf(vec![vec![("Im1", stream)]]);
        let backend = LopdfBackend::load_bytes(&bytes).unwrap();
        let page_id = *backend.pages().values().next().unwrap();
        let objects = list_image_objects(&backend, 0, page_id).unwrap();

        assert_eq!(objects[0].params.ccitt, CcittParams::default());
    }

    #[test]
    fn unsupported_bits_per_component_has_no_layout() {
        // 264 would truncate to 8 if narrowed blindly.
        for bpc in [3, 264, -8] {
            let mut stream = image_stream(name("FlateDecode"), 2, 2, deflate(&[0u8; 12]));
            stream.dict.set("BitsPerComponent", Object::Integer(bpc));
            let bytes = build_pdf(vec![vec![("Im1", stream)]]);

            let backend = LopdfBackend::load_bytes(&bytes).unwrap();
            let page_id = *backend.pages().values().next().unwrap();
            let objects = list_image_objects(&backend, 0, page_id).unwrap();
            assert_eq!(objects[0].params.layout, None, "bpc {}", bpc);

            let extracted = extract(&bytes, &ExtractOptions::default());
            assert!(extracted.is_empty(), "bpc {}", bpc);
            assert_eq!(extracted.skipped.len(), 1);
        }
    }

    #[test]
    fn sixteen_bit_samples_keep_their_layout() {
        let mut stream = image_stream(name("FlateDecode"), 2, 2, deflate(&[0u8; 24]));
        stream.dict.set("BitsPerComponent", Object::Integer(16));
        let bytes = build_pdf(vec![vec![("Im1", stream)]]);
        let backend = LopdfBackend::load_bytes(&bytes).unwrap();
        let page_id = *backend.pages().values().next().unwrap();
        let objects = list_image_objects(&backend, 0, page_id).unwrap();

        assert_eq!(
            objects[0].params.layout.as_ref().map(|l| l.bits_per_component),
            Some(16)
        );
    }

    #[test]
    fn resources_inherited_from_page_tree() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(dct_stream(3, 3, 0));
        let page_id = doc.add_object(dictionary! {
            "Type" => name("Page"),
            "Parent" => Object::Reference(pages_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => name("Pages"),
                "Kids" => Object::Array(vec![Object::Reference(page_id)]),
                "Count" => Object::Integer(1),
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im5" => Object::Reference(image_id) },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => name("Catalog"),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let extracted = extract(&bytes, &ExtractOptions::default());
        assert!(extracted.ordered.get(5).is_some());
    }

    #[test]
    fn pages_without_resources_are_empty() {
        let bytes = build_pdf(vec![vec![]]);
        let extracted = extract(&bytes, &ExtractOptions::default());
        assert!(extracted.is_empty());
        assert!(extracted.skipped.is_empty());
    }

    #[test]
    fn summary_counts() {
        let broken = image_stream(name("JBIG2Decode"), 4, 4, vec![0u8; 4]);
        let bytes = build_pdf(vec![vec![("Im1", broken), ("Im4", dct_stream(2, 2, 0))]]);
        let summary = extract(&bytes, &ExtractOptions::default()).summary();
        assert_eq!(summary.defined, 1);
        assert_eq!(summary.slots, 5);
        assert_eq!(summary.overflow, 0);
        assert_eq!(summary.skipped.len(), 1);
    }
}
