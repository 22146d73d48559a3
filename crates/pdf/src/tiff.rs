//! Minimal TIFF container for raw CCITT fax streams.
//!
//! PDF stores CCITT data as a bare bitstream. Wrapping it in a one-strip,
//! one-bit TIFF gives it the geometry a container decoder needs, and gives the
//! audit trail a file that standard viewers can open. Decoding reads the strip
//! back out and runs it through `hayro_ccitt`.

use image::GrayImage;

use crate::decode::DecodeError;
use crate::types::{CcittGroup, CcittParams};

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;

const TAG_COUNT: u16 = 8;
const IFD_ENTRY_LEN: usize = 12;

/// Byte order mark, version, IFD offset, tag count, eight entries and a
/// two-byte terminator.
pub const CCITT_TIFF_HEADER_LEN: usize = 2 + 2 + 4 + 2 + TAG_COUNT as usize * IFD_ENTRY_LEN + 2;

const PHOTOMETRIC_WHITE_IS_ZERO: u16 = 0;

/// Largest bilevel page we are willing to expand to one byte per pixel.
const MAX_CCITT_PIXELS: u64 = 1 << 30;

/// Build the little-endian TIFF header for a single-strip CCITT image whose
/// payload of `payload_size` bytes follows the header directly.
pub fn build_ccitt_tiff_header(
    width: u32,
    height: u32,
    payload_size: u32,
    group: CcittGroup,
) -> [u8; CCITT_TIFF_HEADER_LEN] {
    let entries: [(u16, u16, u32); TAG_COUNT as usize] = [
        (TAG_IMAGE_WIDTH, TYPE_LONG, width),
        (TAG_IMAGE_LENGTH, TYPE_LONG, height),
        (TAG_BITS_PER_SAMPLE, TYPE_SHORT, 1),
        (TAG_COMPRESSION, TYPE_SHORT, group.tiff_compression() as u32),
        (TAG_PHOTOMETRIC, TYPE_SHORT, PHOTOMETRIC_WHITE_IS_ZERO as u32),
        (TAG_STRIP_OFFSETS, TYPE_LONG, CCITT_TIFF_HEADER_LEN as u32),
        (TAG_ROWS_PER_STRIP, TYPE_LONG, height),
        (TAG_STRIP_BYTE_COUNTS, TYPE_LONG, payload_size),
    ];

    let mut header = [0u8; CCITT_TIFF_HEADER_LEN];
    header[0..2].copy_from_slice(b"II");
    header[2..4].copy_from_slice(&42u16.to_le_bytes());
    header[4..8].copy_from_slice(&8u32.to_le_bytes());
    header[8..10].copy_from_slice(&TAG_COUNT.to_le_bytes());

    for (i, (tag, field_type, value)) in entries.iter().enumerate() {
        let at = 10 + i * IFD_ENTRY_LEN;
        header[at..at + 2].copy_from_slice(&tag.to_le_bytes());
        header[at + 2..at + 4].copy_from_slice(&field_type.to_le_bytes());
        header[at + 4..at + 8].copy_from_slice(&1u32.to_le_bytes());
        header[at + 8..at + 12].copy_from_slice(&value.to_le_bytes());
    }

    // Trailing next-IFD offset is left zero.
    header
}

/// Prepend a synthesized header to a raw CCITT payload.
pub fn wrap_ccitt(
    width: u32,
    height: u32,
    group: CcittGroup,
    payload: &[u8],
) -> Result<Vec<u8>, DecodeError> {
    let payload_size = u32::try_from(payload.len())
        .map_err(|_| DecodeError::MalformedData("CCITT payload exceeds 4 GiB".into()))?;
    let header = build_ccitt_tiff_header(width, height, payload_size, group);
    let mut container = Vec::with_capacity(header.len() + payload.len());
    container.extend_from_slice(&header);
    container.extend_from_slice(payload);
    Ok(container)
}

/// Fields of a single-strip bilevel TIFF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffFields {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub compression: u16,
    pub photometric: u16,
    pub strip_offset: u32,
    pub rows_per_strip: u32,
    pub strip_byte_count: u32,
}

/// Read back the first IFD of a little-endian TIFF.
pub fn read_tiff_fields(bytes: &[u8]) -> Result<TiffFields, DecodeError> {
    let malformed = |msg: &str| DecodeError::MalformedData(format!("TIFF: {}", msg));

    if bytes.get(0..2) != Some(b"II".as_slice()) {
        return Err(malformed("not a little-endian TIFF"));
    }
    if read_u16(bytes, 2) != Some(42) {
        return Err(malformed("bad version"));
    }
    let ifd = read_u32(bytes, 4).ok_or_else(|| malformed("truncated header"))? as usize;
    let count = read_u16(bytes, ifd).ok_or_else(|| malformed("truncated IFD"))? as usize;

    let mut width = None;
    let mut height = None;
    let mut bits_per_sample = 1;
    let mut compression = 1;
    let mut photometric = PHOTOMETRIC_WHITE_IS_ZERO;
    let mut strip_offset = None;
    let mut rows_per_strip = None;
    let mut strip_byte_count = None;

    for i in 0..count {
        let at = ifd + 2 + i * IFD_ENTRY_LEN;
        let tag = read_u16(bytes, at).ok_or_else(|| malformed("truncated IFD entry"))?;
        let field_type = read_u16(bytes, at + 2).ok_or_else(|| malformed("truncated IFD entry"))?;
        let value = match field_type {
            TYPE_SHORT => read_u16(bytes, at + 8).map(u32::from),
            TYPE_LONG => read_u32(bytes, at + 8),
            _ => continue,
        }
        .ok_or_else(|| malformed("truncated IFD entry"))?;

        match tag {
            TAG_IMAGE_WIDTH => width = Some(value),
            TAG_IMAGE_LENGTH => height = Some(value),
            TAG_BITS_PER_SAMPLE => bits_per_sample = value as u16,
            TAG_COMPRESSION => compression = value as u16,
            TAG_PHOTOMETRIC => photometric = value as u16,
            TAG_STRIP_OFFSETS => strip_offset = Some(value),
            TAG_ROWS_PER_STRIP => rows_per_strip = Some(value),
            TAG_STRIP_BYTE_COUNTS => strip_byte_count = Some(value),
            _ => {}
        }
    }

    let height = height.ok_or_else(|| malformed("missing ImageLength"))?;
    Ok(TiffFields {
        width: width.ok_or_else(|| malformed("missing ImageWidth"))?,
        height,
        bits_per_sample,
        compression,
        photometric,
        strip_offset: strip_offset.ok_or_else(|| malformed("missing StripOffsets"))?,
        rows_per_strip: rows_per_strip.unwrap_or(height),
        strip_byte_count: strip_byte_count.ok_or_else(|| malformed("missing StripByteCounts"))?,
    })
}

/// Open a single-strip CCITT TIFF and decode it to 8-bit grayscale.
///
/// The header supplies geometry and the coding family; `params` supplies what
/// a TIFF header cannot carry (mixed 2-D coding, EOL and alignment flags,
/// polarity). A stream that ends early still yields the rows decoded so far.
pub fn decode_ccitt_tiff(container: &[u8], params: &CcittParams) -> Result<GrayImage, DecodeError> {
    let fields = read_tiff_fields(container)?;

    if fields.bits_per_sample != 1 {
        return Err(DecodeError::MalformedData(format!(
            "CCITT image with {} bits per sample",
            fields.bits_per_sample
        )));
    }
    let group = CcittGroup::from_tiff_compression(fields.compression).ok_or_else(|| {
        DecodeError::MalformedData(format!("TIFF compression {} is not CCITT", fields.compression))
    })?;
    if u64::from(fields.width) * u64::from(fields.height) > MAX_CCITT_PIXELS {
        return Err(DecodeError::MalformedData(format!(
            "CCITT image of {}x{} is too large",
            fields.width, fields.height
        )));
    }

    let start = fields.strip_offset as usize;
    let end = start.saturating_add(fields.strip_byte_count as usize);
    let payload = container
        .get(start..end)
        .ok_or_else(|| DecodeError::MalformedData("CCITT strip lies outside the container".into()))?;

    let settings = hayro_ccitt::DecodeSettings {
        columns: fields.width,
        rows: fields.height,
        end_of_block: params.end_of_block,
        end_of_line: params.end_of_line,
        rows_are_byte_aligned: params.encoded_byte_align,
        encoding: encoding_mode(group, params.k),
        invert_black: params.inverted(),
    };

    let mut sink = GraySink::new(fields.width, fields.height);
    let finished = hayro_ccitt::decode(payload, &mut sink, &settings).is_some();

    if sink.rows == 0 {
        return Err(DecodeError::MalformedData(format!(
            "{:?} bitstream could not be decoded",
            group
        )));
    }
    if !finished && sink.rows < fields.height {
        log::warn!(
            "CCITT stream ended after {} of {} rows",
            sink.rows,
            fields.height
        );
    }

    sink.into_image()
}

fn encoding_mode(group: CcittGroup, k: i64) -> hayro_ccitt::EncodingMode {
    match group {
        CcittGroup::Group4 => hayro_ccitt::EncodingMode::Group4,
        CcittGroup::Group3 if k > 0 => hayro_ccitt::EncodingMode::Group3_2D {
            k: u32::try_from(k).unwrap_or(u32::MAX),
        },
        CcittGroup::Group3 => hayro_ccitt::EncodingMode::Group3_1D,
    }
}

/// Collects packed decoder output (MSB first, `1` is white) as luma rows.
struct GraySink {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    x: u32,
    rows: u32,
}

impl GraySink {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Vec::new(),
            x: 0,
            rows: 0,
        }
    }

    fn into_image(mut self) -> Result<GrayImage, DecodeError> {
        self.pixels.truncate(self.width as usize * self.rows as usize);
        GrayImage::from_raw(self.width, self.rows, self.pixels)
            .ok_or_else(|| DecodeError::MalformedData("CCITT row buffer size mismatch".into()))
    }
}

impl hayro_ccitt::Decoder for GraySink {
    fn push_byte(&mut self, byte: u8) {
        for bit in 0..8 {
            if self.x >= self.width || self.rows >= self.height {
                return;
            }
            let white = (byte >> (7 - bit)) & 1 == 1;
            self.pixels.push(if white { 255 } else { 0 });
            self.x += 1;
        }
    }

    fn push_bytes(&mut self, byte: u8, count: usize) {
        for _ in 0..count {
            self.push_byte(byte);
        }
    }

    fn next_line(&mut self) {
        if self.rows < self.height {
            self.rows += 1;
        }
        self.x = 0;
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_length() {
        assert_eq!(CCITT_TIFF_HEADER_LEN, 108);
        let header = build_ccitt_tiff_header(1, 1, 0, CcittGroup::Group4);
        assert_eq!(header.len(), 108);
    }

    #[test]
    fn test_header_prefix() {
        let header = build_ccitt_tiff_header(100, 50, 10, CcittGroup::Group4);
        assert_eq!(&header[0..2], b"II");
        assert_eq!(&header[2..4], &[42, 0]);
        assert_eq!(&header[4..8], &[8, 0, 0, 0]);
        assert_eq!(&header[8..10], &[8, 0]);
        assert_eq!(&header[106..108], &[0, 0]);
    }

    #[test]
    fn test_header_tag_order() {
        let header = build_ccitt_tiff_header(100, 50, 10, CcittGroup::Group3);
        let tags: Vec<u16> = (0..8)
            .map(|i| read_u16(&header, 10 + i * IFD_ENTRY_LEN).unwrap())
            .collect();
        assert_eq!(tags, vec![256, 257, 258, 259, 262, 273, 278, 279]);
    }

    #[test]
    fn test_header_round_trip() {
        for (width, height, size, group) in [
            (1, 1, 0, CcittGroup::Group4),
            (2480, 3508, 51_234, CcittGroup::Group4),
            (1728, 2200, 9, CcittGroup::Group3),
            (u32::MAX, u32::MAX, u32::MAX, CcittGroup::Group3),
        ] {
            let header = build_ccitt_tiff_header(width, height, size, group);
            let fields = read_tiff_fields(&header).unwrap();
            assert_eq!(fields.width, width);
            assert_eq!(fields.height, height);
            assert_eq!(fields.rows_per_strip, height);
            assert_eq!(fields.bits_per_sample, 1);
            assert_eq!(fields.compression, group.tiff_compression());
            assert_eq!(fields.photometric, 0);
            assert_eq!(fields.strip_offset, 108);
            assert_eq!(fields.strip_byte_count, size);
        }
    }

    #[test]
    fn test_wrap_places_payload_after_header() {
        let container = wrap_ccitt(8, 1, CcittGroup::Group4, &[1, 2, 3]).unwrap();
        assert_eq!(container.len(), 111);
        assert_eq!(&container[108..], &[1, 2, 3]);
        let fields = read_tiff_fields(&container).unwrap();
        assert_eq!(fields.strip_byte_count, 3);
    }

    #[test]
    fn test_read_rejects_big_endian() {
        let mut header = build_ccitt_tiff_header(8, 8, 0, CcittGroup::Group4);
        header[0..2].copy_from_slice(b"MM");
        assert!(read_tiff_fields(&header).is_err());
    }

    #[test]
    fn test_read_rejects_truncated() {
        let header = build_ccitt_tiff_header(8, 8, 0, CcittGroup::Group4);
        assert!(read_tiff_fields(&header[..40]).is_err());
    }

    #[test]
    fn test_decode_rejects_strip_outside_container() {
        let header = build_ccitt_tiff_header(8, 8, 64, CcittGroup::Group4);
        assert!(decode_ccitt_tiff(&header, &CcittParams::default()).is_err());
    }

    #[test]
    fn test_decode_rejects_oversized_pages() {
        let container = wrap_ccitt(100_000, 100_000, CcittGroup::Group4, &[0xC0]).unwrap();
        assert!(decode_ccitt_tiff(&container, &g4()).is_err());
    }

    #[test]
    fn test_decode_group4_white_rows() {
        // Two V0 codes (one per row) followed by EOFB.
        let payload = [0xC0, 0x04, 0x00, 0x40];
        let container = wrap_ccitt(8, 2, CcittGroup::Group4, &payload).unwrap();
        let image = decode_ccitt_tiff(&container, &g4()).unwrap();
        assert_eq!(image.dimensions(), (8, 2));
        assert!(image.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_decode_group3_without_eol() {
        // Each row: white 4 (1011), black 4 (011); no EOL codes.
        let payload = [0xB7, 0x6C];
        let container = wrap_ccitt(8, 2, CcittGroup::Group3, &payload).unwrap();
        let image = decode_ccitt_tiff(&container, &CcittParams::default()).unwrap();

        assert_eq!(image.dimensions(), (8, 2));
        for y in 0..2 {
            assert_eq!(image.get_pixel(0, y).0, [255]);
            assert_eq!(image.get_pixel(3, y).0, [255]);
            assert_eq!(image.get_pixel(4, y).0, [0]);
            assert_eq!(image.get_pixel(7, y).0, [0]);
        }
    }

    #[test]
    fn test_decode_group3_mixed_coding() {
        // EOL + tag 1 + white 8 (10011), then EOL + tag 0 + V0.
        let payload = [0x00, 0x1C, 0xC0, 0x05, 0x00, 0x00];
        let container = wrap_ccitt(8, 2, CcittGroup::Group3, &payload).unwrap();
        let params = CcittParams {
            k: 2,
            end_of_line: true,
            ..CcittParams::default()
        };
        let image = decode_ccitt_tiff(&container, &params).unwrap();

        assert_eq!(image.dimensions(), (8, 2));
        assert!(image.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_decode_black_is_1_inverts() {
        let container = wrap_ccitt(8, 2, CcittGroup::Group3, &[0xB7, 0x6C]).unwrap();
        let params = CcittParams {
            black_is_1: true,
            ..CcittParams::default()
        };
        let image = decode_ccitt_tiff(&container, &params).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0]);
        assert_eq!(image.get_pixel(7, 0).0, [255]);
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        let container = wrap_ccitt(8, 2, CcittGroup::Group3, &[0x00, 0x00]).unwrap();
        assert!(decode_ccitt_tiff(&container, &CcittParams::default()).is_err());
    }

    #[test]
    fn test_encoding_mode_follows_k() {
        assert_eq!(
            encoding_mode(CcittGroup::Group4, -1),
            hayro_ccitt::EncodingMode::Group4
        );
        assert_eq!(
            encoding_mode(CcittGroup::Group3, 0),
            hayro_ccitt::EncodingMode::Group3_1D
        );
        assert_eq!(
            encoding_mode(CcittGroup::Group3, 4),
            hayro_ccitt::EncodingMode::Group3_2D { k: 4 }
        );
    }

    fn g4() -> CcittParams {
        CcittParams {
            k: -1,
            ..CcittParams::default()
        }
    }
}
