//! Input enumeration, file classification and output naming.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::DataSpec;

/// Extensions handed straight to OCR without conversion.
pub const RASTER_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tif", "tiff", "gif", "bmp", "webp", "jp2",
];

/// What kind of document an input turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Unknown,
    TextPdf,
    ScannedPdf,
    Image,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Unknown => write!(f, "unknown"),
            FileType::TextPdf => write!(f, "text pdf"),
            FileType::ScannedPdf => write!(f, "scanned pdf"),
            FileType::Image => write!(f, "image"),
        }
    }
}

/// Classify by extension alone. A PDF counts as scanned until its text layer
/// has been probed.
pub fn classify_extension(ext: &str) -> FileType {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    if ext == "pdf" {
        FileType::ScannedPdf
    } else if RASTER_EXTENSIONS.contains(&ext.as_str()) {
        FileType::Image
    } else {
        FileType::Unknown
    }
}

/// Whether `path` passes the `filetypes` filter. An empty filter passes all.
pub fn matches_filetype(path: &Path, filetypes: &[String]) -> bool {
    if filetypes.is_empty() {
        return true;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    filetypes
        .iter()
        .any(|ft| ft.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Explicit files first, in the order given, then the regular files of each
/// directory sorted by name and filtered by `filetypes`.
pub fn collect_input_files(data: &DataSpec) -> io::Result<Vec<PathBuf>> {
    let mut inputs = data.files.clone();

    for dir in &data.directories {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                entries.push(entry.path());
            }
        }
        entries.sort();
        inputs.extend(
            entries
                .into_iter()
                .filter(|path| matches_filetype(path, &data.filetypes)),
        );
    }

    Ok(inputs)
}

/// The extension to process `path` as: its own (lower-cased), else the sniffed
/// container format, else `default_ext`.
pub fn resolve_extension(path: &Path, sniffed: Option<&str>, default_ext: &str) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .or(sniffed)
        .unwrap_or(default_ext)
        .trim_start_matches('.')
        .to_ascii_lowercase()
}

/// Whether extracted text holds at least `min_chars` alphanumeric characters.
pub fn has_text_layer(text: &str, min_chars: usize) -> bool {
    text.chars().filter(|c| c.is_alphanumeric()).count() >= min_chars.max(1)
}

/// Paths a single input produces inside the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    workspace: PathBuf,
    name: String,
}

impl OutputPaths {
    pub fn new(workspace: &Path, input: &Path) -> Self {
        let name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        Self {
            workspace: workspace.to_path_buf(),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `{workspace}/{name}.png`
    pub fn composite(&self) -> PathBuf {
        self.workspace.join(format!("{}.png", self.name))
    }

    /// `{workspace}/{name}.{ext}`
    pub fn copied_image(&self, ext: &str) -> PathBuf {
        self.workspace.join(format!("{}.{}", self.name, ext))
    }

    /// `{workspace}/{name}.txt`, for PDFs whose text layer is used as-is.
    pub fn text_layer(&self) -> PathBuf {
        self.workspace.join(format!("{}.txt", self.name))
    }

    /// `{workspace}/{name}.audit/`
    pub fn audit_dir(&self) -> PathBuf {
        self.workspace.join(format!("{}.audit", self.name))
    }
}

/// `{image}.txt`: the transcript sits next to the image it was read from.
pub fn transcript_path(image: &Path) -> PathBuf {
    let mut path = image.as_os_str().to_os_string();
    path.push(".txt");
    PathBuf::from(path)
}

/// Trailing `-N` of an extracted image's base name: `doc-12.png` is 12.
pub fn image_sequence_number(file_name: &str) -> Option<u64> {
    let base = file_name.split('.').next()?;
    base.rsplit('-').next()?.parse().ok()
}
