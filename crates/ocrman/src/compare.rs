use std::fs;
use std::path::{Path, PathBuf};

use ocrman_core::compare::{Stopwords, Wordlist, WordlistOptions, DEFAULT_SPLIT_PATTERN};

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "compare")]
#[command(about = "Score OCR transcripts against a ground truth")]
pub struct App {
    /// Ground truth: a PDF with a text layer, a text file, or literal text
    #[arg(short = 'i', long)]
    true_pdf: String,

    /// Report file: per version, its label then the JSON scores
    #[arg(short, long)]
    output: PathBuf,

    /// Transcripts to score; a single directory expands into one version per entry
    #[arg(short = 'v', long, num_args = 1.., required = true)]
    ocr_versions: Vec<String>,

    /// Words to tally separately; a trailing '*' matches by prefix
    #[arg(long, num_args = 1..)]
    important_words: Vec<String>,

    /// Do not ignore case
    #[arg(long)]
    case_sensitive: bool,

    /// Encoding of every file read and written (utf8 or latin1)
    #[arg(long, default_value = "utf8")]
    encoding: String,

    /// Stopword file, one word per line, instead of the built-in English list
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Regular expression separating words
    #[arg(long, default_value = DEFAULT_SPLIT_PATTERN)]
    split_pattern: String,
}

/// Text encodings accepted for reading transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Latin1,
}

impl std::str::FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            _ => Err(Error::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl Encoding {
    fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes).context("File is not valid UTF-8"),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }

    fn read(self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| f!("Failed to read {}", path.display()))?;
        self.decode(bytes)
            .with_context(|| f!("Failed to decode {}", path.display()))
    }
}

/// Module entry point
pub fn run(app: App, _global: crate::Global) -> Result<()> {
    let encoding: Encoding = app.encoding.parse()?;

    let stopwords = match &app.stopwords {
        Some(path) => Stopwords::from_file(path)?,
        None => Stopwords::default(),
    };
    let options = WordlistOptions {
        split_pattern: app.split_pattern.clone(),
        ignore_case: !app.case_sensitive,
        stopwords,
        important_words: app.important_words.clone(),
    };

    let truth = read_truth(&app.true_pdf, encoding)?;
    let wordlist = Wordlist::new(&truth, &options)?;

    let mut report = String::new();
    let versions = expand_versions(&app.ocr_versions)?;
    for version in &versions {
        let text = read_version(version, encoding)?;
        let scores = serde_json::to_string(&wordlist.compare(&text))?;
        report.push_str(version);
        report.push('\n');
        report.push_str(&scores);
        report.push('\n');
    }

    fs::write(&app.output, encoding.encode(&report))
        .with_context(|| f!("Failed to write {}", app.output.display()))?;
    println!(
        "Compared {} version(s), report written to {}",
        versions.len(),
        app.output.display()
    );

    Ok(())
}

/// A `.pdf` file is read through its text layer, any other file as text, and
/// anything that is not a file is the text itself.
fn read_truth(arg: &str, encoding: Encoding) -> Result<String> {
    let path = Path::new(arg);
    if !path.is_file() {
        return Ok(arg.to_string());
    }
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        let bytes = fs::read(path).with_context(|| f!("Failed to read {}", path.display()))?;
        return pdf::extract_text(&bytes).map_err(|e| eyre!("{}: {}", path.display(), e));
    }
    encoding.read(path)
}

/// A lone directory argument stands for each of its entries.
fn expand_versions(args: &[String]) -> Result<Vec<String>> {
    match args {
        [single] if Path::new(single).is_dir() => Ok(sorted_entries(Path::new(single))?
            .into_iter()
            .map(|p| p.display().to_string())
            .collect()),
        _ => Ok(args.to_vec()),
    }
}

/// A file is read whole, a directory is its files concatenated, anything else
/// is literal text.
fn read_version(arg: &str, encoding: Encoding) -> Result<String> {
    let path = Path::new(arg);
    if path.is_file() {
        return encoding.read(path);
    }
    if path.is_dir() {
        let texts = sorted_entries(path)?
            .into_iter()
            .filter(|p| p.is_file())
            .map(|p| encoding.read(&p))
            .collect::<Result<Vec<_>>>()?;
        return Ok(texts.join("\n"));
    }
    Ok(arg.to_string())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| f!("Failed to list {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}
