use std::fs;
use std::path::{Path, PathBuf};

use ocrman_core::inputs::image_sequence_number;

use crate::prelude::{println, *};
use crate::tools::{PdfBox, Tesseract};

#[derive(Debug, clap::Parser)]
#[command(name = "pdfbox")]
#[command(about = "OCR every PDF in a directory through PDFBox image extraction")]
pub struct App {
    /// Directory holding the PDFs
    dir: PathBuf,

    /// Path to pdfbox-app.jar
    #[arg(long, env = "OCRMAN_PDFBOX_JAR")]
    jar: PathBuf,

    /// Java executable
    #[arg(long, env = "OCRMAN_JAVA", default_value = "java")]
    java: PathBuf,
}

/// Module entry point
pub fn run(app: App, global: crate::Global) -> Result<()> {
    let pdfbox = PdfBox::locate(&app.java, &app.jar)?;
    let tesseract = Tesseract::locate(global.tesseract.as_deref(), global.lang.clone())?;

    let mut pdfs: Vec<PathBuf> = fs::read_dir(&app.dir)
        .with_context(|| f!("Failed to list {}", app.dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "pdf"))
        .collect();
    pdfs.sort();

    let spinner = new_spinner()?;
    for pdf in &pdfs {
        spinner.set_message(f!("Extracting {}", pdf.display()));
        let transcript = pdf_to_text(&pdfbox, &tesseract, pdf)?;
        if global.verbose {
            spinner.println(f!("{} -> {}", pdf.display(), transcript.display()));
        }
    }
    spinner.finish_and_clear();

    println!("Transcribed {} PDF(s)", pdfs.len());
    Ok(())
}

/// Extract the images of `pdf` into a directory named after it, then OCR them
/// in sequence into `{dir}.txt`.
fn pdf_to_text(pdfbox: &PdfBox, tesseract: &Tesseract, pdf: &Path) -> Result<PathBuf> {
    let outdir = pdf.with_extension("");
    fs::create_dir_all(&outdir).with_context(|| f!("Failed to create {}", outdir.display()))?;

    let file_name = pdf
        .file_name()
        .ok_or_eyre("PDF path has no file name")?;
    let copy = outdir.join(file_name);
    fs::copy(pdf, &copy).with_context(|| f!("Failed to copy {}", pdf.display()))?;
    let extracted = pdfbox.extract_images(&copy, &outdir);
    fs::remove_file(&copy).with_context(|| f!("Failed to remove {}", copy.display()))?;
    extracted?;

    let transcript = outdir.with_extension("txt");
    images_to_text(tesseract, &outdir, &transcript)?;
    Ok(transcript)
}

/// OCR every image in `dir`, in PDFBox sequence order, into one file.
fn images_to_text(tesseract: &Tesseract, dir: &Path, out: &Path) -> Result<()> {
    let mut text = String::new();
    for image in ordered_images(dir)? {
        text.push_str(&tesseract.image_to_string(&image)?);
        text.push('\n');
    }
    fs::write(out, text).with_context(|| f!("Failed to write {}", out.display()))?;
    Ok(())
}

/// Files of `dir` ordered by their trailing `-N`; unnumbered files go last by name.
fn ordered_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| f!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();

    images.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (image_sequence_number(&name).unwrap_or(u64::MAX), name)
    });
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_images_by_sequence_number() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["scan-10.png", "scan-2.png", "cover.png", "scan-1.jpg"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<String> = ordered_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["scan-1.jpg", "scan-2.png", "scan-10.png", "cover.png"]);
    }
}
