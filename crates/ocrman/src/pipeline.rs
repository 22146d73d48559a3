use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use colored::Colorize;
use ocrman_core::config::{load_config, Config, Layout};
use ocrman_core::inputs::{
    classify_extension, collect_input_files, has_text_layer, resolve_extension, FileType,
    OutputPaths,
};
use pdf::{Axis, ExtractOptions, KeyScheme};

use crate::convert::{convert_pdf_to_image, ConvertOptions};
use crate::prelude::{println, *};
use crate::tools::Tesseract;

#[derive(Debug, clap::Parser)]
#[command(name = "run")]
#[command(about = "Run a batch described by a config file")]
pub struct App {
    /// Config file (.json, .yaml/.yml or .toml)
    config: PathBuf,
}

/// What happened to one input.
#[derive(Debug)]
struct Outcome {
    file_type: FileType,
    output: Option<PathBuf>,
}

/// Module entry point
pub fn run(app: App, global: crate::Global) -> Result<()> {
    let config = load_config(&app.config)
        .with_context(|| f!("Failed to load config {}", app.config.display()))?;

    fs::create_dir_all(&config.workspace)
        .with_context(|| f!("Failed to create workspace {}", config.workspace.display()))?;

    let inputs = collect_input_files(&config.data).context("Failed to collect input files")?;
    log::info!("{} input file(s)", inputs.len());

    let tesseract = Tesseract::locate(global.tesseract.as_deref(), global.lang.clone());
    if let Err(e) = &tesseract {
        log::warn!("{}; only text-layer PDFs can be processed", e);
    }

    let spinner = new_spinner()?;
    let mut table = new_table();
    table.add_row(prettytable::row!["File", "Type", "Output", "Status"]);
    let mut failures = 0;

    for input in &inputs {
        spinner.set_message(f!("Processing {}", input.display()));

        match process_file(input, &config, tesseract.as_ref()) {
            Ok(outcome) => {
                let output = outcome
                    .output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                table.add_row(prettytable::row![
                    input.display(),
                    outcome.file_type,
                    output,
                    "ok".green()
                ]);
            }
            Err(e) => {
                failures += 1;
                log::error!("{}: {:#}", input.display(), e);
                if global.verbose {
                    spinner.println(f!("{} {}: {:#}", "error".red(), input.display(), e));
                }
                table.add_row(prettytable::row![input.display(), "", "", "failed".red()]);
            }
        }
    }

    spinner.finish_and_clear();
    table.printstd();

    println!(
        "Processed {} file(s), {} failed",
        inputs.len() - failures,
        failures
    );

    Ok(())
}

fn axis(layout: Layout) -> Axis {
    match layout {
        Layout::Vertical => Axis::Vertical,
        Layout::Horizontal => Axis::Horizontal,
    }
}

/// Extension of the container held in `path`, from its first bytes.
pub fn sniff_extension(path: &Path) -> Option<String> {
    let mut head = [0u8; 16];
    let n = fs::File::open(path).ok()?.read(&mut head).ok()?;
    let head = &head[..n];
    if head.starts_with(b"%PDF") {
        return Some("pdf".to_string());
    }
    pdf::detect_image_format(head).extension().map(str::to_string)
}

fn process_file(
    input: &Path,
    config: &Config,
    tesseract: std::result::Result<&Tesseract, &Error>,
) -> Result<Outcome> {
    let sniffed = match input.extension() {
        Some(_) => None,
        None => sniff_extension(input),
    };
    let ext = resolve_extension(input, sniffed.as_deref(), &config.default_ext);
    let paths = OutputPaths::new(&config.workspace, input);
    let ocr = || tesseract.map_err(|e| eyre!("{}", e));

    match classify_extension(&ext) {
        FileType::ScannedPdf | FileType::TextPdf => {
            if config.text_first {
                if let Some(out) = use_text_layer(input, &paths, config.min_text_chars)? {
                    return Ok(Outcome {
                        file_type: FileType::TextPdf,
                        output: Some(out),
                    });
                }
            }

            let options = ConvertOptions {
                extract: ExtractOptions {
                    keys: KeyScheme::new(config.page_stride),
                    audit_dir: config.audit.then(|| paths.audit_dir()),
                },
                axis: axis(config.layout),
                force: config.force_convert,
            };
            let converted = convert_pdf_to_image(input, &paths.composite(), &options)?;
            let image = converted
                .path()
                .ok_or_else(|| eyre!("no image could be produced"))?;

            Ok(Outcome {
                file_type: FileType::ScannedPdf,
                output: Some(ocr()?.transcribe(image)?),
            })
        }
        FileType::Image => {
            let copy = paths.copied_image(&ext);
            fs::copy(input, &copy).with_context(|| f!("Failed to copy to {}", copy.display()))?;
            Ok(Outcome {
                file_type: FileType::Image,
                output: Some(ocr()?.transcribe(&copy)?),
            })
        }
        FileType::Unknown => {
            let copy = paths.copied_image(&ext);
            fs::copy(input, &copy).with_context(|| f!("Failed to copy to {}", copy.display()))?;
            log::info!(
                "Doing nothing to {} with extension {:?}",
                input.display(),
                ext
            );
            Ok(Outcome {
                file_type: FileType::Unknown,
                output: None,
            })
        }
    }
}

/// Write the PDF's own text to `{name}.txt` when it has enough of it.
fn use_text_layer(input: &Path, paths: &OutputPaths, min_chars: usize) -> Result<Option<PathBuf>> {
    let bytes = fs::read(input).with_context(|| f!("Failed to read {}", input.display()))?;
    let text = match pdf::extract_text(&bytes) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("{}: no text layer: {}", input.display(), e);
            return Ok(None);
        }
    };
    if !has_text_layer(&text, min_chars) {
        return Ok(None);
    }

    let out = paths.text_layer();
    fs::write(&out, text).with_context(|| f!("Failed to write {}", out.display()))?;
    log::info!("{}: used embedded text layer", input.display());
    Ok(Some(out))
}
