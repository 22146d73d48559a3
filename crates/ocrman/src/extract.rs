use std::path::PathBuf;

use colored::Colorize;
use pdf::{Axis, ExtractOptions, ExtractionSummary, KeyScheme, DEFAULT_PAGE_STRIDE};

use crate::convert::{convert_pdf_to_image, ConvertOptions, Source};
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "extract")]
#[command(about = "Composite the embedded images of one PDF into a single image")]
pub struct App {
    /// Path to the PDF file
    pdf: PathBuf,

    /// Output image path; the format follows the extension
    #[arg(short, long)]
    output: PathBuf,

    /// Stack images left to right instead of top to bottom
    #[arg(long)]
    horizontal: bool,

    /// Write the raw bytes of every image object into this directory
    #[arg(long)]
    audit_dir: Option<PathBuf>,

    /// Ordering key multiplier; must exceed the image count of any page
    #[arg(long, default_value_t = DEFAULT_PAGE_STRIDE)]
    page_stride: usize,

    /// Rasterize the pages with ImageMagick when no image can be extracted
    #[arg(long)]
    force: bool,

    /// Output the extraction summary as JSON
    #[arg(long)]
    json: bool,
}

/// Module entry point
pub fn run(app: App, global: crate::Global) -> Result<()> {
    if app.page_stride == 0 {
        return Err(eyre!("--page-stride must be positive"));
    }

    let options = ConvertOptions {
        extract: ExtractOptions {
            keys: KeyScheme::new(app.page_stride),
            audit_dir: app.audit_dir.clone(),
        },
        axis: if app.horizontal {
            Axis::Horizontal
        } else {
            Axis::Vertical
        },
        force: app.force,
    };

    let converted = convert_pdf_to_image(&app.pdf, &app.output, &options)?;

    if let Some(summary) = &converted.summary {
        if app.json {
            println!("{}", serde_json::to_string_pretty(summary)?);
        } else {
            print_summary(summary, global.verbose);
        }
    }

    match converted.image {
        Some((path, Source::Embedded)) => {
            if !app.json {
                println!("{}", f!("Wrote {}", path.display()).green());
            }
        }
        Some((path, Source::Rasterized)) => {
            println!("{}", f!("Rasterized to {}", path.display()).green())
        }
        None if app.force => {
            return Err(eyre!("No image could be produced for {}", app.pdf.display()))
        }
        None if converted.summary.is_none() => {
            return Err(eyre!("Failed to read {}", app.pdf.display()))
        }
        None => println!("No decodable images in {}", app.pdf.display()),
    }

    Ok(())
}

fn print_summary(summary: &ExtractionSummary, verbose: bool) {
    let mut table = new_table();
    table.add_row(prettytable::row!["Images", summary.defined]);
    table.add_row(prettytable::row!["Slots", summary.slots]);
    table.add_row(prettytable::row!["Overflow", summary.overflow]);
    table.add_row(prettytable::row!["Skipped", summary.skipped.len()]);
    table.printstd();

    if verbose {
        for skipped in &summary.skipped {
            println!(
                "{} page {} {}: {}",
                "skipped".yellow(),
                skipped.page_index,
                skipped.name,
                skipped.reason
            );
        }
    }
}
