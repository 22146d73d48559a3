use std::path::PathBuf;

use crate::prelude::*;
use clap::Parser;

mod compare;
mod convert;
mod error;
mod extract;
mod pdfbox;
mod pipeline;
mod prelude;
mod tools;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Batch OCR for scanned PDFs and images"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Tesseract executable, if not on PATH as `tesseract`
    #[clap(long, env = "OCRMAN_TESSERACT", global = true)]
    tesseract: Option<PathBuf>,

    /// Tesseract language(s), e.g. "eng" or "deu+eng"
    #[clap(long, env = "OCRMAN_LANG", global = true)]
    lang: Option<String>,

    /// Whether to display additional information.
    #[clap(long, env = "OCRMAN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run a batch described by a config file
    Run(crate::pipeline::App),

    /// Composite the embedded images of one PDF
    Extract(crate::extract::App),

    /// Score OCR transcripts against a ground truth
    Compare(crate::compare::App),

    /// OCR a directory of PDFs through PDFBox image extraction
    Pdfbox(crate::pdfbox::App),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Run(sub_app) => crate::pipeline::run(sub_app, app.global),
        SubCommands::Extract(sub_app) => crate::extract::run(sub_app, app.global),
        SubCommands::Compare(sub_app) => crate::compare::run(sub_app, app.global),
        SubCommands::Pdfbox(sub_app) => crate::pdfbox::run(sub_app, app.global),
    }
}
