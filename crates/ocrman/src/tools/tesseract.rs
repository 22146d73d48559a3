use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use ocrman_core::inputs::transcript_path;

use super::{locate, run_tool};
use crate::prelude::*;

/// The `tesseract` command-line OCR engine.
#[derive(Debug, Clone)]
pub struct Tesseract {
    program: PathBuf,
    lang: Option<String>,
}

impl Tesseract {
    /// Find the executable, either the explicit override or `tesseract` on PATH.
    pub fn locate(program: Option<&Path>, lang: Option<String>) -> Result<Self, Error> {
        let program = match program {
            Some(path) => locate(path)?,
            None => locate("tesseract")?,
        };
        Ok(Self { program, lang })
    }

    /// `tesseract <image> stdout [-l lang]`
    pub fn command(&self, image: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(image).arg("stdout");
        if let Some(lang) = &self.lang {
            cmd.arg("-l").arg(lang);
        }
        cmd
    }

    pub fn image_to_string(&self, image: &Path) -> Result<String, Error> {
        let stdout = run_tool("tesseract", &mut self.command(image))?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// OCR `image` into `{image}.txt` and return the transcript path.
    pub fn transcribe(&self, image: &Path) -> Result<PathBuf> {
        let text = self.image_to_string(image)?;
        let out = transcript_path(image);
        fs::write(&out, text).with_context(|| f!("Failed to write {}", out.display()))?;
        log::info!("Transcribed {} -> {}", image.display(), out.display());
        Ok(out)
    }
}
