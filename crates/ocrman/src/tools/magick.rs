use std::path::{Path, PathBuf};
use std::process::Command;

use super::{locate, run_tool};
use crate::error::Error;

/// Resolution used when rasterizing whole pages.
pub const DENSITY: u32 = 300;

/// ImageMagick, used as the last-resort rasterizer for PDFs whose images
/// could not be extracted.
#[derive(Debug, Clone)]
pub struct ImageMagick {
    program: PathBuf,
}

impl ImageMagick {
    /// `magick` (ImageMagick 7), else the legacy `convert`.
    pub fn locate() -> Option<Self> {
        locate("magick")
            .or_else(|_| locate("convert"))
            .ok()
            .map(|program| Self { program })
    }

    /// `<magick> -density 300 <pdf> -append <out>`: every page stacked into one image.
    pub fn command(&self, pdf: &Path, out: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-density")
            .arg(DENSITY.to_string())
            .arg(pdf)
            .arg("-append")
            .arg(out);
        cmd
    }

    pub fn rasterize(&self, pdf: &Path, out: &Path) -> Result<(), Error> {
        run_tool("imagemagick", &mut self.command(pdf, out))?;
        Ok(())
    }
}
