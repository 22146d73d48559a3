//! Thin wrappers around the external programs the pipeline drives.

pub mod magick;
pub mod pdfbox;
pub mod tesseract;

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Command;

use crate::error::Error;

pub use magick::ImageMagick;
pub use pdfbox::PdfBox;
pub use tesseract::Tesseract;

/// Resolve a program name (or explicit path) to an executable.
pub fn locate(program: impl AsRef<OsStr>) -> Result<PathBuf, Error> {
    let program = program.as_ref();
    which::which(program).map_err(|_| Error::ToolNotFound(program.to_string_lossy().into_owned()))
}

/// Run `cmd` to completion and return its stdout.
///
/// A spawn failure or a non-zero exit becomes [`Error::ToolFailed`].
pub fn run_tool(tool: &str, cmd: &mut Command) -> Result<Vec<u8>, Error> {
    log::debug!("Running {:?}", cmd);

    let output = cmd.output().map_err(|e| Error::ToolFailed {
        tool: tool.to_string(),
        status: "not started".to_string(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

#[cfg(test)]
pub(crate) fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}
