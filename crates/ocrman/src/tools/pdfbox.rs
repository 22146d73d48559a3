use std::path::{Path, PathBuf};
use std::process::Command;

use super::{locate, run_tool};
use crate::error::Error;

/// Apache PDFBox's `ExtractImages` tool, run through a JVM.
#[derive(Debug, Clone)]
pub struct PdfBox {
    java: PathBuf,
    jar: PathBuf,
}

impl PdfBox {
    pub fn locate(java: &Path, jar: &Path) -> Result<Self, Error> {
        if !jar.is_file() {
            return Err(Error::ToolNotFound(jar.display().to_string()));
        }
        Ok(Self {
            java: locate(java)?,
            jar: jar.to_path_buf(),
        })
    }

    /// `java -jar <jar> ExtractImages <pdf>`, run inside `workdir` where the
    /// images land.
    pub fn command(&self, pdf: &Path, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.arg("-jar")
            .arg(&self.jar)
            .arg("ExtractImages")
            .arg(pdf)
            .current_dir(workdir);
        cmd
    }

    pub fn extract_images(&self, pdf: &Path, workdir: &Path) -> Result<(), Error> {
        run_tool("pdfbox", &mut self.command(pdf, workdir))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::args_of;

    #[test]
    fn test_command() {
        let pdfbox = PdfBox {
            java: PathBuf::from("java"),
            jar: PathBuf::from("res/pdfbox-app.jar"),
        };
        let cmd = pdfbox.command(Path::new("scan/scan.pdf"), Path::new("scan"));
        assert_eq!(
            args_of(&cmd),
            vec!["-jar", "res/pdfbox-app.jar", "ExtractImages", "scan/scan.pdf"]
        );
        assert_eq!(cmd.get_current_dir(), Some(Path::new("scan")));
    }

    #[test]
    fn test_locate_requires_jar() {
        let err = PdfBox::locate(Path::new("java"), Path::new("/nonexistent/pdfbox.jar")).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }
}
