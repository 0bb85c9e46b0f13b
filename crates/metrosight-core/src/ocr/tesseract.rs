use std::path::PathBuf;
use std::process::Command;

use image::GrayImage;
use tempfile::NamedTempFile;
use tracing::{debug, error};

use super::{DigitRecognizer, OcrError};

/// Runs the `tesseract` executable once per field, in single-line mode with
/// a digit whitelist.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl DigitRecognizer for TesseractCli {
    fn recognize_digits(&self, image: &GrayImage) -> Result<String, OcrError> {
        let input = NamedTempFile::with_suffix(".png").map_err(OcrError::WriteImage)?;
        image.save(input.path()).map_err(OcrError::EncodeImage)?;

        let output = Command::new(&self.program)
            .arg(input.path())
            .arg("stdout")
            .args(["--psm", "7"])
            .args(["-c", "tessedit_char_whitelist=0123456789"])
            .output()
            .map_err(|source| OcrError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = %output.status, %stderr, "tesseract failed");
            return Err(OcrError::Failed {
                status: output.status,
                stderr,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(text = text.trim(), "tesseract output");
        Ok(text)
    }
}
