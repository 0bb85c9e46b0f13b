mod tesseract;

pub use tesseract::TesseractCli;

use std::path::PathBuf;

use image::GrayImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to write OCR input image")]
    WriteImage(#[source] std::io::Error),
    #[error("failed to encode OCR input image")]
    EncodeImage(#[source] image::ImageError),
    #[error("failed to run OCR engine {program}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("OCR engine exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Text recognition restricted to a single line of digits.
///
/// Implementations return whatever the engine printed; callers filter it.
pub trait DigitRecognizer {
    fn recognize_digits(&self, image: &GrayImage) -> Result<String, OcrError>;
}

impl<R: DigitRecognizer + ?Sized> DigitRecognizer for &R {
    fn recognize_digits(&self, image: &GrayImage) -> Result<String, OcrError> {
        (**self).recognize_digits(image)
    }
}
