use image::RgbImage;
use tracing::{debug, warn};

use crate::analysis::common::{binarize, has_foreground, Polarity};
use crate::analysis::Outcome;
use crate::ocr::DigitRecognizer;
use crate::rect::{crop, PixelRect};

/// Read an integer counter from `region` of `frame`.
///
/// Bright pixels above `bright_cutoff` are kept as digit ink. A region with
/// no ink, an engine failure, or text without digits all read as `Nothing`.
pub fn read_number<R: DigitRecognizer + ?Sized>(
    frame: &RgbImage,
    region: PixelRect,
    bright_cutoff: u8,
    recognizer: &R,
) -> Outcome<u32> {
    let Some((roi, _)) = crop(frame, region) else {
        debug!(?region, "numeric region outside frame");
        return Outcome::Nothing;
    };
    let gray = image::imageops::grayscale(&roi);
    let binary = binarize(&gray, bright_cutoff, Polarity::Bright);
    if !has_foreground(&binary) {
        return Outcome::Nothing;
    }

    let text = match recognizer.recognize_digits(&binary) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, ?region, "digit recognition failed");
            return Outcome::Nothing;
        }
    };
    parse_digits(&text).into()
}

/// Keep only ASCII digits and parse what remains.
pub fn parse_digits(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
