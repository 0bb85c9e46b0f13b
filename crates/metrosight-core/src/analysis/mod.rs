pub mod common;
pub mod demands;
pub mod hough;
pub mod line_indicators;
pub mod numeric;
pub mod placed_lines;
pub mod shape;
pub mod stations;
pub mod trains;

use std::fmt;

use image::Rgb;
use imageproc::point::Point;

use crate::rect::PixelRect;

pub use shape::{Shape, ShapeContext};

/// What a detector saw in one frame.
///
/// `Nothing` means the region was empty or unreadable, which is different
/// from a reading of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Found(T),
    Nothing,
}

impl<T> Outcome<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Outcome::Found(v) => Some(v),
            Outcome::Nothing => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Found(v) => Outcome::Found(f(v)),
            Outcome::Nothing => Outcome::Nothing,
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Collapse to the legacy reading, where "nothing" and zero look the same.
    pub fn value_or_default(self) -> T {
        match self {
            Outcome::Found(v) => v,
            Outcome::Nothing => T::default(),
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Outcome::Found(v),
            None => Outcome::Nothing,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Found(v) => write!(f, "{v}"),
            Outcome::Nothing => f.write_str("--"),
        }
    }
}

/// A station glyph on the map. Coordinates are frame-absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub center: (u32, u32),
    pub bbox: PixelRect,
    pub shape: Shape,
}

/// A vehicle on the map. Coordinates are frame-absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct Train {
    pub center: (u32, u32),
    pub bbox: PixelRect,
    /// Mean color under the vehicle's outline.
    pub color: Rgb<u8>,
    /// Bounding box width over height.
    pub aspect_ratio: f64,
    pub has_wagon: bool,
}

/// Opposite corners of one line piece's rotated bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub start: Point<i32>,
    pub end: Point<i32>,
}

/// A color rounded per channel to the quantization step. Channels can
/// round past 255, hence `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorBucket(pub [u16; 3]);

impl ColorBucket {
    pub fn quantize(color: [f64; 3], step: u16) -> Self {
        let step = step.max(1) as f64;
        // Halves go to the even multiple, so a flat 10 lands in the 0 bucket.
        ColorBucket(color.map(|c| ((c / step).round_ties_even() * step) as u16))
    }

    /// The bucket as a drawable color, saturating at 255.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb(self.0.map(|c| c.min(255) as u8))
    }
}

impl fmt::Display for ColorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "({r}, {g}, {b})")
    }
}

/// All line pieces of one color. Segments are not joined into a path.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub color: ColorBucket,
    pub segments: Vec<LineSegment>,
}

/// Line slots shown in the line indicator strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineIndicatorCounts {
    pub available: u32,
    pub locked: u32,
    pub placed: u32,
}

/// Passenger icons waiting at one station, keyed by the station's position
/// in the list that was passed to the demand detector.
#[derive(Debug, Clone, PartialEq)]
pub struct StationDemand {
    pub station_index: usize,
    pub demands: Vec<Shape>,
}
