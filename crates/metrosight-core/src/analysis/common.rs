use std::fmt::{self, Formatter};

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometry::{arc_length, convex_hull, min_area_rect};
use imageproc::map::map_colors;
use imageproc::point::Point;

use crate::rect::PixelRect;

/// HSV representation. H in [0, 360), S and V in [0.0, 1.0].
#[derive(Debug, Clone, Copy)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl fmt::Display for Hsv {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[H: {:.0}°, S: {:.2}, V: {:.2}]", self.h, self.s, self.v)
    }
}

pub fn rgb_to_hsv(rgb: Rgb<u8>) -> Hsv {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h = if delta < 1e-6 {
        0.0
    } else if (max - r).abs() < 1e-6 {
        60.0 * (((g - b) / delta) % 6.0)
    } else if (max - g).abs() < 1e-6 {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };

    Hsv { h, s, v }
}

/// Which side of the cutoff becomes foreground (255).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pixels strictly above the cutoff.
    Bright,
    /// Pixels at or below the cutoff.
    Dark,
}

pub fn binarize(gray: &GrayImage, cutoff: u8, polarity: Polarity) -> GrayImage {
    map_colors(gray, |p: Luma<u8>| {
        let fg = match polarity {
            Polarity::Bright => p[0] > cutoff,
            Polarity::Dark => p[0] <= cutoff,
        };
        Luma([if fg { 255 } else { 0 }])
    })
}

pub fn has_foreground(binary: &GrayImage) -> bool {
    binary.pixels().any(|p| p[0] > 0)
}

/// A closed outer boundary of a foreground region with its derived measures.
#[derive(Debug, Clone)]
pub struct Blob {
    pub points: Vec<Point<i32>>,
    pub area: f64,
    pub perimeter: f64,
    /// Pixel extent, ROI-relative.
    pub bbox: PixelRect,
}

impl Blob {
    fn new(points: Vec<Point<i32>>) -> Self {
        let area = polygon_area(&points);
        let perimeter = arc_length(&points, true);
        let bbox = bounding_box(&points);
        Self {
            points,
            area,
            perimeter,
            bbox,
        }
    }

    /// 4π·area / perimeter²; 1.0 for a perfect circle.
    pub fn circularity(&self) -> f64 {
        if self.perimeter <= 0.0 {
            return 0.0;
        }
        4.0 * std::f64::consts::PI * self.area / (self.perimeter * self.perimeter)
    }

    /// Area over convex hull area; 1.0 for convex shapes.
    pub fn solidity(&self) -> f64 {
        let hull = convex_hull(self.points.as_slice());
        let hull_area = polygon_area(&hull);
        if hull_area <= 0.0 {
            return 0.0;
        }
        self.area / hull_area
    }

    /// Side lengths of the minimum-area rotated rectangle, shorter first.
    pub fn min_rect_sides(&self) -> (f64, f64) {
        let corners = min_area_rect(&self.points);
        let a = distance(corners[0], corners[1]);
        let b = distance(corners[1], corners[2]);
        (a.min(b), a.max(b))
    }

    /// Opposite corners of the minimum-area rotated rectangle.
    pub fn min_rect_diagonal(&self) -> (Point<i32>, Point<i32>) {
        let corners = min_area_rect(&self.points);
        (corners[0], corners[2])
    }
}

/// Outermost contours of the non-zero regions of `binary`. Holes and
/// anything nested inside them are skipped.
pub fn external_blobs(binary: &GrayImage) -> Vec<Blob> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| Blob::new(c.points))
        .collect()
}

/// Shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice.abs() as f64 / 2.0
}

/// Pixel extent of a point set (width counts pixels, so a single point is 1x1).
pub fn bounding_box(points: &[Point<i32>]) -> PixelRect {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0).max(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(-1);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(-1);
    PixelRect {
        x: min_x as u32,
        y: min_y as u32,
        w: (max_x - min_x + 1).max(0) as u32,
        h: (max_y - min_y + 1).max(0) as u32,
    }
}

pub fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Mean color of `image` under the filled outline of `blob`.
/// The mask is built over the blob's bounding box only.
pub fn mean_color_under(image: &RgbImage, blob: &Blob) -> Option<[f64; 3]> {
    let bbox = blob.bbox.clamp_to(image.width(), image.height())?;
    let mut mask = GrayImage::new(bbox.w, bbox.h);
    let local: Vec<Point<i32>> = blob
        .points
        .iter()
        .map(|p| Point::new(p.x - bbox.x as i32, p.y - bbox.y as i32))
        .collect();
    fill_outline(&mut mask, &local);

    let mut sum = [0.0f64; 3];
    let mut count = 0u64;
    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        let px = image.get_pixel(bbox.x + x, bbox.y + y);
        for c in 0..3 {
            sum[c] += px[c] as f64;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum.map(|s| s / count as f64))
}

/// Fill a closed outline. Degenerate outlines (fewer than three distinct
/// points) are drawn point by point.
fn fill_outline(mask: &mut GrayImage, outline: &[Point<i32>]) {
    let mut poly = outline.to_vec();
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() >= 3 {
        draw_polygon_mut(mask, &poly, Luma([255]));
    }
    // draw_polygon_mut fills scanlines; put the outline itself in too so
    // one-pixel-wide blobs are covered.
    for p in outline {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < mask.width() && (p.y as u32) < mask.height() {
            mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
        }
    }
}

pub fn round_color(color: [f64; 3]) -> Rgb<u8> {
    Rgb(color.map(|c| c.round().clamp(0.0, 255.0) as u8))
}
