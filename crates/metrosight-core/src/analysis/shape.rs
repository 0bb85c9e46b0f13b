//! Polygon-heuristic shape labels for stations and demand icons.
//!
//! The vertex count of a Douglas-Peucker approximation decides first.
//! Circularity and solidity only break the cases vertex count gets wrong
//! on clean rasterized input: a smooth circle approximates to five to seven
//! vertices, and a plus sign keeps all twelve of its corners.

use std::fmt;

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::map::map_colors;
use tracing::debug;

use crate::analysis::common::{external_blobs, Blob};

/// Low-vertex shapes at least this round are circles.
const CIRCLE_MIN_CIRCULARITY: f64 = 0.85;
/// Convex enough to be a circle or a polygon rather than a cross.
const CONVEX_MIN_SOLIDITY: f64 = 0.9;
/// Many-vertex shapes below this solidity are crosses.
const CROSS_MAX_SOLIDITY: f64 = 0.8;
/// Open width/height band for a four-vertex shape to count as a square.
const SQUARE_ASPECT_MIN: f64 = 0.9;
const SQUARE_ASPECT_MAX: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Circle,
    Square,
    Rectangle,
    Triangle,
    Pentagon,
    Bell,
    Cross,
    Unidentified,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Rectangle => "rectangle",
            Shape::Triangle => "triangle",
            Shape::Pentagon => "pentagon",
            Shape::Bell => "bell",
            Shape::Cross => "cross",
            Shape::Unidentified => "unidentified",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where the contour came from. Five vertices reads as a pentagon station
/// but as a bell in a passenger demand icon, and icons are too small for
/// the round/solid refinements to be meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeContext {
    Station,
    DemandIcon,
}

/// Vertex count of the contour's polygon approximation at `tolerance` x perimeter.
pub fn vertex_count(blob: &Blob, tolerance: f64) -> usize {
    let epsilon = tolerance * blob.perimeter;
    if blob.points.is_empty() || epsilon.is_nan() || epsilon <= 0.0 {
        return blob.points.len().min(1);
    }
    approximate_polygon_dp(&blob.points, epsilon, true).len()
}

pub fn classify_blob(blob: &Blob, tolerance: f64, context: ShapeContext) -> Shape {
    let vertices = vertex_count(blob, tolerance);
    let shape = match context {
        ShapeContext::DemandIcon => classify_vertices(vertices, context),
        ShapeContext::Station => classify_station(blob, vertices),
    };
    debug!(
        vertices,
        area = blob.area,
        perimeter = blob.perimeter,
        %shape,
        "shape classified"
    );
    shape
}

/// Plain vertex-count rule.
fn classify_vertices(vertices: usize, context: ShapeContext) -> Shape {
    match vertices {
        3 => Shape::Triangle,
        4 => Shape::Square,
        5 => match context {
            ShapeContext::Station => Shape::Pentagon,
            ShapeContext::DemandIcon => Shape::Bell,
        },
        6 => Shape::Cross,
        v if v >= 8 => Shape::Circle,
        _ => Shape::Unidentified,
    }
}

fn classify_station(blob: &Blob, vertices: usize) -> Shape {
    match vertices {
        3 => Shape::Triangle,
        4 => {
            let aspect = blob.bbox.aspect_ratio();
            if aspect > SQUARE_ASPECT_MIN && aspect < SQUARE_ASPECT_MAX {
                Shape::Square
            } else {
                Shape::Rectangle
            }
        }
        5..=7 => {
            let circularity = blob.circularity();
            let solidity = blob.solidity();
            if circularity >= CIRCLE_MIN_CIRCULARITY && solidity >= CONVEX_MIN_SOLIDITY {
                Shape::Circle
            } else {
                classify_vertices(vertices, ShapeContext::Station)
            }
        }
        v if v >= 8 => {
            let solidity = blob.solidity();
            if solidity >= CONVEX_MIN_SOLIDITY {
                Shape::Circle
            } else if solidity < CROSS_MAX_SOLIDITY {
                Shape::Cross
            } else {
                Shape::Unidentified
            }
        }
        _ => Shape::Unidentified,
    }
}

/// Classify the dominant shape in a small color patch.
///
/// The patch border is taken as background, so light-on-dark and
/// dark-on-light glyphs both work. The largest outer contour decides.
pub fn classify_patch(patch: &RgbImage, tolerance: f64, context: ShapeContext) -> Shape {
    let gray = image::imageops::grayscale(patch);
    let Some(binary) = foreground_mask(&gray) else {
        return Shape::Unidentified;
    };
    external_blobs(&binary)
        .into_iter()
        .max_by(|a, b| a.area.total_cmp(&b.area))
        .map(|blob| classify_blob(&blob, tolerance, context))
        .unwrap_or(Shape::Unidentified)
}

fn foreground_mask(gray: &GrayImage) -> Option<GrayImage> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let level = otsu_level(gray);
    let border_sum: u64 = gray
        .enumerate_pixels()
        .filter(|(x, y, _)| *x == 0 || *y == 0 || *x == w - 1 || *y == h - 1)
        .map(|(_, _, p)| p[0] as u64)
        .sum();
    let border_count = 2 * (w as u64 + h as u64) - 4;
    let border_is_bright = border_sum / border_count.max(1) > level as u64;

    Some(map_colors(gray, |p: Luma<u8>| {
        let bright = p[0] > level;
        Luma([if bright != border_is_bright { 255 } else { 0 }])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    const TOLERANCE: f64 = 0.04;
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn canvas(bg: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(100, 100, bg)
    }

    #[test]
    fn filled_circle_is_circle() {
        let mut img = canvas(BLACK);
        draw_filled_circle_mut(&mut img, (50, 50), 30, WHITE);
        assert_eq!(classify_patch(&img, TOLERANCE, ShapeContext::Station), Shape::Circle);
    }

    #[test]
    fn filled_triangle_is_triangle() {
        let mut img = canvas(BLACK);
        let pts = [Point::new(50, 20), Point::new(20, 80), Point::new(80, 80)];
        draw_polygon_mut(&mut img, &pts, WHITE);
        assert_eq!(classify_patch(&img, TOLERANCE, ShapeContext::Station), Shape::Triangle);
    }

    #[test]
    fn filled_square_is_square() {
        let mut img = canvas(BLACK);
        draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(61, 61), WHITE);
        assert_eq!(classify_patch(&img, TOLERANCE, ShapeContext::Station), Shape::Square);
    }

    #[test]
    fn dark_on_light_patch_is_handled() {
        let mut img = canvas(Rgb([240, 240, 235]));
        draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(61, 61), Rgb([40, 40, 40]));
        assert_eq!(classify_patch(&img, TOLERANCE, ShapeContext::Station), Shape::Square);
    }

    #[test]
    fn wide_box_is_rectangle() {
        let mut img = canvas(BLACK);
        draw_filled_rect_mut(&mut img, Rect::at(10, 35).of_size(80, 30), WHITE);
        assert_eq!(
            classify_patch(&img, TOLERANCE, ShapeContext::Station),
            Shape::Rectangle
        );
    }

    #[test]
    fn plus_sign_is_cross() {
        let mut img = canvas(BLACK);
        draw_filled_rect_mut(&mut img, Rect::at(40, 10).of_size(20, 80), WHITE);
        draw_filled_rect_mut(&mut img, Rect::at(10, 40).of_size(80, 20), WHITE);
        assert_eq!(classify_patch(&img, TOLERANCE, ShapeContext::Station), Shape::Cross);
    }

    #[test]
    fn blank_patch_is_unidentified() {
        let img = canvas(WHITE);
        assert_eq!(
            classify_patch(&img, TOLERANCE, ShapeContext::Station),
            Shape::Unidentified
        );
    }

    fn blob_of_rect(w: u32, h: u32) -> Blob {
        let mut mask = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(w, h), Luma([255]));
        external_blobs(&mask).remove(0)
    }

    #[test]
    fn aspect_band_edges_are_rectangles() {
        assert_eq!(classify_blob(&blob_of_rect(22, 20), TOLERANCE, ShapeContext::Station), Shape::Rectangle);
        assert_eq!(classify_blob(&blob_of_rect(27, 30), TOLERANCE, ShapeContext::Station), Shape::Rectangle);
        assert_eq!(classify_blob(&blob_of_rect(21, 20), TOLERANCE, ShapeContext::Station), Shape::Square);
    }

    #[test]
    fn non_positive_tolerance_is_unidentified() {
        let blob = blob_of_rect(30, 30);
        assert_eq!(classify_blob(&blob, 0.0, ShapeContext::Station), Shape::Unidentified);
        assert_eq!(classify_blob(&blob, -0.04, ShapeContext::DemandIcon), Shape::Unidentified);
        assert_eq!(classify_blob(&blob, f64::NAN, ShapeContext::Station), Shape::Unidentified);
    }

    #[test]
    fn vertex_rule_depends_on_context() {
        assert_eq!(classify_vertices(5, ShapeContext::Station), Shape::Pentagon);
        assert_eq!(classify_vertices(5, ShapeContext::DemandIcon), Shape::Bell);
        assert_eq!(classify_vertices(6, ShapeContext::DemandIcon), Shape::Cross);
        assert_eq!(classify_vertices(9, ShapeContext::DemandIcon), Shape::Circle);
        assert_eq!(classify_vertices(7, ShapeContext::DemandIcon), Shape::Unidentified);
        assert_eq!(classify_vertices(2, ShapeContext::DemandIcon), Shape::Unidentified);
    }
}
