use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point;
use tracing::{debug, trace};

use crate::analysis::common::{external_blobs, mean_color_under};
use crate::analysis::{ColorBucket, LineSegment, PlacedLine};
use crate::config::DetectionConfig;
use crate::rect::{crop, PixelRect};

/// Find drawn metro line pieces in the map region, grouped by color.
///
/// Thin dark strokes are isolated with a local threshold. A stroke is kept
/// when the short side of its rotated bounding rectangle is inside the line
/// width band; anything wider than the river cutoff is dropped first.
/// Groups appear in the order their first piece was found.
pub fn detect_placed_lines(
    frame: &RgbImage,
    map: PixelRect,
    config: &DetectionConfig,
) -> Vec<PlacedLine> {
    let Some((roi, origin)) = crop(frame, map) else {
        debug!(?map, "map region outside frame");
        return Vec::new();
    };
    let width = roi.width() as f64;
    let min_width = (config.min_line_width * width).floor();
    let max_width = (config.max_line_width * width).floor();
    let river_width = (config.river_width * width).floor();

    let gray = image::imageops::grayscale(&roi);
    let mask = adaptive_threshold_inv(&gray, config.line_threshold_block, config.line_threshold_offset);

    let mut lines: Vec<PlacedLine> = Vec::new();
    for blob in external_blobs(&mask) {
        let (short, _) = blob.min_rect_sides();
        if short > river_width {
            trace!(short, "river-sized stroke skipped");
            continue;
        }
        if short < min_width || short > max_width {
            continue;
        }
        let Some(mean) = mean_color_under(&roi, &blob) else {
            continue;
        };
        let color = ColorBucket::quantize(mean, config.color_quantization_step);
        let (a, b) = blob.min_rect_diagonal();
        let segment = LineSegment {
            start: shift(a, origin),
            end: shift(b, origin),
        };

        match lines.iter_mut().find(|line| line.color == color) {
            Some(line) => line.segments.push(segment),
            None => lines.push(PlacedLine {
                color,
                segments: vec![segment],
            }),
        }
    }

    debug!(
        colors = lines.len(),
        segments = lines.iter().map(|l| l.segments.len()).sum::<usize>(),
        "placed lines detected"
    );
    lines
}

fn shift(p: Point<i32>, origin: PixelRect) -> Point<i32> {
    Point::new(p.x + origin.x as i32, p.y + origin.y as i32)
}

/// Foreground where a pixel is at least `offset` darker than its
/// Gaussian-weighted neighborhood of `block` x `block` pixels.
fn adaptive_threshold_inv(gray: &GrayImage, block: u32, offset: i16) -> GrayImage {
    // Sigma OpenCV derives for a Gaussian kernel of this size.
    let sigma = (0.3 * ((block.max(3) as f32 - 1.0) * 0.5 - 1.0) + 0.8).max(0.1);
    let local = gaussian_blur_f32(gray, sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as i16;
        let threshold = local.get_pixel(x, y)[0] as i16 - offset;
        Luma([if value <= threshold { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn whole(img: &RgbImage) -> PixelRect {
        PixelRect { x: 0, y: 0, w: img.width(), h: img.height() }
    }

    #[test]
    fn near_identical_colors_share_one_line() {
        let mut img = RgbImage::from_pixel(400, 300, WHITE);
        draw_filled_rect_mut(&mut img, Rect::at(50, 100).of_size(100, 5), Rgb([200, 40, 40]));
        draw_filled_rect_mut(&mut img, Rect::at(50, 200).of_size(100, 5), Rgb([204, 44, 36]));

        let lines = detect_placed_lines(&img, whole(&img), &DetectionConfig::default());
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert_eq!(lines[0].color, ColorBucket([200, 40, 40]));
        assert_eq!(lines[0].segments.len(), 2);
    }

    #[test]
    fn distinct_colors_are_separate_lines() {
        let mut img = RgbImage::from_pixel(400, 300, WHITE);
        draw_filled_rect_mut(&mut img, Rect::at(50, 100).of_size(100, 5), Rgb([200, 40, 40]));
        draw_filled_rect_mut(&mut img, Rect::at(50, 200).of_size(100, 5), Rgb([40, 80, 200]));

        let lines = detect_placed_lines(&img, whole(&img), &DetectionConfig::default());
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines.iter().all(|l| l.segments.len() == 1));
    }

    #[test]
    fn segment_spans_the_stroke() {
        let mut img = RgbImage::from_pixel(400, 300, WHITE);
        draw_filled_rect_mut(&mut img, Rect::at(60, 40).of_size(100, 5), Rgb([40, 80, 200]));
        let map = PixelRect { x: 10, y: 20, w: 390, h: 280 };

        let lines = detect_placed_lines(&img, map, &DetectionConfig::default());
        assert_eq!(lines.len(), 1);
        let seg = lines[0].segments[0];
        let xs = [seg.start.x.min(seg.end.x), seg.start.x.max(seg.end.x)];
        let ys = [seg.start.y.min(seg.end.y), seg.start.y.max(seg.end.y)];
        assert_eq!(xs, [60, 159]);
        assert_eq!(ys, [40, 44]);
    }

    #[test]
    fn wide_and_hairline_strokes_are_ignored() {
        let mut img = RgbImage::from_pixel(400, 300, WHITE);
        // River: 30 px across. Only its rim passes the local threshold, but
        // the rim's outer contour is as wide as the river.
        draw_filled_rect_mut(&mut img, Rect::at(20, 120).of_size(360, 30), Rgb([120, 170, 220]));
        // Single-pixel scratch.
        draw_filled_rect_mut(&mut img, Rect::at(50, 50).of_size(80, 1), Rgb([20, 20, 20]));
        assert!(detect_placed_lines(&img, whole(&img), &DetectionConfig::default()).is_empty());
    }
}
