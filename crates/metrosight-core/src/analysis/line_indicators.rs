use image::RgbImage;
use tracing::debug;

use crate::analysis::common::rgb_to_hsv;
use crate::analysis::hough::{find_circles, Circle, CircleSearch};
use crate::analysis::{LineIndicatorCounts, Outcome};
use crate::config::DetectionConfig;
use crate::rect::{crop, PixelRect};

/// Half extent of the saturation probe around a circle center.
const PROBE_HALF: u32 = 2;

/// Count line slots in the indicator strip.
///
/// Each circle is sampled at its center: a grey disk is a locked slot, a
/// colored disk at least `indicator_placed_radius` of the strip width is a
/// line already on the map, and a smaller colored disk is a free slot.
/// `Nothing` when the strip is off-frame or holds no circle.
pub fn detect_line_indicators(
    frame: &RgbImage,
    region: PixelRect,
    config: &DetectionConfig,
) -> Outcome<LineIndicatorCounts> {
    let Some((roi, _)) = crop(frame, region) else {
        debug!(?region, "line indicator region outside frame");
        return Outcome::Nothing;
    };

    let width = roi.width() as f64;
    let search = CircleSearch {
        min_radius: (config.indicator_min_radius * width) as u32,
        max_radius: (config.indicator_max_radius * width) as u32,
        min_center_distance: config.indicator_min_center_distance,
        min_vote_fraction: config.indicator_min_vote_fraction,
    };
    let placed_radius = (config.indicator_placed_radius * width) as u32;

    let gray = image::imageops::grayscale(&roi);
    let circles = find_circles(&gray, &search);
    if circles.is_empty() {
        return Outcome::Nothing;
    }

    let mut counts = LineIndicatorCounts::default();
    for circle in &circles {
        let saturation = center_saturation(&roi, circle);
        if saturation < config.indicator_locked_saturation {
            counts.locked += 1;
        } else if circle.radius.round() as u32 >= placed_radius {
            counts.placed += 1;
        } else {
            counts.available += 1;
        }
        debug!(
            x = circle.x,
            y = circle.y,
            radius = circle.radius,
            saturation,
            "line indicator circle"
        );
    }
    debug!(?counts, "line indicators counted");
    Outcome::Found(counts)
}

/// Mean HSV saturation of the block `[cx-2, cx+2) x [cy-2, cy+2)`, clipped
/// to the image.
fn center_saturation(roi: &RgbImage, circle: &Circle) -> f32 {
    let x0 = circle.x.saturating_sub(PROBE_HALF);
    let y0 = circle.y.saturating_sub(PROBE_HALF);
    let x1 = (circle.x + PROBE_HALF).min(roi.width());
    let y1 = (circle.y + PROBE_HALF).min(roi.height());

    let mut sum = 0.0f32;
    let mut count = 0u32;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += rgb_to_hsv(*roi.get_pixel(x, y)).s;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_circle_mut;

    const STRIP: Rgb<u8> = Rgb([245, 245, 240]);

    fn whole(img: &RgbImage) -> PixelRect {
        PixelRect { x: 0, y: 0, w: img.width(), h: img.height() }
    }

    #[test]
    fn buckets_by_saturation_and_radius() {
        let mut img = RgbImage::from_pixel(300, 120, STRIP);
        draw_filled_circle_mut(&mut img, (40, 60), 14, Rgb([220, 40, 40]));
        draw_filled_circle_mut(&mut img, (100, 60), 14, Rgb([150, 150, 150]));
        draw_filled_circle_mut(&mut img, (200, 60), 40, Rgb([40, 80, 220]));

        let counts = detect_line_indicators(&img, whole(&img), &DetectionConfig::default());
        assert_eq!(
            counts,
            Outcome::Found(LineIndicatorCounts {
                available: 1,
                locked: 1,
                placed: 1,
            })
        );
    }

    #[test]
    fn empty_strip_is_nothing() {
        let img = RgbImage::from_pixel(300, 120, STRIP);
        let counts = detect_line_indicators(&img, whole(&img), &DetectionConfig::default());
        assert_eq!(counts, Outcome::Nothing);
        assert_eq!(counts.value_or_default(), LineIndicatorCounts::default());
    }

    #[test]
    fn probe_is_clipped_at_the_border() {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let corner = Circle { x: 0, y: 0, radius: 3.0, support: 0 };
        assert!((center_saturation(&img, &corner) - 1.0).abs() < 1e-6);
    }
}
