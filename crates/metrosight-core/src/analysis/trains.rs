use image::{GrayImage, Luma, RgbImage};
use tracing::{debug, trace};

use crate::analysis::common::{external_blobs, mean_color_under, rgb_to_hsv, round_color};
use crate::analysis::Train;
use crate::config::{DetectionConfig, HueBand};
use crate::rect::{crop, PixelRect};

/// Find vehicles on the map by their saturated line colors.
pub fn detect_trains(frame: &RgbImage, map: PixelRect, config: &DetectionConfig) -> Vec<Train> {
    let Some((roi, origin)) = crop(frame, map) else {
        debug!(?map, "map region outside frame");
        return Vec::new();
    };
    let mask = hue_mask(&roi, &config.train_hue_bands);

    let mut trains = Vec::new();
    for blob in external_blobs(&mask) {
        if blob.area < config.min_train_area || blob.area > config.max_train_area {
            continue;
        }
        let aspect_ratio = blob.bbox.aspect_ratio();
        if aspect_ratio < config.min_train_aspect || aspect_ratio > config.max_train_aspect {
            trace!(aspect_ratio, bbox = ?blob.bbox, "train candidate rejected by aspect");
            continue;
        }
        let Some(mean) = mean_color_under(&roi, &blob) else {
            continue;
        };
        let bbox = blob.bbox.offset(origin.x, origin.y);
        trains.push(Train {
            center: bbox.center(),
            bbox,
            color: round_color(mean),
            aspect_ratio,
            has_wagon: aspect_ratio > config.wagon_aspect_cutoff,
        });
    }

    debug!(count = trains.len(), "trains detected");
    trains
}

/// Union of the hue bands as a binary mask.
fn hue_mask(roi: &RgbImage, bands: &[HueBand]) -> GrayImage {
    GrayImage::from_fn(roi.width(), roi.height(), |x, y| {
        let hsv = rgb_to_hsv(*roi.get_pixel(x, y));
        let hit = bands.iter().any(|band| band.contains(hsv));
        Luma([if hit { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn map_with(vehicles: &[(i32, i32, u32, u32, [u8; 3])]) -> RgbImage {
        let mut img = RgbImage::from_pixel(300, 200, Rgb([240, 238, 230]));
        for &(x, y, w, h, color) in vehicles {
            draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), Rgb(color));
        }
        img
    }

    fn whole(img: &RgbImage) -> PixelRect {
        PixelRect { x: 0, y: 0, w: img.width(), h: img.height() }
    }

    #[test]
    fn wagon_flag_follows_elongation() {
        let img = map_with(&[
            (20, 20, 30, 12, [240, 200, 20]),
            (120, 20, 24, 12, [220, 30, 30]),
        ]);
        let mut trains = detect_trains(&img, whole(&img), &DetectionConfig::default());
        trains.sort_by_key(|t| t.center.0);
        assert_eq!(trains.len(), 2, "{trains:?}");

        assert!(trains[0].has_wagon);
        assert_eq!(trains[0].bbox, PixelRect { x: 20, y: 20, w: 30, h: 12 });
        assert_eq!(trains[0].center, (35, 26));
        assert_eq!(trains[0].color, Rgb([240, 200, 20]));

        assert!(!trains[1].has_wagon);
        assert!((trains[1].aspect_ratio - 2.0).abs() < 1e-9);
        assert_eq!(trains[1].color, Rgb([220, 30, 30]));
    }

    #[test]
    fn rejects_wrong_shape_and_color() {
        let img = map_with(&[
            // Square blue block: aspect 1.
            (20, 20, 20, 20, [30, 60, 220]),
            // Green is not a vehicle color.
            (100, 20, 30, 12, [30, 180, 60]),
            // Yellow but tiny.
            (200, 20, 6, 3, [240, 200, 20]),
            // Orange but standing upright.
            (250, 100, 12, 30, [240, 130, 20]),
        ]);
        assert!(detect_trains(&img, whole(&img), &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn positions_are_frame_absolute() {
        let img = map_with(&[(220, 150, 30, 12, [30, 60, 220])]);
        let map = PixelRect { x: 200, y: 100, w: 100, h: 100 };
        let trains = detect_trains(&img, map, &DetectionConfig::default());
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].bbox, PixelRect { x: 220, y: 150, w: 30, h: 12 });
    }
}
