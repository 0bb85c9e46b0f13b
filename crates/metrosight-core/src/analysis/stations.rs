use image::RgbImage;
use tracing::debug;

use crate::analysis::common::{binarize, external_blobs, Polarity};
use crate::analysis::shape::{classify_blob, ShapeContext};
use crate::analysis::Station;
use crate::config::DetectionConfig;
use crate::rect::{crop, PixelRect};

/// Find station glyphs in the map region.
///
/// Stations are drawn as dark outlines or solids on the light map. Any
/// outer contour of the dark mask within the area band, with both box
/// sides long enough, becomes a station. Order follows contour discovery.
pub fn detect_stations(frame: &RgbImage, map: PixelRect, config: &DetectionConfig) -> Vec<Station> {
    let Some((roi, origin)) = crop(frame, map) else {
        debug!(?map, "map region outside frame");
        return Vec::new();
    };
    let gray = image::imageops::grayscale(&roi);
    let mask = binarize(&gray, config.station_gray_cutoff, Polarity::Dark);

    let stations: Vec<Station> = external_blobs(&mask)
        .into_iter()
        .filter(|blob| {
            blob.area >= config.min_station_area
                && blob.area <= config.max_station_area
                && blob.bbox.w >= config.min_station_side
                && blob.bbox.h >= config.min_station_side
        })
        .map(|blob| {
            let bbox = blob.bbox.offset(origin.x, origin.y);
            let shape = classify_blob(&blob, config.polygon_tolerance, ShapeContext::Station);
            Station {
                center: bbox.center(),
                bbox,
                shape,
            }
        })
        .collect();

    debug!(count = stations.len(), "stations detected");
    stations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Shape;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    const BACKGROUND: Rgb<u8> = Rgb([240, 238, 230]);
    const INK: Rgb<u8> = Rgb([40, 40, 40]);

    fn whole(img: &RgbImage) -> PixelRect {
        PixelRect { x: 0, y: 0, w: img.width(), h: img.height() }
    }

    #[test]
    fn detects_and_classifies_stations() {
        let mut img = RgbImage::from_pixel(400, 200, BACKGROUND);
        draw_filled_circle_mut(&mut img, (60, 100), 20, INK);
        draw_filled_rect_mut(&mut img, Rect::at(150, 80).of_size(36, 36), INK);
        let tri = [Point::new(300, 70), Point::new(270, 125), Point::new(330, 125)];
        draw_polygon_mut(&mut img, &tri, INK);

        let mut stations = detect_stations(&img, whole(&img), &DetectionConfig::default());
        stations.sort_by_key(|s| s.center.0);
        let shapes: Vec<Shape> = stations.iter().map(|s| s.shape).collect();
        assert_eq!(shapes, vec![Shape::Circle, Shape::Square, Shape::Triangle]);
        assert_eq!(stations[1].bbox, PixelRect { x: 150, y: 80, w: 36, h: 36 });
        assert_eq!(stations[1].center, (168, 98));
    }

    #[test]
    fn rejects_noise_and_oversized_regions() {
        let mut img = RgbImage::from_pixel(400, 300, BACKGROUND);
        // Too small.
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(5, 5), INK);
        // Enough area but too thin.
        draw_filled_rect_mut(&mut img, Rect::at(50, 10).of_size(60, 10), INK);
        // River-sized.
        draw_filled_rect_mut(&mut img, Rect::at(0, 150).of_size(400, 60), INK);
        assert!(detect_stations(&img, whole(&img), &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn positions_are_frame_absolute() {
        let mut img = RgbImage::from_pixel(400, 300, BACKGROUND);
        draw_filled_rect_mut(&mut img, Rect::at(250, 200).of_size(30, 30), INK);
        let map = PixelRect { x: 200, y: 100, w: 200, h: 200 };
        let stations = detect_stations(&img, map, &DetectionConfig::default());
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].bbox, PixelRect { x: 250, y: 200, w: 30, h: 30 });
        assert_eq!(stations[0].center, (265, 215));
    }

    #[test]
    fn empty_map_region_yields_nothing() {
        let img = RgbImage::from_pixel(100, 100, BACKGROUND);
        let map = PixelRect { x: 100, y: 0, w: 50, h: 50 };
        assert!(detect_stations(&img, map, &DetectionConfig::default()).is_empty());
    }
}
