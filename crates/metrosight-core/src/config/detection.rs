//! Every heuristic constant the detectors use, in one place.

use crate::analysis::common::Hsv;

/// Hue/saturation/value window used to pick vehicle pixels.
/// H in degrees, S and V in [0.0, 1.0]; all bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueBand {
    pub hue_min: f32,
    pub hue_max: f32,
    pub min_saturation: f32,
    pub min_value: f32,
}

impl HueBand {
    pub fn contains(&self, hsv: Hsv) -> bool {
        hsv.h >= self.hue_min
            && hsv.h <= self.hue_max
            && hsv.s >= self.min_saturation
            && hsv.v >= self.min_value
    }
}

/// Vehicle colors: yellow, red, blue, orange.
const TRAIN_MIN_SATURATION: f32 = 100.0 / 255.0;
const TRAIN_MIN_VALUE: f32 = 100.0 / 255.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub polygon_tolerance: f64,

    /// Gray level at or below which a map pixel counts as station ink.
    pub station_gray_cutoff: u8,
    pub min_station_area: f64,
    pub max_station_area: f64,
    /// Both bounding box sides must be at least this long (pixels).
    pub min_station_side: u32,

    /// Gray level above which a counter pixel counts as a digit.
    pub digit_bright_cutoff: u8,

    /// Circle radius search band, as fractions of the indicator region width.
    pub indicator_min_radius: f64,
    pub indicator_max_radius: f64,
    /// Circles at least this large (fraction of region width) are placed lines.
    pub indicator_placed_radius: f64,
    /// Mean saturation below this marks a locked line slot.
    pub indicator_locked_saturation: f32,
    /// Minimum distance between two circle centers (pixels).
    pub indicator_min_center_distance: f32,
    /// Accumulator peaks below this fraction of the strongest peak are ignored.
    pub indicator_min_vote_fraction: f32,

    /// Line thickness band, as fractions of the map width.
    pub min_line_width: f64,
    pub max_line_width: f64,
    /// Anything thicker than this fraction of the map width is river, not line.
    pub river_width: f64,
    /// Odd neighborhood size of the local threshold.
    pub line_threshold_block: u32,
    /// Pixels must be this much darker than their neighborhood to count.
    pub line_threshold_offset: i16,
    /// Color channels are rounded to the nearest multiple of this.
    pub color_quantization_step: u16,

    pub train_hue_bands: Vec<HueBand>,
    pub min_train_area: f64,
    pub max_train_area: f64,
    pub min_train_aspect: f64,
    pub max_train_aspect: f64,
    /// Trains longer than this aspect ratio are pulling a wagon.
    pub wagon_aspect_cutoff: f64,

    /// Demand window half-extent as a fraction of the station box.
    pub demand_window_fraction: f64,
    pub min_demand_area: f64,
    pub max_demand_area: f64,

    /// Detections farther than this from a tracked object never match it.
    pub tracker_match_distance: f64,
    /// Unmatched objects older than this get one grace frame.
    pub tracker_grace_age: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            polygon_tolerance: 0.04,

            station_gray_cutoff: 100,
            min_station_area: 50.0,
            max_station_area: 5000.0,
            min_station_side: 20,

            digit_bright_cutoff: 150,

            indicator_min_radius: 0.03,
            indicator_max_radius: 0.15,
            indicator_placed_radius: 0.12,
            indicator_locked_saturation: 50.0 / 255.0,
            indicator_min_center_distance: 20.0,
            indicator_min_vote_fraction: 0.15,

            min_line_width: 0.005,
            max_line_width: 0.015,
            river_width: 0.03,
            line_threshold_block: 11,
            line_threshold_offset: 2,
            color_quantization_step: 20,

            train_hue_bands: vec![
                HueBand {
                    hue_min: 40.0,
                    hue_max: 70.0,
                    min_saturation: TRAIN_MIN_SATURATION,
                    min_value: TRAIN_MIN_VALUE,
                },
                HueBand {
                    hue_min: 0.0,
                    hue_max: 20.0,
                    min_saturation: TRAIN_MIN_SATURATION,
                    min_value: TRAIN_MIN_VALUE,
                },
                HueBand {
                    hue_min: 200.0,
                    hue_max: 260.0,
                    min_saturation: TRAIN_MIN_SATURATION,
                    min_value: TRAIN_MIN_VALUE,
                },
                HueBand {
                    hue_min: 20.0,
                    hue_max: 40.0,
                    min_saturation: TRAIN_MIN_SATURATION,
                    min_value: TRAIN_MIN_VALUE,
                },
            ],
            min_train_area: 100.0,
            max_train_area: 2000.0,
            min_train_aspect: 1.5,
            max_train_aspect: 3.0,
            wagon_aspect_cutoff: 2.2,

            demand_window_fraction: 0.1,
            min_demand_area: 5.0,
            max_demand_area: 100.0,

            tracker_match_distance: 30.0,
            tracker_grace_age: 2,
        }
    }
}
