use image::RgbImage;
use tracing::{debug, trace};

use crate::analysis::common::{binarize, external_blobs, Polarity};
use crate::analysis::shape::{classify_blob, ShapeContext};
use crate::analysis::{Station, StationDemand};
use crate::config::DetectionConfig;
use crate::rect::{crop, PixelRect};

/// Read the passenger icons next to each station.
///
/// The window straddles the station's top-right corner and is
/// `2 * demand_window_fraction` of the station box on each axis. Stations
/// whose window falls outside the frame or rounds to nothing are left out,
/// so `station_index` refers back into `stations`.
pub fn detect_demands<'a, I>(frame: &RgbImage, stations: I, config: &DetectionConfig) -> Vec<StationDemand>
where
    I: IntoIterator<Item = &'a Station>,
{
    let mut demands = Vec::new();
    for (station_index, station) in stations.into_iter().enumerate() {
        let window = demand_window(station.bbox, config.demand_window_fraction);
        let Some((roi, _)) = crop(frame, window) else {
            trace!(station_index, ?window, "demand window empty");
            continue;
        };
        let gray = image::imageops::grayscale(&roi);
        let mask = binarize(&gray, config.station_gray_cutoff, Polarity::Dark);

        let shapes = external_blobs(&mask)
            .into_iter()
            .filter(|blob| blob.area >= config.min_demand_area && blob.area <= config.max_demand_area)
            .map(|blob| classify_blob(&blob, config.polygon_tolerance, ShapeContext::DemandIcon))
            .collect();
        demands.push(StationDemand {
            station_index,
            demands: shapes,
        });
    }
    debug!(stations = demands.len(), "station demands read");
    demands
}

/// Window anchored at the station box's top-right corner, clamped at the
/// top edge.
pub fn demand_window(bbox: PixelRect, fraction: f64) -> PixelRect {
    let dx = (fraction * bbox.w as f64) as u32;
    let dy = (fraction * bbox.h as f64) as u32;
    PixelRect {
        x: (bbox.x + bbox.w).saturating_sub(dx),
        y: bbox.y.saturating_sub(dy),
        w: dx * 2,
        h: dy * 2,
    }
}
