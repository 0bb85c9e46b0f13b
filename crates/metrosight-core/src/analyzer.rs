use tracing::{debug, info};

use crate::analysis::demands::detect_demands;
use crate::analysis::line_indicators::detect_line_indicators;
use crate::analysis::numeric::read_number;
use crate::analysis::placed_lines::detect_placed_lines;
use crate::analysis::stations::detect_stations;
use crate::analysis::trains::detect_trains;
use crate::analysis::{LineIndicatorCounts, Outcome, PlacedLine, Station, StationDemand, Train};
use crate::capture::Frame;
use crate::config::{AnalyzerConfig, RegionName};
use crate::ocr::DigitRecognizer;
use crate::rect::PixelRect;
use crate::tracking::{TrackedObject, Tracker};

/// Everything read from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub frame_number: u32,
    pub score: Outcome<u32>,
    pub available_trains: Outcome<u32>,
    pub available_tunnels: Outcome<u32>,
    pub available_wagons: Outcome<u32>,
    pub line_indicators: Outcome<LineIndicatorCounts>,
    pub stations: Vec<TrackedObject<Station>>,
    pub placed_lines: Vec<PlacedLine>,
    pub trains: Vec<TrackedObject<Train>>,
    /// Indexed by position in `stations`.
    pub demands: Vec<StationDemand>,
}

/// Runs every detector over a frame and tracks stations and trains across
/// calls. Use one analyzer per game session.
pub struct FrameAnalyzer<R> {
    config: AnalyzerConfig,
    recognizer: R,
    tracker: Tracker,
}

impl<R: DigitRecognizer> FrameAnalyzer<R> {
    pub fn new(config: AnalyzerConfig, recognizer: R) -> Self {
        let tracker = Tracker::new(&config.detection);
        Self {
            config,
            recognizer,
            tracker,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Pixel bounds of a named region for a frame of this size.
    pub fn region(&self, name: RegionName, width: u32, height: u32) -> PixelRect {
        self.config.regions.resolve(name).to_pixel_rect(width, height)
    }

    pub fn analyze(&mut self, frame: &Frame) -> Snapshot {
        let (w, h) = (frame.width(), frame.height());
        let image = &frame.image;
        let detection = &self.config.detection;

        let read = |name: RegionName| {
            read_number(
                image,
                self.region(name, w, h),
                detection.digit_bright_cutoff,
                &self.recognizer,
            )
        };
        let score = read(RegionName::Score);
        let available_trains = read(RegionName::TrainCount);
        let available_tunnels = read(RegionName::TunnelCount);
        let available_wagons = read(RegionName::WagonCount);

        let line_indicators =
            detect_line_indicators(image, self.region(RegionName::LineIndicator, w, h), detection);

        let map = self.region(RegionName::Map, w, h);
        let stations = detect_stations(image, map, detection);
        let placed_lines = detect_placed_lines(image, map, detection);
        let trains = detect_trains(image, map, detection);

        let stations = self.tracker.stations.update(stations);
        let trains = self.tracker.trains.update(trains);
        let demands = detect_demands(image, stations.iter().map(|s| &s.detection), detection);

        debug!(
            frame_number = frame.frame_number,
            %score,
            %available_trains,
            %available_tunnels,
            %available_wagons,
            "counters read"
        );
        info!(
            frame_number = frame.frame_number,
            stations = stations.len(),
            lines = placed_lines.len(),
            trains = trains.len(),
            "frame analyzed"
        );

        Snapshot {
            frame_number: frame.frame_number,
            score,
            available_trains,
            available_tunnels,
            available_wagons,
            line_indicators,
            stations,
            placed_lines,
            trains,
            demands,
        }
    }
}
