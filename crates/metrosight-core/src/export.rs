//! Conversion of snapshots into their protobuf form.

use image::Rgb;
use imageproc::point::Point;

use metrosight_proto::proto;

use crate::analysis::{LineIndicatorCounts, Outcome, PlacedLine, Station, StationDemand, Train};
use crate::analyzer::Snapshot;
use crate::rect::PixelRect;
use crate::tracking::TrackedObject;

impl From<&Snapshot> for proto::Snapshot {
    fn from(s: &Snapshot) -> Self {
        proto::Snapshot {
            frame_number: s.frame_number,
            score: s.score.found().copied(),
            available_trains: s.available_trains.found().copied(),
            available_tunnels: s.available_tunnels.found().copied(),
            available_wagons: s.available_wagons.found().copied(),
            line_indicators: match s.line_indicators {
                Outcome::Found(counts) => Some(line_indicators(counts)),
                Outcome::Nothing => None,
            },
            stations: s.stations.iter().map(station).collect(),
            placed_lines: s.placed_lines.iter().map(placed_line).collect(),
            trains: s.trains.iter().map(train).collect(),
            demands: s.demands.iter().map(demand).collect(),
        }
    }
}

fn track<D>(t: &TrackedObject<D>) -> proto::TrackState {
    proto::TrackState {
        id: t.id,
        age: t.age,
        missing: t.missing,
    }
}

fn center(c: (u32, u32)) -> proto::Point {
    proto::Point {
        x: c.0 as i32,
        y: c.1 as i32,
    }
}

fn point(p: Point<i32>) -> proto::Point {
    proto::Point { x: p.x, y: p.y }
}

fn bbox(r: PixelRect) -> proto::BoundingBox {
    proto::BoundingBox {
        x: r.x,
        y: r.y,
        width: r.w,
        height: r.h,
    }
}

fn color(c: Rgb<u8>) -> proto::Color {
    proto::Color {
        r: c[0] as u32,
        g: c[1] as u32,
        b: c[2] as u32,
    }
}

fn station(t: &TrackedObject<Station>) -> proto::Station {
    proto::Station {
        track: Some(track(t)),
        position: Some(center(t.detection.center)),
        bbox: Some(bbox(t.detection.bbox)),
        shape: t.detection.shape.to_string(),
    }
}

fn train(t: &TrackedObject<Train>) -> proto::Train {
    proto::Train {
        track: Some(track(t)),
        position: Some(center(t.detection.center)),
        bbox: Some(bbox(t.detection.bbox)),
        color: Some(color(t.detection.color)),
        has_wagon: t.detection.has_wagon,
    }
}

fn placed_line(line: &PlacedLine) -> proto::PlacedLine {
    // Buckets can round past 255; keep the raw bucket on the wire.
    let [r, g, b] = line.color.0;
    let bucket = proto::Color {
        r: r as u32,
        g: g as u32,
        b: b as u32,
    };
    proto::PlacedLine {
        color: Some(bucket),
        segments: line
            .segments
            .iter()
            .map(|seg| proto::LineSegment {
                start: Some(point(seg.start)),
                end: Some(point(seg.end)),
                color: Some(bucket),
            })
            .collect(),
    }
}

fn line_indicators(c: LineIndicatorCounts) -> proto::LineIndicators {
    proto::LineIndicators {
        available: c.available,
        locked: c.locked,
        placed: c.placed,
    }
}

fn demand(d: &StationDemand) -> proto::StationDemand {
    proto::StationDemand {
        station_index: d.station_index as u32,
        demands: d.demands.iter().map(|s| s.to_string()).collect(),
    }
}
