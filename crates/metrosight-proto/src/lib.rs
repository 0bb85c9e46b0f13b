//! Wire types for analysis snapshots.
//!
//! Messages are declared with `prost` derives directly so the crate builds
//! without a `protoc` toolchain. Field tags are stable; add new fields with
//! fresh tags only.

pub mod proto {
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Point {
        #[prost(int32, tag = "1")]
        pub x: i32,
        #[prost(int32, tag = "2")]
        pub y: i32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct BoundingBox {
        #[prost(uint32, tag = "1")]
        pub x: u32,
        #[prost(uint32, tag = "2")]
        pub y: u32,
        #[prost(uint32, tag = "3")]
        pub width: u32,
        #[prost(uint32, tag = "4")]
        pub height: u32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Color {
        #[prost(uint32, tag = "1")]
        pub r: u32,
        #[prost(uint32, tag = "2")]
        pub g: u32,
        #[prost(uint32, tag = "3")]
        pub b: u32,
    }

    /// Identity assigned by the frame-to-frame tracker.
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct TrackState {
        #[prost(uint64, tag = "1")]
        pub id: u64,
        #[prost(uint32, tag = "2")]
        pub age: u32,
        #[prost(bool, tag = "3")]
        pub missing: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Station {
        #[prost(message, optional, tag = "1")]
        pub track: Option<TrackState>,
        #[prost(message, optional, tag = "2")]
        pub position: Option<Point>,
        #[prost(message, optional, tag = "3")]
        pub bbox: Option<BoundingBox>,
        #[prost(string, tag = "4")]
        pub shape: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Train {
        #[prost(message, optional, tag = "1")]
        pub track: Option<TrackState>,
        #[prost(message, optional, tag = "2")]
        pub position: Option<Point>,
        #[prost(message, optional, tag = "3")]
        pub bbox: Option<BoundingBox>,
        #[prost(message, optional, tag = "4")]
        pub color: Option<Color>,
        #[prost(bool, tag = "5")]
        pub has_wagon: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LineSegment {
        #[prost(message, optional, tag = "1")]
        pub start: Option<Point>,
        #[prost(message, optional, tag = "2")]
        pub end: Option<Point>,
        #[prost(message, optional, tag = "3")]
        pub color: Option<Color>,
    }

    /// All segments sharing one quantized color.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PlacedLine {
        #[prost(message, optional, tag = "1")]
        pub color: Option<Color>,
        #[prost(message, repeated, tag = "2")]
        pub segments: Vec<LineSegment>,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct LineIndicators {
        #[prost(uint32, tag = "1")]
        pub available: u32,
        #[prost(uint32, tag = "2")]
        pub locked: u32,
        #[prost(uint32, tag = "3")]
        pub placed: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StationDemand {
        #[prost(uint32, tag = "1")]
        pub station_index: u32,
        #[prost(string, repeated, tag = "2")]
        pub demands: Vec<String>,
    }

    /// One analyzed frame. Unset optional counters mean the value was not
    /// visible, which is different from a reading of zero.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Snapshot {
        #[prost(uint32, tag = "1")]
        pub frame_number: u32,
        #[prost(uint32, optional, tag = "2")]
        pub score: Option<u32>,
        #[prost(uint32, optional, tag = "3")]
        pub available_trains: Option<u32>,
        #[prost(uint32, optional, tag = "4")]
        pub available_tunnels: Option<u32>,
        #[prost(uint32, optional, tag = "5")]
        pub available_wagons: Option<u32>,
        #[prost(message, optional, tag = "6")]
        pub line_indicators: Option<LineIndicators>,
        #[prost(message, repeated, tag = "7")]
        pub stations: Vec<Station>,
        #[prost(message, repeated, tag = "8")]
        pub placed_lines: Vec<PlacedLine>,
        #[prost(message, repeated, tag = "9")]
        pub trains: Vec<Train>,
        #[prost(message, repeated, tag = "10")]
        pub demands: Vec<StationDemand>,
    }
}
