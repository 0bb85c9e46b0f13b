//! Screen-reading for Mini Metro: turns screenshots into structured game
//! state snapshots.

pub mod analysis;
pub mod analyzer;
pub mod capture;
pub mod config;
pub mod debug;
pub mod export;
pub mod history;
pub mod ocr;
pub mod pipeline;
pub mod rect;
pub mod tracking;
