use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::analyzer::{FrameAnalyzer, Snapshot};
use crate::capture::Frame;
use crate::config::RegionName;
use crate::ocr::DigitRecognizer;
use crate::rect::PixelRect;

/// Monospace fonts tried in order; the first readable one is used.
const FONT_PATHS: [&str; 4] = [
    "C:\\Windows\\Fonts\\consola.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/System/Library/Fonts/Menlo.ttc",
];

const TEXT_SCALE: f32 = 20.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const TEXT_LINE_HEIGHT: i32 = 22;

const REGION_COLOR: Rgb<u8> = Rgb([0, 200, 255]);
const STATION_COLOR: Rgb<u8> = Rgb([0, 220, 0]);
const TRAIN_COLOR: Rgb<u8> = Rgb([255, 140, 0]);
const MISSING_COLOR: Rgb<u8> = Rgb([160, 160, 160]);

/// Renders debug overlay images with region markers, detections and the
/// counter readings.
pub struct DebugRenderer {
    font: Option<FontVec>,
}

impl DebugRenderer {
    pub fn new() -> Self {
        let font = Self::load_font();
        Self { font }
    }

    pub fn save_frame<R: DigitRecognizer>(
        &self,
        frame: &Frame,
        analyzer: &FrameAnalyzer<R>,
        snapshot: &Snapshot,
        dir: &Path,
    ) -> Result<()> {
        let img = self.render(frame, analyzer, snapshot);
        let path = dir.join(format!("frame_{:08}.png", frame.frame_number));
        img.save(&path)
            .with_context(|| format!("failed to save debug frame to {}", path.display()))?;

        debug!(?path, "saved debug frame");
        Ok(())
    }

    pub fn render<R: DigitRecognizer>(
        &self,
        frame: &Frame,
        analyzer: &FrameAnalyzer<R>,
        snapshot: &Snapshot,
    ) -> RgbImage {
        let mut img = frame.image.clone();

        for name in RegionName::ALL {
            let rect = analyzer.region(name, frame.width(), frame.height());
            outline(&mut img, rect, REGION_COLOR);
        }

        for line in &snapshot.placed_lines {
            let color = line.color.to_rgb();
            for seg in &line.segments {
                draw_line_segment_mut(
                    &mut img,
                    (seg.start.x as f32, seg.start.y as f32),
                    (seg.end.x as f32, seg.end.y as f32),
                    color,
                );
            }
        }

        for station in &snapshot.stations {
            let color = if station.missing { MISSING_COLOR } else { STATION_COLOR };
            outline(&mut img, station.detection.bbox, color);
        }
        for train in &snapshot.trains {
            let color = if train.missing { MISSING_COLOR } else { TRAIN_COLOR };
            outline(&mut img, train.detection.bbox, color);
        }

        self.draw_text_overlay(&mut img, snapshot);
        img
    }

    fn draw_text_overlay(&self, img: &mut RgbImage, snapshot: &Snapshot) {
        let Some(font) = &self.font else { return };
        let scale = PxScale::from(TEXT_SCALE);
        let x = 10;
        let mut y = 10;

        let lines = [
            format!("F:{}", snapshot.frame_number),
            format!("SCORE:{}", snapshot.score),
            format!(
                "TRAINS:{} TUNNELS:{} WAGONS:{}",
                snapshot.available_trains, snapshot.available_tunnels, snapshot.available_wagons
            ),
            match snapshot.line_indicators.found() {
                Some(c) => format!("LINES A:{} L:{} P:{}", c.available, c.locked, c.placed),
                None => "LINES:--".to_string(),
            },
        ];
        for text in &lines {
            draw_text_mut(img, TEXT_COLOR, x, y, scale, font, text);
            y += TEXT_LINE_HEIGHT;
        }

        for station in &snapshot.stations {
            let label = format!("#{} {}", station.id, station.detection.shape);
            let bbox = station.detection.bbox;
            let ly = bbox.y as i32 + bbox.h as i32 + 2;
            draw_text_mut(img, STATION_COLOR, bbox.x as i32, ly, scale, font, &label);
        }
    }

    fn load_font() -> Option<FontVec> {
        for path in FONT_PATHS {
            let data = match std::fs::read(path) {
                Ok(data) => data,
                Err(e) => {
                    debug!(path, error = %e, "font not readable");
                    continue;
                }
            };
            match FontVec::try_from_vec(data) {
                Ok(font) => {
                    info!(path, "loaded debug font");
                    return Some(font);
                }
                Err(e) => warn!(path, error = %e, "failed to parse font file"),
            }
        }
        warn!("no debug font found, overlays will have no text");
        None
    }
}

impl Default for DebugRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn outline(img: &mut RgbImage, rect: PixelRect, color: Rgb<u8>) {
    if rect.w == 0 || rect.h == 0 {
        return;
    }
    let r = Rect::at(rect.x as i32, rect.y as i32).of_size(rect.w, rect.h);
    draw_hollow_rect_mut(img, r, color);
}
