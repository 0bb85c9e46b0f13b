use image::RgbImage;
use serde::{Deserialize, Serialize};

/// A rectangle defined in normalized coordinates (0.0 to 1.0),
/// independent of the actual frame resolution.
///
/// Values outside [0, 1] are accepted; they resolve to pixel rectangles that
/// fall partly or wholly outside the frame and are clamped at crop time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A rectangle in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl NormalizedRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Resolve against a frame size. Each axis is multiplied and floored
    /// independently. Overhang past the left or top edge is cut off, so the
    /// result starts at 0 and is that much narrower.
    pub fn to_pixel_rect(self, frame_width: u32, frame_height: u32) -> PixelRect {
        let (x, w) = resolve_axis(self.x, self.w, frame_width);
        let (y, h) = resolve_axis(self.y, self.h, frame_height);
        PixelRect { x, y, w, h }
    }
}

fn resolve_axis(start: f64, len: f64, size: u32) -> (u32, u32) {
    let size = size as f64;
    let start = (start * size).floor() as i64;
    let len = ((len * size).floor() as i64).max(0);
    if start < 0 {
        (0, (len + start).clamp(0, u32::MAX as i64) as u32)
    } else {
        (
            start.min(u32::MAX as i64) as u32,
            len.min(u32::MAX as i64) as u32,
        )
    }
}

impl From<[f64; 4]> for NormalizedRect {
    fn from([x, y, w, h]: [f64; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<NormalizedRect> for [f64; 4] {
    fn from(r: NormalizedRect) -> Self {
        [r.x, r.y, r.w, r.h]
    }
}

impl PixelRect {
    /// Intersect with a `width` x `height` image. Returns `None` when nothing
    /// of the rectangle remains inside the image.
    pub fn clamp_to(self, width: u32, height: u32) -> Option<PixelRect> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.w.min(width - self.x);
        let h = self.h.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(PixelRect {
            x: self.x,
            y: self.y,
            w,
            h,
        })
    }

    /// Center with integer division, matching how detections report positions.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Width over height; 0.0 for a degenerate rect.
    pub fn aspect_ratio(&self) -> f64 {
        if self.h == 0 {
            0.0
        } else {
            self.w as f64 / self.h as f64
        }
    }

    /// Shift by an origin, used to turn ROI-relative rects into frame coordinates.
    pub fn offset(self, dx: u32, dy: u32) -> PixelRect {
        PixelRect {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Copy out the part of `rect` that lies inside `image`.
/// Returns `None` for an empty intersection.
pub fn crop(image: &RgbImage, rect: PixelRect) -> Option<(RgbImage, PixelRect)> {
    let clamped = rect.clamp_to(image.width(), image.height())?;
    let roi = image::imageops::crop_imm(image, clamped.x, clamped.y, clamped.w, clamped.h)
        .to_image();
    Some((roi, clamped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_to_pixel() {
        let n = NormalizedRect::new(0.5, 0.25, 0.1, 0.05);
        let p = n.to_pixel_rect(1920, 1080);
        assert_eq!(p.x, 960);
        assert_eq!(p.y, 270);
        assert_eq!(p.w, 192);
        assert_eq!(p.h, 54);
    }

    #[test]
    fn normalized_to_pixel_truncates_each_axis() {
        let cases = [
            (NormalizedRect::new(0.838, 0.062, 0.045, 0.03), 1366, 768),
            (NormalizedRect::new(0.01, 0.105, 0.98, 0.8), 801, 599),
            (NormalizedRect::new(0.333, 0.333, 0.333, 0.333), 100, 100),
        ];
        for (r, w, h) in cases {
            let p = r.to_pixel_rect(w, h);
            assert_eq!(p.x, (r.x * w as f64).floor() as u32);
            assert_eq!(p.y, (r.y * h as f64).floor() as u32);
            assert_eq!(p.w, (r.w * w as f64).floor() as u32);
            assert_eq!(p.h, (r.h * h as f64).floor() as u32);
        }
    }

    #[test]
    fn out_of_range_fraction_is_not_rejected() {
        let p = NormalizedRect::new(0.9, 0.9, 0.5, 0.5).to_pixel_rect(100, 100);
        assert_eq!(p, PixelRect { x: 90, y: 90, w: 50, h: 50 });
        assert_eq!(
            p.clamp_to(100, 100),
            Some(PixelRect { x: 90, y: 90, w: 10, h: 10 })
        );
    }

    #[test]
    fn negative_origin_is_cut_at_the_frame_edge() {
        let p = NormalizedRect::new(-0.1, 0.0, 0.5, 0.5).to_pixel_rect(100, 100);
        assert_eq!(p, PixelRect { x: 0, y: 0, w: 40, h: 50 });
        assert_eq!(p.clamp_to(100, 100), Some(p));

        let p = NormalizedRect::new(0.2, -0.25, 0.3, 0.5).to_pixel_rect(100, 200);
        assert_eq!(p, PixelRect { x: 20, y: 0, w: 30, h: 50 });

        let gone = NormalizedRect::new(-0.6, 0.0, 0.5, 0.5).to_pixel_rect(100, 100);
        assert_eq!(gone.w, 0);
        assert_eq!(gone.clamp_to(100, 100), None);
    }

    #[test]
    fn clamp_rejects_rect_outside_image() {
        let r = PixelRect { x: 120, y: 0, w: 10, h: 10 };
        assert_eq!(r.clamp_to(100, 100), None);
        let zero = PixelRect { x: 0, y: 0, w: 0, h: 10 };
        assert_eq!(zero.clamp_to(100, 100), None);
    }

    #[test]
    fn crop_copies_clamped_region() {
        let img = RgbImage::from_fn(100, 200, |x, y| image::Rgb([x as u8, y as u8, 0]));
        let (roi, rect) = crop(&img, PixelRect { x: 10, y: 50, w: 500, h: 20 }).unwrap();
        assert_eq!(rect, PixelRect { x: 10, y: 50, w: 90, h: 20 });
        assert_eq!(roi.dimensions(), (90, 20));
        assert_eq!(roi.get_pixel(0, 0).0, [10, 50, 0]);
    }

    #[test]
    fn deserializes_from_four_element_array() {
        let r: NormalizedRect = serde_json::from_str("[0.1, 0.2, 0.3, 0.4]").unwrap();
        assert_eq!(r, NormalizedRect::new(0.1, 0.2, 0.3, 0.4));
        assert!(serde_json::from_str::<NormalizedRect>("[0.1, 0.2, 0.3]").is_err());
    }
}
