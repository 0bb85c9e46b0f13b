//! Gradient-direction Hough transform for circles.
//!
//! Every strong edge pixel votes along its gradient, in both directions, at
//! each radius of the search band. Circle centers collect votes from the
//! whole rim and show up as accumulator peaks. Each peak is then checked
//! against the edge pixels around it: a radius is accepted only when enough
//! of its rim is present with gradients pointing at the center.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::gradients::{horizontal_scharr, vertical_scharr};
use tracing::{debug, trace};

/// Median prefilter radius, removes speckle before differentiation.
const MEDIAN_RADIUS: u32 = 2;
/// Edge pixels need at least this fraction of the strongest gradient.
const EDGE_FRACTION: f32 = 0.2;
/// Gaussian sigma for accumulator smoothing.
const ACCUM_SIGMA: f32 = 1.5;
/// Minimum |cos| between an edge gradient and the direction to the center.
const RADIAL_COS: f32 = 0.8;
/// Rim support required, as a fraction of the circumference in pixels.
const MIN_RIM_SUPPORT: f32 = 0.3;
/// Angular sectors used to measure how much of the rim is present.
const SECTORS: u32 = 36;
/// Fraction of sectors that must hold at least one rim pixel.
const MIN_COVERAGE: f32 = 0.75;

#[derive(Debug, Clone, Copy)]
pub struct CircleSearch {
    pub min_radius: u32,
    pub max_radius: u32,
    /// Two accepted circles are never closer than this (pixels).
    pub min_center_distance: f32,
    /// Accumulator peaks below this fraction of the strongest are ignored.
    pub min_vote_fraction: f32,
}

/// A detected circle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: u32,
    pub y: u32,
    pub radius: f32,
    /// Edge pixels that backed the radius estimate.
    pub support: u32,
}

struct EdgePixel {
    x: f32,
    y: f32,
    /// Unit gradient direction.
    ux: f32,
    uy: f32,
}

struct Peak {
    x: u32,
    y: u32,
    score: f32,
}

/// Find circles in `gray`, strongest first.
pub fn find_circles(gray: &GrayImage, search: &CircleSearch) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    let min_radius = search.min_radius.max(1);
    if w < 4 || h < 4 || search.max_radius < min_radius {
        return Vec::new();
    }

    let filtered = median_filter(gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
    let edges = edge_pixels(&filtered);
    if edges.is_empty() {
        return Vec::new();
    }

    let Some(accum) = accumulate(&edges, w, h, min_radius, search.max_radius) else {
        return Vec::new();
    };
    let peaks = find_peaks(&accum, search);
    debug!(edges = edges.len(), peaks = peaks.len(), "circle votes accumulated");

    let mut circles: Vec<Circle> = Vec::new();
    for peak in peaks {
        let too_close = circles.iter().any(|c| {
            let dx = c.x as f32 - peak.x as f32;
            let dy = c.y as f32 - peak.y as f32;
            (dx * dx + dy * dy).sqrt() < search.min_center_distance
        });
        if too_close {
            continue;
        }
        match fit_radius(&edges, &peak, min_radius, search.max_radius) {
            Some(circle) => circles.push(circle),
            None => trace!(x = peak.x, y = peak.y, score = peak.score, "peak without a rim"),
        }
    }
    circles
}

fn edge_pixels(gray: &GrayImage) -> Vec<EdgePixel> {
    let gx = horizontal_scharr(gray);
    let gy = vertical_scharr(gray);

    let max_mag_sq = gx
        .as_raw()
        .iter()
        .zip(gy.as_raw())
        .map(|(&a, &b)| {
            let (a, b) = (a as f32, b as f32);
            a * a + b * b
        })
        .fold(0.0f32, f32::max);
    if max_mag_sq < 1e-6 {
        return Vec::new();
    }
    let threshold_sq = max_mag_sq * EDGE_FRACTION * EDGE_FRACTION;

    let mut edges = Vec::new();
    for (x, y, p) in gx.enumerate_pixels() {
        let a = p[0] as f32;
        let b = gy.get_pixel(x, y)[0] as f32;
        let mag_sq = a * a + b * b;
        if mag_sq < threshold_sq {
            continue;
        }
        let mag = mag_sq.sqrt();
        edges.push(EdgePixel {
            x: x as f32,
            y: y as f32,
            ux: a / mag,
            uy: b / mag,
        });
    }
    edges
}

/// Deposit a unit vote with bilinear weights. Caller guarantees that
/// `x + 1` and `y + 1` are in bounds.
#[inline]
fn bilinear_vote(accum: &mut [f32], stride: usize, x: f32, y: f32) {
    let x0 = x as usize;
    let y0 = y as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let base = y0 * stride + x0;
    accum[base] += (1.0 - fx) * (1.0 - fy);
    accum[base + 1] += fx * (1.0 - fy);
    accum[base + stride] += (1.0 - fx) * fy;
    accum[base + stride + 1] += fx * fy;
}

fn accumulate(
    edges: &[EdgePixel],
    w: u32,
    h: u32,
    min_radius: u32,
    max_radius: u32,
) -> Option<ImageBuffer<Luma<f32>, Vec<f32>>> {
    let stride = w as usize;
    let mut accum = vec![0.0f32; stride * h as usize];
    let x_limit = (w - 1) as f32;
    let y_limit = (h - 1) as f32;

    for e in edges {
        for r in min_radius..=max_radius {
            let r = r as f32;
            for sign in [1.0f32, -1.0] {
                let vx = e.x + sign * e.ux * r;
                let vy = e.y + sign * e.uy * r;
                if vx >= 0.0 && vx < x_limit && vy >= 0.0 && vy < y_limit {
                    bilinear_vote(&mut accum, stride, vx, vy);
                }
            }
        }
    }

    let raw = ImageBuffer::from_raw(w, h, accum)?;
    Some(gaussian_blur_f32(&raw, ACCUM_SIGMA))
}

/// Local maxima above the vote threshold, strongest first. Suppression
/// uses the minimum center distance as its radius.
fn find_peaks(accum: &ImageBuffer<Luma<f32>, Vec<f32>>, search: &CircleSearch) -> Vec<Peak> {
    let (w, h) = accum.dimensions();
    let data = accum.as_raw();
    let max_val = data.iter().copied().fold(0.0f32, f32::max);
    if max_val < 1e-6 {
        return Vec::new();
    }
    let threshold = search.min_vote_fraction * max_val;
    let nms = search.min_center_distance.max(1.0);
    let nms_r = nms.ceil() as i64;
    let nms_sq = nms * nms;
    let stride = w as usize;

    let mut peaks = Vec::new();
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let idx = y as usize * stride + x as usize;
            let val = data[idx];
            if val < threshold {
                continue;
            }
            let mut is_max = true;
            'scan: for dy in -nms_r..=nms_r {
                let ny = y + dy;
                if ny < 0 || ny >= h as i64 {
                    continue;
                }
                for dx in -nms_r..=nms_r {
                    let nx = x + dx;
                    if (dx == 0 && dy == 0) || nx < 0 || nx >= w as i64 {
                        continue;
                    }
                    if (dx * dx + dy * dy) as f32 > nms_sq {
                        continue;
                    }
                    let nidx = ny as usize * stride + nx as usize;
                    if data[nidx] > val || (data[nidx] == val && nidx < idx) {
                        is_max = false;
                        break 'scan;
                    }
                }
            }
            if is_max {
                peaks.push(Peak {
                    x: x as u32,
                    y: y as u32,
                    score: val,
                });
            }
        }
    }
    peaks.sort_by(|a, b| b.score.total_cmp(&a.score));
    peaks
}

/// Pick the radius whose rim is best covered by radially oriented edges.
/// Coverage is counted in angular sectors so that straight edges, which
/// only line up with a circle near their midpoints, fall short.
fn fit_radius(edges: &[EdgePixel], peak: &Peak, min_radius: u32, max_radius: u32) -> Option<Circle> {
    let cx = peak.x as f32;
    let cy = peak.y as f32;
    let reach = max_radius as f32 + 1.5;
    let n = max_radius as usize + 2;
    let mut counts = vec![0u32; n];
    let mut sectors = vec![0u64; n];

    for e in edges {
        let dx = e.x - cx;
        let dy = e.y - cy;
        let d = (dx * dx + dy * dy).sqrt();
        if !(1.0..=reach).contains(&d) {
            continue;
        }
        let cos = (e.ux * dx + e.uy * dy) / d;
        if cos.abs() < RADIAL_COS {
            continue;
        }
        let bin = d.round() as usize;
        if bin >= n {
            continue;
        }
        let angle = dy.atan2(dx) + std::f32::consts::PI;
        let sector = (angle / std::f32::consts::TAU * SECTORS as f32) as u32 % SECTORS;
        counts[bin] += 1;
        sectors[bin] |= 1u64 << sector;
    }

    // Rim of radius r: bins r-1..=r+1, which covers the edge band on both
    // sides of the boundary.
    let rim = |r: usize| -> (u32, u32) {
        let span = r - 1..=(r + 1).min(n - 1);
        let support: u32 = counts[span.clone()].iter().sum();
        let mask = sectors[span].iter().fold(0u64, |m, s| m | s);
        (mask.count_ones(), support)
    };
    let best = (min_radius as usize..=max_radius as usize)
        .max_by_key(|&r| (rim(r), std::cmp::Reverse(r)))?;
    let (covered, support) = rim(best);

    let coverage = covered as f32 / SECTORS as f32;
    let needed = MIN_RIM_SUPPORT * std::f32::consts::TAU * best as f32;
    if coverage < MIN_COVERAGE || (support as f32) < needed {
        trace!(radius = best, coverage, support, "rim rejected");
        return None;
    }

    let lo = best - 1;
    let hi = (best + 1).min(n - 1);
    let weighted: f32 = (lo..=hi).map(|r| r as f32 * counts[r] as f32).sum();
    Some(Circle {
        x: peak.x,
        y: peak.y,
        radius: weighted / support as f32,
        support,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn search(min_radius: u32, max_radius: u32) -> CircleSearch {
        CircleSearch {
            min_radius,
            max_radius,
            min_center_distance: 20.0,
            min_vote_fraction: 0.15,
        }
    }

    #[test]
    fn finds_single_disk() {
        let mut img = GrayImage::from_pixel(120, 100, Luma([240]));
        draw_filled_circle_mut(&mut img, (60, 50), 20, Luma([40]));
        let circles = find_circles(&img, &search(8, 40));
        assert_eq!(circles.len(), 1, "{circles:?}");
        let c = circles[0];
        assert!(c.x.abs_diff(60) <= 2 && c.y.abs_diff(50) <= 2, "{c:?}");
        assert!((c.radius - 20.5).abs() < 2.0, "{c:?}");
    }

    #[test]
    fn finds_disks_of_different_sizes() {
        let mut img = GrayImage::from_pixel(300, 120, Luma([240]));
        draw_filled_circle_mut(&mut img, (50, 60), 14, Luma([60]));
        draw_filled_circle_mut(&mut img, (200, 60), 40, Luma([60]));
        let mut circles = find_circles(&img, &search(9, 45));
        circles.sort_by_key(|c| c.x);
        assert_eq!(circles.len(), 2, "{circles:?}");
        assert!(circles[0].radius < 20.0);
        assert!(circles[1].radius > 35.0);
    }

    #[test]
    fn square_is_not_a_circle() {
        let mut img = GrayImage::from_pixel(120, 100, Luma([240]));
        draw_filled_rect_mut(&mut img, Rect::at(30, 20).of_size(60, 60), Luma([40]));
        assert!(find_circles(&img, &search(8, 40)).is_empty());
    }

    #[test]
    fn flat_image_has_no_circles() {
        let img = GrayImage::from_pixel(80, 80, Luma([128]));
        assert!(find_circles(&img, &search(5, 20)).is_empty());
    }
}
