//! Frame-to-frame identity for stations and trains.
//!
//! Matching is greedy: previous objects are visited in stored order and
//! each takes the nearest detection nobody has claimed yet. Two objects
//! crossing within the match radius can swap ids; see
//! `greedy_assignment_is_not_optimal`.

use tracing::{debug, trace};

use crate::analysis::{Station, Train};
use crate::config::DetectionConfig;

/// Anything with a position in frame pixels.
pub trait Positioned {
    fn position(&self) -> (f64, f64);
}

impl Positioned for Station {
    fn position(&self) -> (f64, f64) {
        (self.center.0 as f64, self.center.1 as f64)
    }
}

impl Positioned for Train {
    fn position(&self) -> (f64, f64) {
        (self.center.0 as f64, self.center.1 as f64)
    }
}

/// A detection with an identity that persists across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject<D> {
    /// Unique within its tracker, never reissued.
    pub id: u64,
    /// Frames matched since first seen, starting at 1.
    pub age: u32,
    /// Unmatched this frame, carried for one grace frame.
    pub missing: bool,
    pub detection: D,
}

/// Identity state for one category of object.
#[derive(Debug, Clone)]
pub struct ObjectTracker<D> {
    category: &'static str,
    previous: Vec<TrackedObject<D>>,
    next_id: u64,
    match_distance: f64,
    grace_age: u32,
}

impl<D: Positioned + Clone> ObjectTracker<D> {
    pub fn new(category: &'static str, match_distance: f64, grace_age: u32) -> Self {
        Self {
            category,
            previous: Vec::new(),
            next_id: 0,
            match_distance,
            grace_age,
        }
    }

    /// Objects carried into the next update. Missing objects are not kept.
    pub fn tracked(&self) -> &[TrackedObject<D>] {
        &self.previous
    }

    /// Associate this frame's detections with the tracked objects.
    pub fn update(&mut self, detections: Vec<D>) -> Vec<TrackedObject<D>> {
        let mut claimed = vec![false; detections.len()];
        let mut output = Vec::with_capacity(self.previous.len() + detections.len());

        for prev in &self.previous {
            let nearest = detections
                .iter()
                .enumerate()
                .filter(|(i, _)| !claimed[*i])
                .map(|(i, d)| (i, distance(prev.detection.position(), d.position())))
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match nearest {
                Some((i, dist)) if dist < self.match_distance => {
                    claimed[i] = true;
                    trace!(category = self.category, id = prev.id, dist, "matched");
                    output.push(TrackedObject {
                        id: prev.id,
                        age: prev.age + 1,
                        missing: false,
                        detection: detections[i].clone(),
                    });
                }
                _ if prev.age > self.grace_age => {
                    trace!(category = self.category, id = prev.id, "missing, kept for one frame");
                    output.push(TrackedObject {
                        missing: true,
                        ..prev.clone()
                    });
                }
                _ => {
                    trace!(category = self.category, id = prev.id, age = prev.age, "dropped");
                }
            }
        }

        for (detection, _) in detections
            .into_iter()
            .zip(claimed)
            .filter(|(_, was_claimed)| !was_claimed)
        {
            let id = self.next_id;
            self.next_id += 1;
            output.push(TrackedObject {
                id,
                age: 1,
                missing: false,
                detection,
            });
        }

        self.previous = output.iter().filter(|o| !o.missing).cloned().collect();
        debug!(
            category = self.category,
            tracked = output.len(),
            carried = self.previous.len(),
            "tracker updated"
        );
        output
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Per-session tracking state. One instance per game session; dropping it
/// forgets every identity.
#[derive(Debug, Clone)]
pub struct Tracker {
    pub stations: ObjectTracker<Station>,
    pub trains: ObjectTracker<Train>,
}

impl Tracker {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            stations: ObjectTracker::new(
                "stations",
                config.tracker_match_distance,
                config.tracker_grace_age,
            ),
            trains: ObjectTracker::new(
                "trains",
                config.tracker_match_distance,
                config.tracker_grace_age,
            ),
        }
    }
}
