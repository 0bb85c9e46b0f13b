use std::collections::VecDeque;

use tracing::trace;

use crate::analysis::Outcome;
use crate::analyzer::Snapshot;

pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// The most recent snapshots of a running game, oldest first.
///
/// Frames without a readable, non-zero score are taken to be menus or
/// loading screens and are not recorded.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    capacity: usize,
    entries: VecDeque<Snapshot>,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Record `snapshot` if the game looks live. Returns whether it was kept.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if matches!(snapshot.score, Outcome::Nothing | Outcome::Found(0)) {
            trace!(frame_number = snapshot.frame_number, "no score, snapshot not recorded");
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
        true
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(frame_number: u32, score: Outcome<u32>) -> Snapshot {
        Snapshot {
            frame_number,
            score,
            available_trains: Outcome::Nothing,
            available_tunnels: Outcome::Nothing,
            available_wagons: Outcome::Nothing,
            line_indicators: Outcome::Nothing,
            stations: Vec::new(),
            placed_lines: Vec::new(),
            trains: Vec::new(),
            demands: Vec::new(),
        }
    }

    #[test]
    fn keeps_only_the_most_recent() {
        let mut history = SnapshotHistory::default();
        for i in 0..8 {
            assert!(history.push(snapshot(i, Outcome::Found(10 + i))));
        }
        assert_eq!(history.len(), 5);
        let frames: Vec<u32> = history.iter().map(|s| s.frame_number).collect();
        assert_eq!(frames, vec![3, 4, 5, 6, 7]);
        assert_eq!(history.latest().map(|s| s.frame_number), Some(7));
    }

    #[test]
    fn skips_frames_without_score() {
        let mut history = SnapshotHistory::new(3);
        assert!(!history.push(snapshot(0, Outcome::Nothing)));
        assert!(!history.push(snapshot(1, Outcome::Found(0))));
        assert!(history.push(snapshot(2, Outcome::Found(4))));
        assert_eq!(history.len(), 1);
    }
}
