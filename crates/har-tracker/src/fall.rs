//! Fall detection from the collapse of normalized pose height.
//!
//! A fall is a large relative drop in nose-to-ankle height (as a fraction of
//! the bounding box) over a short real-time interval. The detector itself is
//! stateless; debouncing to one event per track lives in the track state.

use har_core::{mean, normalized_pose_height, PoseSample, Thresholds};
use serde::{Deserialize, Serialize};

use crate::history::BoundedHistory;

/// Measured collapse over the detection window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallAssessment {
    /// Mean pose height of the first valid samples
    pub start_height: f64,
    /// Mean pose height of the last valid samples
    pub end_height: f64,
    /// `(start - end) / start`, zero when `start <= 0`
    pub drop_ratio: f64,
    /// Seconds between the first and last sample of the window
    pub elapsed: f64,
}

impl FallAssessment {
    pub fn is_fall(&self, thresholds: &Thresholds) -> bool {
        self.drop_ratio > thresholds.fall_drop_ratio && self.elapsed < thresholds.fall_time_threshold
    }
}

#[derive(Debug, Clone)]
pub struct FallDetector {
    /// Samples examined; also the minimum history length
    window: usize,
    /// Valid pose heights required within the window
    min_valid: usize,
    /// Samples averaged at each end of the window
    edge: usize,
}

impl Default for FallDetector {
    fn default() -> Self {
        Self {
            window: 15,
            min_valid: 5,
            edge: 3,
        }
    }
}

impl FallDetector {
    /// Samples examined; a track needs at least this much history
    pub fn window(&self) -> usize {
        self.window
    }

    /// `None` when the history is shorter than the window or too few samples
    /// carry the joints needed for a pose height
    pub fn assess(&self, history: &BoundedHistory<PoseSample>) -> Option<FallAssessment> {
        if history.len() < self.window {
            return None;
        }

        let mut recent = history.recent(self.window);
        let first_ts = recent.clone().next()?.timestamp;
        let last_ts = recent.next_back()?.timestamp;

        let heights: Vec<f64> = history
            .recent(self.window)
            .filter_map(|s| normalized_pose_height(&s.keypoints, &s.bbox))
            .collect();

        if heights.len() < self.min_valid.max(1) {
            return None;
        }

        let edge = self.edge.clamp(1, heights.len());
        let start_height = mean(&heights[..edge])?;
        let end_height = mean(&heights[heights.len() - edge..])?;
        let drop_ratio = if start_height > 0.0 {
            (start_height - end_height) / start_height
        } else {
            0.0
        };

        Some(FallAssessment {
            start_height,
            end_height,
            drop_ratio,
            elapsed: last_ts - first_ts,
        })
    }

    pub fn detect(&self, history: &BoundedHistory<PoseSample>, thresholds: &Thresholds) -> bool {
        self.assess(history)
            .is_some_and(|assessment| assessment.is_fall(thresholds))
    }
}
