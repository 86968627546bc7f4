//! Rule-based activity classification.
//!
//! Rules, in priority order:
//!
//! 1. **Sitting** - mean hip ratio above `hip_ratio_sitting` while speed is
//!    below `1.5 × speed_stationary`. Checked first so a seated, still person
//!    is not reported as stationary; the speed gate keeps crouching or
//!    transitional poses out.
//! 2. **Stationary** - speed below `speed_stationary`.
//! 3. **Moving** - anything else.

use har_core::{hip_ratio, mean, normalized_speed, Activity, PoseSample, Thresholds};
use serde::{Deserialize, Serialize};

use crate::history::BoundedHistory;

/// Entries required before a concrete label is produced
pub const MIN_CLASSIFY_HISTORY: usize = 10;

const SITTING_SPEED_FACTOR: f64 = 1.5;
const DEFAULT_HIP_RATIO: f64 = 0.5;

/// Inputs the rules are evaluated on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeatures {
    /// Normalized speed over the classification window
    pub speed: f64,
    /// Mean hip ratio over the most recent samples
    pub avg_hip_ratio: f64,
}

impl ActivityFeatures {
    /// Apply the rule set
    pub fn label(&self, thresholds: &Thresholds) -> Activity {
        if self.avg_hip_ratio > thresholds.hip_ratio_sitting
            && self.speed < thresholds.speed_stationary * SITTING_SPEED_FACTOR
        {
            return Activity::Sitting;
        }

        if self.speed < thresholds.speed_stationary {
            return Activity::Stationary;
        }

        Activity::Moving
    }
}

/// Activity classifier over a track's recent history
#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    /// Samples used for the speed estimate
    speed_window: usize,
    /// Samples averaged for the hip ratio
    hip_window: usize,
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self {
            speed_window: 30,
            hip_window: 5,
        }
    }
}

impl ActivityClassifier {
    pub fn features(&self, history: &BoundedHistory<PoseSample>) -> ActivityFeatures {
        let speed = normalized_speed(history.recent(self.speed_window), self.speed_window);

        let ratios: Vec<f64> = history
            .recent(self.hip_window)
            .filter_map(|s| hip_ratio(&s.keypoints, &s.bbox))
            .collect();
        let avg_hip_ratio = mean(&ratios).unwrap_or(DEFAULT_HIP_RATIO);

        ActivityFeatures {
            speed,
            avg_hip_ratio,
        }
    }

    /// `Unknown` until the history holds [`MIN_CLASSIFY_HISTORY`] entries
    pub fn classify(&self, history: &BoundedHistory<PoseSample>, thresholds: &Thresholds) -> Activity {
        if history.len() < MIN_CLASSIFY_HISTORY {
            return Activity::Unknown;
        }
        self.features(history).label(thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use har_core::{BoundingBox, Keypoint, KeypointSet, Observation};

    fn history_of(frames: impl Iterator<Item = Observation>) -> BoundedHistory<PoseSample> {
        let mut history = BoundedHistory::new(45);
        for obs in frames {
            history.push(PoseSample::from_observation(&obs));
        }
        history
    }

    fn seated_keypoints(cx: f64, foot: f64) -> KeypointSet {
        KeypointSet::new()
            .with(Keypoint::LeftHip, cx - 20.0, foot - 130.0, 0.9)
            .with(Keypoint::RightHip, cx + 20.0, foot - 130.0, 0.9)
            .with(Keypoint::LeftAnkle, cx - 30.0, foot - 10.0, 0.9)
            .with(Keypoint::RightAnkle, cx + 30.0, foot - 10.0, 0.9)
    }

    #[test]
    fn test_rule_priority() {
        let t = Thresholds::default();
        let label = |speed, avg_hip_ratio| ActivityFeatures { speed, avg_hip_ratio }.label(&t);

        assert_eq!(label(0.0, 0.7), Activity::Sitting);
        // Sitting tolerates a little more motion than stationary
        assert_eq!(label(0.12, 0.7), Activity::Sitting);
        assert_eq!(label(0.2, 0.7), Activity::Moving);
        assert_eq!(label(0.05, 0.5), Activity::Stationary);
        assert_eq!(label(0.3, 0.5), Activity::Moving);
        // Boundary: equal to the threshold is not below it
        assert_eq!(label(0.1, 0.62), Activity::Moving);
    }

    #[test]
    fn test_unknown_below_min_history() {
        let classifier = ActivityClassifier::default();
        let history = history_of((0..9).map(|i| {
            Observation::new(
                i as f64 / 15.0,
                BoundingBox::from_foot_point(300.0, 400.0, 80.0, 250.0),
                KeypointSet::new(),
                0.9,
            )
        }));
        assert_eq!(classifier.classify(&history, &Thresholds::default()), Activity::Unknown);
    }

    #[test]
    fn test_missing_keypoints_default_to_standing_ratio() {
        let classifier = ActivityClassifier::default();
        let history = history_of((0..12).map(|i| {
            Observation::new(
                i as f64 / 15.0,
                BoundingBox::from_foot_point(300.0, 400.0, 80.0, 180.0),
                KeypointSet::new(),
                0.9,
            )
        }));
        let features = classifier.features(&history);
        assert_eq!(features.avg_hip_ratio, 0.5);
        assert_eq!(classifier.classify(&history, &Thresholds::default()), Activity::Stationary);
    }

    #[test]
    fn test_seated_history() {
        let classifier = ActivityClassifier::default();
        let history = history_of((0..12).map(|i| {
            Observation::new(
                i as f64 / 15.0,
                BoundingBox::from_foot_point(300.0, 400.0, 80.0, 180.0),
                seated_keypoints(300.0, 400.0),
                0.9,
            )
        }));
        let features = classifier.features(&history);
        assert!((features.avg_hip_ratio - 120.0 / 180.0).abs() < 1e-9);
        assert_eq!(classifier.classify(&history, &Thresholds::default()), Activity::Sitting);

        // Retuning the threshold changes the outcome
        let strict = Thresholds {
            hip_ratio_sitting: 0.7,
            ..Thresholds::default()
        };
        assert_eq!(classifier.classify(&history, &strict), Activity::Stationary);
    }
}
