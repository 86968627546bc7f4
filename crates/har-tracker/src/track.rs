//! Per-track state: rolling history, counters and current classification.

use std::collections::VecDeque;

use har_core::{normalized_speed, Activity, Observation, PoseSample, Thresholds, TrackId, SPEED_WINDOW};
use serde::{Deserialize, Serialize};

use crate::classifier::{ActivityClassifier, MIN_CLASSIFY_HISTORY};
use crate::fall::FallDetector;
use crate::history::BoundedHistory;

/// Identity shown until a recognizer names the track
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// Transition between two concrete activity labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityChange {
    pub track_id: TrackId,
    pub timestamp: f64,
    pub from: Activity,
    pub to: Activity,
}

/// Cumulative statistics for one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackStatistics {
    /// Sum of per-frame normalized speed over moving frames
    pub total_distance_norm: f64,
    pub frames_stationary: u64,
    pub frames_moving: u64,
    pub frames_sitting: u64,
    /// Sticky once set
    pub fall_detected: bool,
    pub fall_timestamp: Option<f64>,
    /// Every transition ever recorded, including ones dropped from the log
    pub activity_change_count: u64,
    /// Most recent transitions, oldest first
    pub activity_changes: VecDeque<ActivityChange>,
}

/// What a single observation did to a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackUpdate {
    pub activity: Activity,
    pub change: Option<ActivityChange>,
    /// True only on the observation that first detected the fall
    pub fall_detected: bool,
}

#[derive(Debug, Clone)]
pub struct TrackState {
    track_id: TrackId,
    history: BoundedHistory<PoseSample>,
    first_seen: f64,
    last_seen: f64,
    total_frames: u64,
    current_activity: Activity,
    previous_activity: Activity,
    stats: TrackStatistics,
    identity: String,
    max_activity_log: usize,
}

impl TrackState {
    pub fn new(track_id: TrackId, first_seen: f64, history_capacity: usize, max_activity_log: usize) -> Self {
        Self {
            track_id,
            history: BoundedHistory::new(history_capacity),
            first_seen,
            last_seen: first_seen,
            total_frames: 0,
            current_activity: Activity::Unknown,
            previous_activity: Activity::Unknown,
            stats: TrackStatistics::default(),
            identity: UNKNOWN_IDENTITY.to_string(),
            max_activity_log,
        }
    }

    /// Fold one observation into the track.
    ///
    /// Appends to history, accumulates speed statistics, reclassifies once
    /// enough history exists and runs fall detection until a fall is found.
    pub fn ingest(
        &mut self,
        observation: &Observation,
        thresholds: &Thresholds,
        classifier: &ActivityClassifier,
        fall_detector: &FallDetector,
    ) -> TrackUpdate {
        let timestamp = observation.timestamp;

        self.last_seen = timestamp;
        self.total_frames += 1;
        self.history.push(PoseSample::from_observation(observation));

        if self.history.len() >= 2 {
            let speed = normalized_speed(self.history.recent(SPEED_WINDOW), SPEED_WINDOW);
            if speed < thresholds.speed_stationary {
                self.stats.frames_stationary += 1;
            } else {
                self.stats.frames_moving += 1;
                self.stats.total_distance_norm += speed;
            }
        }

        let mut change = None;
        if self.history.len() >= MIN_CLASSIFY_HISTORY {
            let activity = classifier.classify(&self.history, thresholds);
            change = self.record_activity(activity, timestamp);

            if self.current_activity == Activity::Sitting {
                self.stats.frames_sitting += 1;
            }
        }

        let mut fall_detected = false;
        if !self.stats.fall_detected
            && self.history.len() >= fall_detector.window()
            && fall_detector.detect(&self.history, thresholds)
        {
            self.stats.fall_detected = true;
            self.stats.fall_timestamp = Some(timestamp);
            fall_detected = true;
        }

        TrackUpdate {
            activity: self.current_activity,
            change,
            fall_detected,
        }
    }

    fn record_activity(&mut self, activity: Activity, timestamp: f64) -> Option<ActivityChange> {
        self.previous_activity = self.current_activity;
        self.current_activity = activity;

        let change = self.detect_activity_change()?;
        let change = ActivityChange { timestamp, ..change };

        if self.max_activity_log > 0 {
            if self.stats.activity_changes.len() >= self.max_activity_log {
                self.stats.activity_changes.pop_front();
            }
            self.stats.activity_changes.push_back(change);
        }
        self.stats.activity_change_count += 1;
        Some(change)
    }

    /// The transition caused by the latest observation, if any.
    ///
    /// Stays observable until the next observation for this track.
    pub fn detect_activity_change(&self) -> Option<ActivityChange> {
        if self.previous_activity.is_known() && self.current_activity != self.previous_activity {
            Some(ActivityChange {
                track_id: self.track_id,
                timestamp: self.last_seen,
                from: self.previous_activity,
                to: self.current_activity,
            })
        } else {
            None
        }
    }

    pub fn set_identity(&mut self, name: impl Into<String>) {
        self.identity = name.into();
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn history(&self) -> &BoundedHistory<PoseSample> {
        &self.history
    }

    pub fn first_seen(&self) -> f64 {
        self.first_seen
    }

    pub fn last_seen(&self) -> f64 {
        self.last_seen
    }

    pub fn duration_secs(&self) -> f64 {
        self.last_seen - self.first_seen
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn current_activity(&self) -> Activity {
        self.current_activity
    }

    pub fn previous_activity(&self) -> Activity {
        self.previous_activity
    }

    pub fn stats(&self) -> &TrackStatistics {
        &self.stats
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Seen within `window_secs` of `now`
    pub fn is_active(&self, now: f64, window_secs: f64) -> bool {
        now - self.last_seen < window_secs
    }
}
