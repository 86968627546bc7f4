//! Read-only reporting projections of track and store state.

use std::fmt;

use har_core::{Activity, TrackId};
use serde::{Deserialize, Serialize};

use crate::track::{ActivityChange, TrackState};

/// Number of trailing activity changes included in a summary
pub const SUMMARY_HISTORY_LEN: usize = 5;

/// Derived statistics of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_distance_normalized: f64,
    pub percent_moving: f64,
    pub percent_stationary: f64,
    pub percent_sitting: f64,
    pub fall_detected: bool,
    pub fall_timestamp: Option<f64>,
    pub total_activity_changes: u64,
}

/// Snapshot of one track for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub track_id: TrackId,
    pub identity: String,
    pub duration_seconds: f64,
    pub total_frames: u64,
    pub current_activity: Activity,
    pub stats: SummaryStats,
    /// Most recent changes, oldest first
    pub activity_history: Vec<ActivityChange>,
}

fn percent(frames: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        frames as f64 / total as f64 * 100.0
    }
}

impl TrackSummary {
    pub fn from_track(track: &TrackState) -> Self {
        let stats = track.stats();
        let total = track.total_frames();
        let skip = stats.activity_changes.len().saturating_sub(SUMMARY_HISTORY_LEN);

        Self {
            track_id: track.track_id(),
            identity: track.identity().to_string(),
            duration_seconds: track.duration_secs(),
            total_frames: total,
            current_activity: track.current_activity(),
            stats: SummaryStats {
                total_distance_normalized: stats.total_distance_norm,
                percent_moving: percent(stats.frames_moving, total),
                percent_stationary: percent(stats.frames_stationary, total),
                percent_sitting: percent(stats.frames_sitting, total),
                fall_detected: stats.fall_detected,
                fall_timestamp: stats.fall_timestamp,
                total_activity_changes: stats.activity_change_count,
            },
            activity_history: stats.activity_changes.iter().skip(skip).copied().collect(),
        }
    }
}

impl fmt::Display for TrackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[TRACK] {} ({})", self.track_id, self.identity)?;
        writeln!(f, "  Activity: {}", self.current_activity)?;
        writeln!(f, "  Duration: {:.1}s", self.duration_seconds)?;
        writeln!(
            f,
            "  Normalized Distance: {:.2}",
            self.stats.total_distance_normalized
        )?;
        writeln!(f, "  Moving: {:.1}%", self.stats.percent_moving)?;
        writeln!(f, "  Stationary: {:.1}%", self.stats.percent_stationary)?;
        write!(f, "  Sitting: {:.1}%", self.stats.percent_sitting)?;
        if self.stats.fall_detected {
            write!(f, "\n  [WARNING] Fall detected!")?;
            if let Some(ts) = self.stats.fall_timestamp {
                write!(f, " (t={ts:.2})")?;
            }
        }
        Ok(())
    }
}

/// Store-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Distinct track creations, including re-creation after removal
    pub total_tracks_seen: u64,
    pub active_tracks: usize,
    pub total_falls_detected: u64,
    pub total_activity_changes: u64,
}

impl fmt::Display for GlobalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[GLOBAL] people: {} (active {}), falls: {}, activity changes: {}",
            self.total_tracks_seen,
            self.active_tracks,
            self.total_falls_detected,
            self.total_activity_changes
        )
    }
}
