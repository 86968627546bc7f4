//! Serializable snapshot of a track.
//!
//! The JSON layout groups the snapshot into `metadata`, `current_state`,
//! `statistics` and `raw_data` sections; positions are `[x, y]` pairs.

use std::path::Path;

use har_core::{Activity, BoundingBox, Error, Result, TrackId};
use serde::{Deserialize, Serialize};

use crate::track::TrackState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub first_seen: f64,
    pub last_seen: f64,
    pub total_frames: u64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentState {
    pub activity: Activity,
    pub last_position: Option<(f64, f64)>,
    pub last_bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub timestamp: f64,
    pub from: Activity,
    pub to: Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStatistics {
    pub total_distance_norm: f64,
    pub frames_stationary: u64,
    pub frames_moving: u64,
    pub frames_sitting: u64,
    pub fall_detected: bool,
    pub fall_timestamp: Option<f64>,
    pub total_activity_changes: u64,
    pub activity_changes: Vec<ChangeRecord>,
}

/// Timestamps and centers of the retained history, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub timestamps: Vec<f64>,
    pub positions: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackExport {
    pub track_id: TrackId,
    pub identity: String,
    pub metadata: ExportMetadata,
    pub current_state: CurrentState,
    pub statistics: ExportStatistics,
    pub raw_data: RawData,
}

impl TrackExport {
    pub fn from_track(track: &TrackState) -> Self {
        let stats = track.stats();
        let history = track.history();
        let latest = history.latest();

        let raw_data = RawData {
            timestamps: history.iter().map(|s| s.timestamp).collect(),
            positions: history.iter().map(|s| s.center.into()).collect(),
        };

        Self {
            track_id: track.track_id(),
            identity: track.identity().to_string(),
            metadata: ExportMetadata {
                first_seen: track.first_seen(),
                last_seen: track.last_seen(),
                total_frames: track.total_frames(),
                duration_seconds: track.duration_secs(),
            },
            current_state: CurrentState {
                activity: track.current_activity(),
                last_position: latest.map(|s| s.center.into()),
                last_bbox: latest.map(|s| s.bbox),
            },
            statistics: ExportStatistics {
                total_distance_norm: stats.total_distance_norm,
                frames_stationary: stats.frames_stationary,
                frames_moving: stats.frames_moving,
                frames_sitting: stats.frames_sitting,
                fall_detected: stats.fall_detected,
                fall_timestamp: stats.fall_timestamp,
                total_activity_changes: stats.activity_change_count,
                activity_changes: stats
                    .activity_changes
                    .iter()
                    .map(|c| ChangeRecord {
                        timestamp: c.timestamp,
                        from: c.from,
                        to: c.to,
                    })
                    .collect(),
            },
            raw_data,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write as pretty JSON to `path`, creating parent directories as needed
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::io(parent, source))?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| Error::io(path, source))?;
        Ok(())
    }

    /// Read a snapshot previously written with [`TrackExport::write_to`]
    pub fn read_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        Self::from_json(&json)
    }
}
