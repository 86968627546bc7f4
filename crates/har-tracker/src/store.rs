//! Track store: owns every track's state plus run-wide counters.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use har_core::{Activity, Observation, Result, SharedThresholds, Thresholds, TrackId, TrackerConfig};

use crate::classifier::ActivityClassifier;
use crate::export::TrackExport;
use crate::fall::FallDetector;
use crate::summary::{GlobalStats, TrackSummary};
use crate::track::{ActivityChange, TrackState};

/// Temporal activity tracker for every person in a stream.
///
/// Single-threaded; wrap in [`crate::SharedTracker`] to feed it from several
/// streams. Tracks are created on their first observation and are only
/// forgotten through [`remove_track`](Self::remove_track),
/// [`evict_stale`](Self::evict_stale) or [`reset`](Self::reset).
#[derive(Debug)]
pub struct ActivityTracker {
    config: TrackerConfig,
    thresholds: SharedThresholds,
    classifier: ActivityClassifier,
    fall_detector: FallDetector,
    tracks: HashMap<TrackId, TrackState>,
    total_tracks_seen: u64,
    total_falls_detected: u64,
    total_activity_changes: u64,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl ActivityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let thresholds = SharedThresholds::new(config.thresholds);
        Self::with_thresholds(config, thresholds)
    }

    /// Build a tracker reading thresholds from an existing shared handle.
    ///
    /// `config.thresholds` is ignored in favour of the handle's values. A
    /// configuration failing [`TrackerConfig::validate`] is replaced by its
    /// [`sanitized`](TrackerConfig::sanitized) form.
    pub fn with_thresholds(config: TrackerConfig, thresholds: SharedThresholds) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                let sanitized = config.sanitized();
                tracing::warn!(
                    "{}; using history_seconds={}, fps_estimate={}",
                    e,
                    sanitized.history_seconds,
                    sanitized.fps_estimate
                );
                sanitized
            }
        };

        tracing::debug!(
            "Activity tracker initialized: history capacity {} frames, active window {:.1}s",
            config.history_capacity(),
            config.active_window_secs
        );

        Self {
            config,
            thresholds,
            classifier: ActivityClassifier::default(),
            fall_detector: FallDetector::default(),
            tracks: HashMap::new(),
            total_tracks_seen: 0,
            total_falls_detected: 0,
            total_activity_changes: 0,
        }
    }

    /// Current configuration, with the live threshold values
    pub fn config(&self) -> TrackerConfig {
        TrackerConfig {
            thresholds: self.thresholds.snapshot(),
            ..self.config.clone()
        }
    }

    /// Handle to the live thresholds; changes apply from the next update
    pub fn thresholds(&self) -> SharedThresholds {
        self.thresholds.clone()
    }

    pub fn set_thresholds(&self, thresholds: Thresholds) {
        self.thresholds.set(thresholds);
    }

    /// Ingest one observation and return the track's current activity
    pub fn update(&mut self, track_id: TrackId, observation: &Observation) -> Activity {
        let thresholds = self.thresholds.snapshot();

        let track = match self.tracks.entry(track_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.total_tracks_seen += 1;
                tracing::info!("New person detected: track {}", track_id);
                entry.insert(TrackState::new(
                    track_id,
                    observation.timestamp,
                    self.config.history_capacity(),
                    self.config.max_activity_log,
                ))
            }
        };

        let update = track.ingest(observation, &thresholds, &self.classifier, &self.fall_detector);

        if let Some(change) = update.change {
            self.total_activity_changes += 1;
            tracing::debug!(
                "Track {}: activity {} -> {} at {:.2}",
                track_id,
                change.from,
                change.to,
                change.timestamp
            );
        }

        if update.fall_detected {
            self.total_falls_detected += 1;
            tracing::warn!(
                "FALL DETECTED for track {} at {:.2}",
                track_id,
                observation.timestamp
            );
        }

        update.activity
    }

    /// Current label of a known track
    pub fn activity(&self, track_id: TrackId) -> Option<Activity> {
        self.tracks.get(&track_id).map(TrackState::current_activity)
    }

    /// Transition caused by the track's latest observation, if any
    pub fn detect_activity_change(&self, track_id: TrackId) -> Option<ActivityChange> {
        self.tracks.get(&track_id)?.detect_activity_change()
    }

    pub fn get_summary(&self, track_id: TrackId) -> Option<TrackSummary> {
        self.tracks.get(&track_id).map(TrackSummary::from_track)
    }

    /// Tracks seen within the active window of `now`, ascending
    pub fn get_all_active_tracks(&self, now: f64) -> Vec<TrackId> {
        let window = self.config.active_window_secs;
        let mut active: Vec<TrackId> = self
            .tracks
            .values()
            .filter(|t| t.is_active(now, window))
            .map(TrackState::track_id)
            .collect();
        active.sort_unstable();
        active
    }

    pub fn get_global_stats(&self, now: f64) -> GlobalStats {
        let window = self.config.active_window_secs;
        GlobalStats {
            total_tracks_seen: self.total_tracks_seen,
            active_tracks: self.tracks.values().filter(|t| t.is_active(now, window)).count(),
            total_falls_detected: self.total_falls_detected,
            total_activity_changes: self.total_activity_changes,
        }
    }

    /// Forget a track; a later observation starts it afresh
    pub fn remove_track(&mut self, track_id: TrackId) -> bool {
        let removed = self.tracks.remove(&track_id).is_some();
        if removed {
            tracing::debug!("Removed track {}", track_id);
        }
        removed
    }

    /// Attach a recognized name to a track
    pub fn update_identity(&mut self, track_id: TrackId, name: impl Into<String>) -> bool {
        match self.tracks.get_mut(&track_id) {
            Some(track) => {
                let name = name.into();
                tracing::info!("Track {} identified as {}", track_id, name);
                track.set_identity(name);
                true
            }
            None => false,
        }
    }

    /// Remove every track unseen for at least `max_age_secs`; returns their
    /// ids in ascending order
    pub fn evict_stale(&mut self, now: f64, max_age_secs: f64) -> Vec<TrackId> {
        let mut evicted: Vec<TrackId> = self
            .tracks
            .values()
            .filter(|t| now - t.last_seen() >= max_age_secs)
            .map(TrackState::track_id)
            .collect();
        evicted.sort_unstable();

        for id in &evicted {
            self.tracks.remove(id);
        }
        if !evicted.is_empty() {
            tracing::debug!("Evicted {} stale tracks: {:?}", evicted.len(), evicted);
        }
        evicted
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.contains_key(&track_id)
    }

    /// Known track ids, ascending
    pub fn track_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn track(&self, track_id: TrackId) -> Option<&TrackState> {
        self.tracks.get(&track_id)
    }

    /// Forget all tracks and zero the global counters
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.total_tracks_seen = 0;
        self.total_falls_detected = 0;
        self.total_activity_changes = 0;
        tracing::info!("Activity tracker reset");
    }

    pub fn export_track_data(&self, track_id: TrackId) -> Option<TrackExport> {
        self.tracks.get(&track_id).map(TrackExport::from_track)
    }

    /// Snapshots of every known track, ascending by id
    pub fn export_all(&self) -> Vec<TrackExport> {
        self.track_ids()
            .into_iter()
            .filter_map(|id| self.export_track_data(id))
            .collect()
    }

    /// Write a track's snapshot as JSON. `Ok(false)` if the track is unknown.
    pub fn save_to_json(&self, track_id: TrackId, path: impl AsRef<Path>) -> Result<bool> {
        let Some(export) = self.export_track_data(track_id) else {
            return Ok(false);
        };
        let path = path.as_ref();
        export.write_to(path)?;
        tracing::info!("Saved track {} to {}", track_id, path.display());
        Ok(true)
    }

    /// Write `track_<id>.json` into `dir` for every active track
    pub fn save_active_tracks(&self, dir: impl AsRef<Path>, now: f64) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut written = Vec::new();

        for track_id in self.get_all_active_tracks(now) {
            let path = dir.join(format!("track_{track_id}.json"));
            if self.save_to_json(track_id, &path)? {
                written.push(path);
            }
        }
        Ok(written)
    }
}
