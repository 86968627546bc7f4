//! Thread-safe handle around [`ActivityTracker`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use har_core::{Activity, Observation, Result, SharedThresholds, Thresholds, TrackId, TrackerConfig};
use parking_lot::{Mutex, MutexGuard};

use crate::export::TrackExport;
use crate::store::ActivityTracker;
use crate::summary::{GlobalStats, TrackSummary};
use crate::track::ActivityChange;

/// Cloneable tracker handle for several observation streams.
///
/// Every call is one critical section. Use [`SharedTracker::lock`] when a
/// sequence of calls must observe a consistent state.
#[derive(Debug, Clone, Default)]
pub struct SharedTracker {
    inner: Arc<Mutex<ActivityTracker>>,
}

impl SharedTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self::from_tracker(ActivityTracker::new(config))
    }

    pub fn from_tracker(tracker: ActivityTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ActivityTracker> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the tracker
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut ActivityTracker) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn update(&self, track_id: TrackId, observation: &Observation) -> Activity {
        self.inner.lock().update(track_id, observation)
    }

    pub fn activity(&self, track_id: TrackId) -> Option<Activity> {
        self.inner.lock().activity(track_id)
    }

    pub fn detect_activity_change(&self, track_id: TrackId) -> Option<ActivityChange> {
        self.inner.lock().detect_activity_change(track_id)
    }

    pub fn get_summary(&self, track_id: TrackId) -> Option<TrackSummary> {
        self.inner.lock().get_summary(track_id)
    }

    pub fn get_all_active_tracks(&self, now: f64) -> Vec<TrackId> {
        self.inner.lock().get_all_active_tracks(now)
    }

    pub fn get_global_stats(&self, now: f64) -> GlobalStats {
        self.inner.lock().get_global_stats(now)
    }

    pub fn remove_track(&self, track_id: TrackId) -> bool {
        self.inner.lock().remove_track(track_id)
    }

    pub fn update_identity(&self, track_id: TrackId, name: impl Into<String>) -> bool {
        self.inner.lock().update_identity(track_id, name)
    }

    pub fn evict_stale(&self, now: f64, max_age_secs: f64) -> Vec<TrackId> {
        self.inner.lock().evict_stale(now, max_age_secs)
    }

    pub fn track_count(&self) -> usize {
        self.inner.lock().track_count()
    }

    pub fn thresholds(&self) -> SharedThresholds {
        self.inner.lock().thresholds()
    }

    pub fn set_thresholds(&self, thresholds: Thresholds) {
        self.inner.lock().set_thresholds(thresholds);
    }

    pub fn export_track_data(&self, track_id: TrackId) -> Option<TrackExport> {
        self.inner.lock().export_track_data(track_id)
    }

    pub fn save_to_json(&self, track_id: TrackId, path: impl AsRef<Path>) -> Result<bool> {
        self.inner.lock().save_to_json(track_id, path)
    }

    pub fn save_active_tracks(&self, dir: impl AsRef<Path>, now: f64) -> Result<Vec<PathBuf>> {
        self.inner.lock().save_active_tracks(dir, now)
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}
