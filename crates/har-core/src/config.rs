//! Tracker configuration and live-adjustable thresholds.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Classification and fall-detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Normalized speed below this is stationary (heights/s)
    pub speed_stationary: f64,
    /// Reserved for finer-grained motion labels; not read by the classifier
    pub speed_slow: f64,
    /// Reserved for finer-grained motion labels; not read by the classifier
    pub speed_fast: f64,
    /// Hip ratio above this (while nearly still) is sitting
    pub hip_ratio_sitting: f64,
    /// Relative pose-height drop that counts as a collapse
    pub fall_drop_ratio: f64,
    /// The collapse must happen within this many seconds
    pub fall_time_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            speed_stationary: 0.1,
            speed_slow: 0.5,
            speed_fast: 1.5,
            hip_ratio_sitting: 0.62,
            fall_drop_ratio: 0.30,
            fall_time_threshold: 0.5,
        }
    }
}

/// Shared, runtime-mutable threshold set.
///
/// Cloning the handle shares the underlying values, so a configuration
/// reloader holding one clone can retune a running tracker. Readers take a
/// copy once per update.
#[derive(Debug, Clone, Default)]
pub struct SharedThresholds {
    inner: Arc<RwLock<Thresholds>>,
}

impl SharedThresholds {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            inner: Arc::new(RwLock::new(thresholds)),
        }
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> Thresholds {
        *self.inner.read()
    }

    pub fn set(&self, thresholds: Thresholds) {
        *self.inner.write() = thresholds;
    }

    /// Modify in place under the write lock
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Thresholds),
    {
        let mut guard = self.inner.write();
        f(&mut guard);
    }
}

/// Largest per-track history accepted: ten minutes at 60 fps
pub const MAX_HISTORY_CAPACITY: usize = 36_000;

/// Complete tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Seconds of per-track history to retain
    pub history_seconds: f64,

    /// Approximate frame rate, used only to size the history buffer
    pub fps_estimate: u32,

    /// A track is active if seen within this many seconds
    pub active_window_secs: f64,

    /// Maximum activity-change events kept per track
    pub max_activity_log: usize,

    pub thresholds: Thresholds,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_seconds: 3.0,
            fps_estimate: 15,
            active_window_secs: 2.0,
            max_activity_log: 100,
            thresholds: Thresholds::default(),
        }
    }
}

impl TrackerConfig {
    pub fn new(history_seconds: f64, fps_estimate: u32) -> Self {
        Self {
            history_seconds,
            fps_estimate,
            ..Default::default()
        }
    }

    /// Number of frames held in each track's history (at least one)
    pub fn history_capacity(&self) -> usize {
        let frames = (self.history_seconds * self.fps_estimate as f64).floor();
        if frames.is_finite() && frames >= 1.0 {
            frames as usize
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.history_seconds.is_finite() || self.history_seconds <= 0.0 {
            return Err(Error::Config(format!(
                "history_seconds must be positive and finite, got {}",
                self.history_seconds
            )));
        }
        if self.fps_estimate == 0 {
            return Err(Error::Config("fps_estimate must be positive".into()));
        }
        let capacity = self.history_capacity();
        if capacity > MAX_HISTORY_CAPACITY {
            return Err(Error::Config(format!(
                "history of {capacity} frames exceeds the maximum of {MAX_HISTORY_CAPACITY}"
            )));
        }
        if self.active_window_secs.is_nan() || self.active_window_secs <= 0.0 {
            return Err(Error::Config(format!(
                "active_window_secs must be positive, got {}",
                self.active_window_secs
            )));
        }
        Ok(())
    }

    /// Copy with invalid fields replaced by their defaults and the history
    /// shortened to at most [`MAX_HISTORY_CAPACITY`] frames.
    ///
    /// The result always passes [`validate`](Self::validate).
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();

        if config.fps_estimate == 0 {
            config.fps_estimate = defaults.fps_estimate;
        }
        if !config.history_seconds.is_finite() || config.history_seconds <= 0.0 {
            config.history_seconds = defaults.history_seconds;
        }
        if config.history_capacity() > MAX_HISTORY_CAPACITY {
            config.history_seconds = MAX_HISTORY_CAPACITY as f64 / config.fps_estimate as f64;
        }
        if config.active_window_secs.is_nan() || config.active_window_secs <= 0.0 {
            config.active_window_secs = defaults.active_window_secs;
        }
        config
    }

    /// Load configuration from file, with `HAR_` environment overrides
    /// (`HAR_THRESHOLDS__SPEED_STATIONARY=0.2`)
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(Self::environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        tracing::info!("Loaded tracker configuration from {}", path);
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("HAR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }
}
