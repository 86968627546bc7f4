//! # HAR-Core
//!
//! Core types and utilities for the HAR temporal activity tracker.
//!
//! Everything here is scale- and frame-rate-aware: positions are kept in the
//! caller's coordinate units (pixels or normalized), and the kinematics
//! helpers divide by elapsed wall-clock time and by the subject's apparent
//! height so thresholds stay stable across cameras and frame rates.

pub mod config;
pub mod error;
pub mod kinematics;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use kinematics::*;
pub use types::*;
