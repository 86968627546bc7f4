//! # HAR-Tracker
//!
//! Temporal human-activity tracking on top of per-frame pose detections.
//!
//! Feed one [`Observation`](har_core::Observation) per person per frame into
//! an [`ActivityTracker`]; each track keeps a bounded rolling history from
//! which it derives:
//!
//! - **Activity**: `stationary`, `moving` or `sitting` once ten frames are
//!   available, from scale-normalized speed and hip-to-ankle geometry
//! - **Falls**: a rapid collapse of the nose-to-ankle pose height
//! - **Statistics**: time shares per activity, normalized distance and a log
//!   of activity changes
//!
//! Summaries and JSON snapshots are available per track, plus store-wide
//! counters.

pub mod classifier;
pub mod export;
pub mod fall;
pub mod history;
pub mod shared;
pub mod store;
pub mod summary;
pub mod track;

pub use classifier::{ActivityClassifier, ActivityFeatures, MIN_CLASSIFY_HISTORY};
pub use export::{ChangeRecord, CurrentState, ExportMetadata, ExportStatistics, RawData, TrackExport};
pub use fall::{FallAssessment, FallDetector};
pub use history::BoundedHistory;
pub use shared::SharedTracker;
pub use store::ActivityTracker;
pub use summary::{GlobalStats, SummaryStats, TrackSummary, SUMMARY_HISTORY_LEN};
pub use track::{ActivityChange, TrackState, TrackStatistics, TrackUpdate, UNKNOWN_IDENTITY};
