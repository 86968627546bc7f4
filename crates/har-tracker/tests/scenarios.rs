//! End-to-end behaviour of the activity tracker on synthetic streams.

use std::thread;

use har_core::{Activity, BoundingBox, Error, Keypoint, KeypointSet, Observation, TrackId, TrackerConfig};
use har_tracker::{ActivityTracker, SharedTracker, TrackExport, SUMMARY_HISTORY_LEN};

const FRAME: f64 = 1.0 / 15.0;

fn plain(t: f64, cx: f64, foot: f64, height: f64) -> Observation {
    Observation::new(
        t,
        BoundingBox::from_foot_point(cx, foot, height * 0.3, height),
        KeypointSet::new(),
        0.9,
    )
}

fn walking(t: f64, i: usize) -> Observation {
    plain(t, 100.0 + i as f64 * 5.0, 400.0, 250.0)
}

/// Nose near the top of the box, ankles near the bottom
fn standing(t: f64) -> Observation {
    let bbox = BoundingBox::from_foot_point(300.0, 400.0, 80.0, 250.0);
    let keypoints = KeypointSet::new()
        .with(Keypoint::Nose, 300.0, 160.0, 0.95)
        .with(Keypoint::LeftAnkle, 285.0, 390.0, 0.9)
        .with(Keypoint::RightAnkle, 315.0, 390.0, 0.9);
    Observation::new(t, bbox, keypoints, 0.9)
}

/// Upright pose around `(cx, foot)` with hips 100 px above the ankles
/// in a 250 px box (hip ratio 0.4)
fn upright(t: f64, cx: f64, foot: f64) -> Observation {
    let bbox = BoundingBox::from_foot_point(cx, foot, 80.0, 250.0);
    let keypoints = KeypointSet::new()
        .with(Keypoint::Nose, cx, foot - 240.0, 0.95)
        .with(Keypoint::LeftHip, cx - 20.0, foot - 110.0, 0.9)
        .with(Keypoint::RightHip, cx + 20.0, foot - 110.0, 0.9)
        .with(Keypoint::LeftAnkle, cx - 30.0, foot - 10.0, 0.9)
        .with(Keypoint::RightAnkle, cx + 30.0, foot - 10.0, 0.9);
    Observation::new(t, bbox, keypoints, 0.9)
}

/// Nose within 5 px of the mean ankle height
fn collapsed(t: f64) -> Observation {
    let bbox = BoundingBox::from_foot_point(300.0, 400.0, 80.0, 250.0);
    let keypoints = KeypointSet::new()
        .with(Keypoint::Nose, 380.0, 385.0, 0.8)
        .with(Keypoint::LeftAnkle, 230.0, 390.0, 0.8)
        .with(Keypoint::RightAnkle, 250.0, 390.0, 0.8);
    Observation::new(t, bbox, keypoints, 0.8)
}

fn seated(t: f64) -> Observation {
    let bbox = BoundingBox::from_foot_point(300.0, 400.0, 80.0, 180.0);
    let keypoints = KeypointSet::new()
        .with(Keypoint::Nose, 300.0, 240.0, 0.95)
        .with(Keypoint::LeftHip, 280.0, 270.0, 0.9)
        .with(Keypoint::RightHip, 320.0, 270.0, 0.9)
        .with(Keypoint::LeftAnkle, 270.0, 390.0, 0.9)
        .with(Keypoint::RightAnkle, 330.0, 390.0, 0.9);
    Observation::new(t, bbox, keypoints, 0.9)
}

fn feed_fall(tracker: &mut ActivityTracker, id: TrackId) -> f64 {
    let mut t = 100.0;
    for _ in 0..10 {
        tracker.update(id, &standing(t));
        t += 0.02;
    }
    for _ in 0..10 {
        tracker.update(id, &collapsed(t));
        t += 0.02;
    }
    t
}

#[test]
fn scenario_stationary_with_jitter() {
    let mut tracker = ActivityTracker::default();
    let id = TrackId(1);

    for i in 0..50 {
        let jx = 0.5 * (i as f64 * 1.7).sin();
        let jy = 0.5 * (i as f64 * 2.3).cos();
        tracker.update(id, &upright(i as f64 * FRAME, 300.0 + jx, 400.0 + jy));
    }

    let summary = tracker.get_summary(id).unwrap();
    assert_eq!(summary.current_activity, Activity::Stationary);
    assert_eq!(summary.stats.percent_sitting, 0.0);
    assert_eq!(summary.total_frames, 50);
    assert!(!summary.stats.fall_detected);
}

#[test]
fn oversized_history_config_does_not_abort() {
    let mut tracker = ActivityTracker::new(TrackerConfig::new(1e12, 30));
    let id = TrackId(12);

    for i in 0..20 {
        tracker.update(id, &walking(i as f64 * FRAME, i));
    }
    assert_eq!(tracker.activity(id), Some(Activity::Moving));
    assert!(tracker.config().validate().is_ok());
}

#[test]
fn scenario_moving() {
    let mut tracker = ActivityTracker::default();
    let id = TrackId(2);

    for i in 0..50 {
        tracker.update(id, &walking(i as f64 * FRAME, i));
    }

    let summary = tracker.get_summary(id).unwrap();
    assert_eq!(summary.current_activity, Activity::Moving);
    assert!(summary.stats.percent_moving > 80.0, "{summary}");
    assert!(summary.stats.total_distance_normalized > 0.0);
    assert!((summary.duration_seconds - 49.0 * FRAME).abs() < 1e-9);
}

#[test]
fn scenario_sitting() {
    let mut tracker = ActivityTracker::default();
    let id = TrackId(3);

    for i in 0..50 {
        tracker.update(id, &seated(i as f64 * FRAME));
    }

    let summary = tracker.get_summary(id).unwrap();
    assert_eq!(summary.current_activity, Activity::Sitting);
    assert!(summary.stats.percent_sitting > 70.0);
}

#[test]
fn scenario_fall() {
    let mut tracker = ActivityTracker::new(TrackerConfig::new(5.0, 30));
    let id = TrackId(4);

    feed_fall(&mut tracker, id);

    let summary = tracker.get_summary(id).unwrap();
    assert!(summary.stats.fall_detected);
    assert!(summary.stats.fall_timestamp.is_some());
    assert_eq!(tracker.get_global_stats(100.4).total_falls_detected, 1);
}

#[test]
fn slow_collapse_is_not_a_fall() {
    let mut tracker = ActivityTracker::default();
    let id = TrackId(5);

    let mut t = 0.0;
    for _ in 0..10 {
        tracker.update(id, &standing(t));
        t += 0.2;
    }
    for _ in 0..10 {
        tracker.update(id, &collapsed(t));
        t += 0.2;
    }

    assert!(!tracker.get_summary(id).unwrap().stats.fall_detected);
}

#[test]
fn fall_flag_is_sticky() {
    let mut tracker = ActivityTracker::new(TrackerConfig::new(5.0, 30));
    let id = TrackId(6);

    let mut t = feed_fall(&mut tracker, id);
    let first = tracker.get_summary(id).unwrap().stats.fall_timestamp;

    // Recover, then collapse again
    for _ in 0..30 {
        tracker.update(id, &standing(t));
        t += 0.02;
    }
    for _ in 0..10 {
        tracker.update(id, &collapsed(t));
        t += 0.02;
    }

    let summary = tracker.get_summary(id).unwrap();
    assert!(summary.stats.fall_detected);
    assert_eq!(summary.stats.fall_timestamp, first);
    assert_eq!(tracker.get_global_stats(t).total_falls_detected, 1);

    // Removal re-arms detection for a new track with the same id
    tracker.remove_track(id);
    feed_fall(&mut tracker, id);
    assert_eq!(tracker.get_global_stats(t).total_falls_detected, 2);
}

#[test]
fn activity_unknown_until_ten_entries() {
    let mut tracker = ActivityTracker::default();
    let id = TrackId(7);

    for i in 0..9 {
        let activity = tracker.update(id, &walking(i as f64 * FRAME, i));
        assert_eq!(activity, Activity::Unknown);
    }
    assert_eq!(tracker.update(id, &walking(9.0 * FRAME, 9)), Activity::Moving);
    assert_eq!(tracker.activity(id), Some(Activity::Moving));
}

#[test]
fn total_frames_independent_of_history_length() {
    // Capacity of 4 frames
    let mut tracker = ActivityTracker::new(TrackerConfig::new(1.0, 4));
    let id = TrackId(8);

    for i in 0..100usize {
        tracker.update(id, &walking(i as f64 * FRAME, i));
        assert_eq!(tracker.get_summary(id).unwrap().total_frames, i as u64 + 1);
    }
    let export = tracker.export_track_data(id).unwrap();
    assert_eq!(export.raw_data.timestamps.len(), 4);
    // Too little history to ever classify
    assert_eq!(export.current_state.activity, Activity::Unknown);
}

#[test]
fn live_threshold_changes_drive_transitions() {
    let mut tracker = ActivityTracker::default();
    let id = TrackId(9);
    let thresholds = tracker.thresholds();

    let mut i = 0;
    for _ in 0..20 {
        tracker.update(id, &walking(i as f64 * FRAME, i));
        i += 1;
    }
    assert_eq!(tracker.activity(id), Some(Activity::Moving));
    assert!(tracker.detect_activity_change(id).is_none());

    for round in 0..8 {
        let cutoff = if round % 2 == 0 { 0.5 } else { 0.01 };
        thresholds.update(|t| t.speed_stationary = cutoff);

        tracker.update(id, &walking(i as f64 * FRAME, i));
        i += 1;

        let change = tracker.detect_activity_change(id).unwrap();
        let expected = if round % 2 == 0 {
            Activity::Stationary
        } else {
            Activity::Moving
        };
        assert_eq!(change.to, expected);
        assert_eq!(change.timestamp, tracker.get_summary(id).unwrap().duration_seconds);
    }

    let summary = tracker.get_summary(id).unwrap();
    assert_eq!(summary.stats.total_activity_changes, 8);
    assert_eq!(summary.activity_history.len(), SUMMARY_HISTORY_LEN);
    assert_eq!(summary.activity_history.last().unwrap().to, Activity::Moving);
    assert_eq!(tracker.get_global_stats(0.0).total_activity_changes, 8);
}

#[test]
fn export_round_trips_through_json() {
    let mut tracker = ActivityTracker::default();
    let id = TrackId(10);
    for i in 0..30 {
        tracker.update(id, &walking(i as f64 * FRAME, i));
    }

    let json = tracker.export_track_data(id).unwrap().to_json().unwrap();
    let parsed = TrackExport::from_json(&json).unwrap();

    assert_eq!(parsed.track_id, id);
    assert_eq!(parsed.metadata.total_frames, 30);
    assert_eq!(parsed.current_state.activity, tracker.activity(id).unwrap());
}

#[test]
fn save_to_json_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = ActivityTracker::default();
    let id = TrackId(11);
    for i in 0..15 {
        tracker.update(id, &walking(i as f64 * FRAME, i));
    }
    tracker.update_identity(id, "Layla");

    let path = dir.path().join("nested").join("track_11.json");
    assert!(tracker.save_to_json(id, &path).unwrap());

    let saved = TrackExport::read_from(&path).unwrap();
    assert_eq!(saved.track_id, id);
    assert_eq!(saved.identity, "Layla");
    assert_eq!(saved.metadata.total_frames, 15);

    let missing = dir.path().join("track_404.json");
    assert!(!tracker.save_to_json(TrackId(404), &missing).unwrap());
    assert!(!missing.exists());
}

#[test]
fn save_to_unwritable_path_is_io_error() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut tracker = ActivityTracker::default();
    tracker.update(TrackId(1), &walking(0.0, 0));

    // A regular file cannot act as a directory
    let path = file.path().join("track_1.json");
    let err = tracker.save_to_json(TrackId(1), &path).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn save_active_tracks_skips_stale() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracker = ActivityTracker::default();
    tracker.update(TrackId(1), &walking(0.0, 0));
    tracker.update(TrackId(2), &walking(10.0, 0));
    tracker.update(TrackId(3), &walking(10.5, 0));

    let written = tracker.save_active_tracks(dir.path(), 11.0).unwrap();
    assert_eq!(
        written,
        vec![dir.path().join("track_2.json"), dir.path().join("track_3.json")]
    );
    assert!(!dir.path().join("track_1.json").exists());
}

#[test]
fn export_all_is_sorted() {
    let mut tracker = ActivityTracker::default();
    for id in [5, 2, 9] {
        tracker.update(TrackId(id), &walking(0.0, 0));
    }
    let ids: Vec<TrackId> = tracker.export_all().iter().map(|e| e.track_id).collect();
    assert_eq!(ids, vec![TrackId(2), TrackId(5), TrackId(9)]);
}

#[test]
fn shared_tracker_across_threads() {
    let tracker = SharedTracker::new(TrackerConfig::default());

    let handles: Vec<_> = (0..4i64)
        .map(|id| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for i in 0..50usize {
                    tracker.update(TrackId(id), &walking(i as f64 * FRAME, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(tracker.track_count(), 4);
    let stats = tracker.get_global_stats(49.0 * FRAME);
    assert_eq!(stats.total_tracks_seen, 4);
    assert_eq!(stats.active_tracks, 4);
    for id in 0..4 {
        assert_eq!(tracker.activity(TrackId(id)), Some(Activity::Moving));
    }
}
