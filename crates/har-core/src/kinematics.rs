//! Scale-normalized kinematic measurements.
//!
//! All functions here are pure. Speeds are expressed in person-heights per
//! second: displacement is divided by elapsed wall-clock time (not frame
//! count) and by the subject's mean bounding-box height (not absolute
//! pixels), which keeps thresholds comparable across frame rates and camera
//! distances.

use crate::types::{BoundingBox, Keypoint, KeypointSet, PoseSample};

/// Default number of samples used for the per-frame speed estimate
pub const SPEED_WINDOW: usize = 10;

/// Normalized speed over the last `min(window, len)` samples.
///
/// Sums the center-to-center path length, divides by the elapsed time between
/// the first and last sample of the window and then by the mean bbox height.
/// Returns `0.0` with fewer than two samples, a non-positive time span, or a
/// non-positive mean height.
pub fn normalized_speed<'a, I>(samples: I, window: usize) -> f64
where
    I: IntoIterator<Item = &'a PoseSample>,
    I::IntoIter: ExactSizeIterator,
{
    let iter = samples.into_iter();
    let skip = iter.len().saturating_sub(window);
    let mut iter = iter.skip(skip);

    let Some(first) = iter.next() else {
        return 0.0;
    };

    let mut previous = first;
    let mut path_length = 0.0;
    let mut height_sum = first.bbox.height();
    let mut count = 1usize;

    for sample in iter {
        path_length += previous.center.distance_to(&sample.center);
        height_sum += sample.bbox.height();
        count += 1;
        previous = sample;
    }

    if count < 2 {
        return 0.0;
    }

    let dt = previous.timestamp - first.timestamp;
    if dt <= 0.0 {
        return 0.0;
    }

    let mean_height = height_sum / count as f64;
    if mean_height <= 0.0 {
        return 0.0;
    }

    path_length / dt / mean_height
}

/// Vertical nose-to-ankle distance as a fraction of bbox height.
///
/// Standing poses sit around 0.85-0.95; a collapsed pose approaches zero.
/// `None` means insufficient data (missing joints or a degenerate box), never
/// a measured zero.
pub fn normalized_pose_height(keypoints: &KeypointSet, bbox: &BoundingBox) -> Option<f64> {
    let nose = keypoints.get(Keypoint::Nose)?;
    let left_ankle = keypoints.get(Keypoint::LeftAnkle)?;
    let right_ankle = keypoints.get(Keypoint::RightAnkle)?;

    let bbox_height = bbox.height();
    if bbox_height <= 0.0 {
        return None;
    }

    let ankle_y = (left_ankle.y + right_ankle.y) / 2.0;
    Some((ankle_y - nose.y).abs() / bbox_height)
}

/// Hip-to-ankle vertical distance as a fraction of bbox height.
///
/// Standing is typically 0.45-0.55 and sitting 0.65-0.80: a seated person's
/// box shrinks around a hip that stays well above the ankles.
pub fn hip_ratio(keypoints: &KeypointSet, bbox: &BoundingBox) -> Option<f64> {
    let left_hip = keypoints.get(Keypoint::LeftHip)?;
    let right_hip = keypoints.get(Keypoint::RightHip)?;
    let left_ankle = keypoints.get(Keypoint::LeftAnkle)?;
    let right_ankle = keypoints.get(Keypoint::RightAnkle)?;

    let bbox_height = bbox.height();
    if bbox_height <= 0.0 {
        return None;
    }

    let hip_y = (left_hip.y + right_hip.y) / 2.0;
    let ankle_y = (left_ankle.y + right_ankle.y) / 2.0;
    Some((ankle_y - hip_y) / bbox_height)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
