//! Fundamental types for the HAR activity tracker.

use std::fmt;

use chrono::Utc;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier assigned upstream by the pose/object tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl From<i64> for TrackId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
///
/// Observation timestamps produced by live pipelines use the same clock, so
/// this is the natural `now` for active-track queries.
pub fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// 2D position in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        nalgebra::distance(&self.to_nalgebra(), &other.to_nalgebra())
    }
}

impl From<Position2D> for (f64, f64) {
    fn from(p: Position2D) -> Self {
        (p.x, p.y)
    }
}

/// Axis-aligned person bounding box.
///
/// Uses the same units as the keypoints. Malformed boxes (`xmax <= xmin` or
/// `ymax <= ymin`) are accepted; derived values degrade to zero or `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Box whose bottom edge is centered on `(cx, bottom)`
    pub fn from_foot_point(cx: f64, bottom: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, bottom - height, cx + width / 2.0, bottom)
    }

    pub fn center(&self) -> Position2D {
        Position2D::new(
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    /// May be zero or negative for malformed input
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// May be zero or negative for malformed input
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// 17-joint skeletal keypoint definition (COCO format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Keypoint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Keypoint {
    pub const COUNT: usize = 17;

    pub const ALL: [Keypoint; Keypoint::COUNT] = [
        Keypoint::Nose,
        Keypoint::LeftEye,
        Keypoint::RightEye,
        Keypoint::LeftEar,
        Keypoint::RightEar,
        Keypoint::LeftShoulder,
        Keypoint::RightShoulder,
        Keypoint::LeftElbow,
        Keypoint::RightElbow,
        Keypoint::LeftWrist,
        Keypoint::RightWrist,
        Keypoint::LeftHip,
        Keypoint::RightHip,
        Keypoint::LeftKnee,
        Keypoint::RightKnee,
        Keypoint::LeftAnkle,
        Keypoint::RightAnkle,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    /// Canonical snake_case joint name as emitted by pose estimators
    pub fn name(&self) -> &'static str {
        match self {
            Keypoint::Nose => "nose",
            Keypoint::LeftEye => "left_eye",
            Keypoint::RightEye => "right_eye",
            Keypoint::LeftEar => "left_ear",
            Keypoint::RightEar => "right_ear",
            Keypoint::LeftShoulder => "left_shoulder",
            Keypoint::RightShoulder => "right_shoulder",
            Keypoint::LeftElbow => "left_elbow",
            Keypoint::RightElbow => "right_elbow",
            Keypoint::LeftWrist => "left_wrist",
            Keypoint::RightWrist => "right_wrist",
            Keypoint::LeftHip => "left_hip",
            Keypoint::RightHip => "right_hip",
            Keypoint::LeftKnee => "left_knee",
            Keypoint::RightKnee => "right_knee",
            Keypoint::LeftAnkle => "left_ankle",
            Keypoint::RightAnkle => "right_ankle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kp| kp.name() == name)
    }
}

impl fmt::Display for Keypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keypoint position with confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeypointDetection {
    pub x: f64,
    pub y: f64,
    pub confidence: f32,
}

impl KeypointDetection {
    pub fn new(x: f64, y: f64, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

/// Sparse set of the 17 COCO keypoints; absent joints are `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointSet {
    points: [Option<KeypointDetection>; Keypoint::COUNT],
}

impl KeypointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, keypoint: Keypoint, x: f64, y: f64, confidence: f32) -> Self {
        self.insert(keypoint, KeypointDetection::new(x, y, confidence));
        self
    }

    pub fn insert(&mut self, keypoint: Keypoint, detection: KeypointDetection) {
        self.points[keypoint as usize] = Some(detection);
    }

    /// Insert by joint name, rejecting names outside the COCO-17 set
    pub fn insert_named(&mut self, name: &str, x: f64, y: f64, confidence: f32) -> Result<()> {
        let keypoint = Keypoint::from_name(name)
            .ok_or_else(|| Error::InvalidInput(format!("unknown keypoint name '{name}'")))?;
        self.insert(keypoint, KeypointDetection::new(x, y, confidence));
        Ok(())
    }

    pub fn remove(&mut self, keypoint: Keypoint) -> Option<KeypointDetection> {
        self.points[keypoint as usize].take()
    }

    pub fn get(&self, keypoint: Keypoint) -> Option<&KeypointDetection> {
        self.points[keypoint as usize].as_ref()
    }

    pub fn contains(&self, keypoint: Keypoint) -> bool {
        self.points[keypoint as usize].is_some()
    }

    pub fn len(&self) -> usize {
        self.points.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Keypoint, &KeypointDetection)> {
        Keypoint::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(kp, det)| det.as_ref().map(|d| (*kp, d)))
    }
}

/// One detected person in one frame, as delivered by the pose pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Seconds on a clock shared by all observations of the stream
    pub timestamp: f64,
    pub bbox: BoundingBox,
    pub keypoints: KeypointSet,
    /// Overall detection confidence
    pub confidence: f32,
}

impl Observation {
    pub fn new(timestamp: f64, bbox: BoundingBox, keypoints: KeypointSet, confidence: f32) -> Self {
        Self {
            timestamp,
            bbox,
            keypoints,
            confidence,
        }
    }
}

/// Per-frame entry of a track's rolling history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub timestamp: f64,
    pub center: Position2D,
    pub bbox: BoundingBox,
    pub keypoints: KeypointSet,
    pub confidence: f32,
}

impl PoseSample {
    pub fn from_observation(observation: &Observation) -> Self {
        Self {
            timestamp: observation.timestamp,
            center: observation.bbox.center(),
            bbox: observation.bbox,
            keypoints: observation.keypoints.clone(),
            confidence: observation.confidence,
        }
    }
}

/// Activity label assigned to a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Not enough history yet
    #[default]
    Unknown,
    Stationary,
    Moving,
    Sitting,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Unknown => "unknown",
            Activity::Stationary => "stationary",
            Activity::Moving => "moving",
            Activity::Sitting => "sitting",
        }
    }

    /// True for every label except `Unknown`
    pub fn is_known(&self) -> bool {
        !matches!(self, Activity::Unknown)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
