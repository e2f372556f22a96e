//! Core data types produced by the protocol engine.
//!
//! Pose and velocity values use `f64` (the firmware prints them with full
//! precision); scan ranges use `f32` like any laser scan consumer expects.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Number of entries in a synthesized range scan (one per integer degree)
pub const SCAN_READINGS: usize = 360;

/// Closest range the sensors report reliably (meters)
pub const SCAN_RANGE_MIN: f32 = 0.02;

/// Farthest range the sensors report reliably (meters)
pub const SCAN_RANGE_MAX: f32 = 3.0;

/// Current wall-clock time in microseconds since the Unix epoch
pub fn timestamp_us() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// 2D pose (position and heading)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f64,
    /// Y position in meters
    pub y: f64,
    /// Heading in radians (odometry-based)
    pub theta: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }
}

/// Orientation quaternion
///
/// Built only from a planar heading, so `x` and `y` are always zero and the
/// quaternion is unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    /// Rotation of `theta` radians about the vertical axis
    pub fn from_yaw(theta: f64) -> Self {
        let half = theta / 2.0;
        Self {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        }
    }

    /// Euclidean norm (1.0 for every quaternion built by [`Quaternion::from_yaw`])
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }
}

/// Planar velocity (no lateral component)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twist2D {
    /// Forward velocity in m/s
    pub linear_x: f64,
    /// Lateral velocity in m/s (always 0 for a differential drive)
    pub linear_y: f64,
    /// Rotation rate in rad/s
    pub angular_z: f64,
}

impl Twist2D {
    pub fn new(linear: f64, angular: f64) -> Self {
        Self {
            linear_x: linear,
            linear_y: 0.0,
            angular_z: angular,
        }
    }
}

/// Transform update for the coordinate-frame tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStamped {
    pub timestamp_us: u64,
    pub parent_frame: String,
    pub child_frame: String,
    /// Translation (x, y, z) in meters
    pub translation: [f64; 3],
    pub rotation: Quaternion,
}

/// Combined pose + twist record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Odometry {
    pub timestamp_us: u64,
    pub frame_id: String,
    pub child_frame_id: String,
    pub pose: Pose2D,
    /// Pose z is always 0
    pub position_z: f64,
    pub orientation: Quaternion,
    pub twist: Twist2D,
}

/// Synthetic 360-degree range scan
///
/// `ranges[i]` is the distance at integer degree `i`. A value of 0 means
/// "no return", never "obstacle at zero distance".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeScan {
    pub timestamp_us: u64,
    pub frame_id: String,
    pub angle_min: f64,
    pub angle_max: f64,
    pub angle_increment: f64,
    pub time_increment: f64,
    pub scan_time: f64,
    pub range_min: f32,
    pub range_max: f32,
    pub ranges: Vec<f32>,
}

impl RangeScan {
    /// Wrap synthesized ranges with the fixed full-circle metadata
    pub fn new(frame_id: &str, timestamp_us: u64, ranges: Vec<f32>) -> Self {
        Self {
            timestamp_us,
            frame_id: frame_id.to_string(),
            angle_min: 0.0,
            angle_max: TAU,
            angle_increment: TAU / SCAN_READINGS as f64,
            time_increment: 0.0,
            scan_time: 1.0,
            range_min: SCAN_RANGE_MIN,
            range_max: SCAN_RANGE_MAX,
            ranges,
        }
    }

    /// Indices holding a return (non-zero range)
    pub fn covered_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| **r != 0.0)
            .map(|(i, _)| i)
    }
}

/// Safety interlock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SafetyState {
    #[default]
    Unsafe,
    Safe,
}

/// Motor power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotorPowerState {
    #[default]
    Off,
    On,
}

/// Physical drive constants sent to the firmware on request
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriveGeometry {
    /// Wheel track width in meters
    pub track_width: f64,
    /// Distance traveled per encoder count in meters
    pub distance_per_count: f64,
}
