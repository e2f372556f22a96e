//! Odometry line translation
//!
//! Turns one `o` line into everything downstream consumers need: a transform
//! update, a pose + twist record and the two synthetic range scans.
//!
//! # Field layout
//!
//! | Index | Field | Unit |
//! |-------|-------|------|
//! | 1, 2 | x, y | m |
//! | 3 | theta (odometry heading) | rad |
//! | 4 | theta (gyro heading, not used for pose) | rad |
//! | 5 | linear velocity | m/s |
//! | 6 | angular velocity | rad/s |
//! | 7..=18 | ping0, ir0, ..., ping5, ir5 | cm (integers) |
//!
//! Translation is all-or-nothing: the whole line is validated before any
//! output is built, so a bad sensor field never yields a half-published pose.

use super::line::SerialLine;
use super::range_scan::{synthesize, RangePair, SENSOR_PAIRS};
use crate::config::FrameConfig;
use crate::core::types::{Odometry, Pose2D, Quaternion, RangeScan, TransformStamped, Twist2D};

/// Fields an odometry line must carry (tag + 6 odometry + 12 sensor)
pub const ODOMETRY_LINE_FIELDS: usize = 19;

/// First sensor field index
const SENSOR_FIELDS_START: usize = 7;

/// Reason an odometry line was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OdometryError {
    #[error("odometry line has {actual} fields, expected at least {expected}")]
    TooFewFields { expected: usize, actual: usize },

    #[error("field {index} is not a valid number: {field:?}")]
    InvalidNumber { index: usize, field: String },
}

/// Everything produced from one odometry line
#[derive(Debug, Clone, PartialEq)]
pub struct OdometryReport {
    pub pose: Pose2D,
    pub orientation: Quaternion,
    pub twist: Twist2D,
    /// Gyro-based heading as reported; carried along, never fused into the pose
    pub heading_gyro: f64,
    pub transform: TransformStamped,
    pub odometry: Odometry,
    pub ultrasonic_scan: RangeScan,
    pub infrared_scan: RangeScan,
}

/// Converts odometry lines into pose, twist and scan records
#[derive(Debug, Clone)]
pub struct OdometryTranslator {
    frames: FrameConfig,
}

impl OdometryTranslator {
    pub fn new(frames: FrameConfig) -> Self {
        Self { frames }
    }

    /// Translate an `o` line stamped with `timestamp_us`
    pub fn translate(
        &self,
        line: &SerialLine<'_>,
        timestamp_us: u64,
    ) -> Result<OdometryReport, OdometryError> {
        if line.field_count() < ODOMETRY_LINE_FIELDS {
            return Err(OdometryError::TooFewFields {
                expected: ODOMETRY_LINE_FIELDS,
                actual: line.field_count(),
            });
        }

        let x = parse_float(line, 1)?;
        let y = parse_float(line, 2)?;
        let theta = parse_float(line, 3)?;
        let heading_gyro = parse_float(line, 4)?;
        let vx = parse_float(line, 5)?;
        let omega = parse_float(line, 6)?;

        let mut pairs = [RangePair::default(); SENSOR_PAIRS];
        for (pair, slot) in pairs.iter_mut().enumerate() {
            let ping_index = SENSOR_FIELDS_START + 2 * pair;
            *slot = RangePair::from_centimeters(
                parse_int(line, ping_index)?,
                parse_int(line, ping_index + 1)?,
            );
        }

        let pose = Pose2D::new(x, y, theta);
        let orientation = Quaternion::from_yaw(theta);
        let twist = Twist2D::new(vx, omega);
        let ranges = synthesize(&pairs);

        let transform = TransformStamped {
            timestamp_us,
            parent_frame: self.frames.odom.clone(),
            child_frame: self.frames.base_footprint.clone(),
            translation: [x, y, 0.0],
            rotation: orientation,
        };

        let odometry = Odometry {
            timestamp_us,
            frame_id: self.frames.odom.clone(),
            child_frame_id: self.frames.base_link.clone(),
            pose,
            position_z: 0.0,
            orientation,
            twist,
        };

        Ok(OdometryReport {
            pose,
            orientation,
            twist,
            heading_gyro,
            transform,
            odometry,
            ultrasonic_scan: RangeScan::new(
                &self.frames.ping_sensor_array,
                timestamp_us,
                ranges.ping,
            ),
            infrared_scan: RangeScan::new(
                &self.frames.ir_sensor_array,
                timestamp_us,
                ranges.infrared,
            ),
        })
    }
}

fn parse_float(line: &SerialLine<'_>, index: usize) -> Result<f64, OdometryError> {
    let field = line.field(index).unwrap_or_default();
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| OdometryError::InvalidNumber {
            index,
            field: field.to_string(),
        })
}

fn parse_int(line: &SerialLine<'_>, index: usize) -> Result<i64, OdometryError> {
    let field = line.field(index).unwrap_or_default();
    field
        .trim()
        .parse::<i64>()
        .map_err(|_| OdometryError::InvalidNumber {
            index,
            field: field.to_string(),
        })
}
