//! Synthetic range scans from the sparse sensor ring
//!
//! The base carries six sensor pairs (one ultrasonic PING + one infrared each).
//! Each pair reports a single distance, which is painted into a 10-degree arc of
//! a 360-entry scan so obstacle-avoidance consumers can treat the ring like a
//! laser. Indices are integer degrees, 0 = front:
//!
//! ```text
//! pair  center   window (half-open)
//!   5    180     [175, 185)          rear
//!   4    304     [299, 309)
//!   3    332     [327, 337)
//!   2      0     [355, 360) + [0, 5) front center
//!   1     28     [23, 33)
//!   0     56     [51, 61)
//! ```
//!
//! The front sensors sit 11 cm apart on a base plate of radius 22.545 cm,
//! which puts them 28 degrees apart. Infrared readings are points but get the
//! same arc as the ultrasonic ones; every entry outside a window stays 0
//! ("no return").

use crate::core::types::SCAN_READINGS;

/// Number of sensor pairs on the ring
pub const SENSOR_PAIRS: usize = 6;

/// Offset between the modeled sensor origin and the real sensor (meters)
pub const SENSOR_OFFSET_M: f64 = 0.22545;

/// Angle between neighbouring front sensors (degrees)
pub const SENSOR_SEPARATION_DEG: usize = 28;

/// Width of the arc painted for each reading (degrees)
pub const SENSOR_SPREAD_DEG: usize = 10;

/// Center bearing of each pair, indexed by pair number
pub const PAIR_BEARINGS_DEG: [usize; SENSOR_PAIRS] = [
    2 * SENSOR_SEPARATION_DEG,
    SENSOR_SEPARATION_DEG,
    0,
    SCAN_READINGS - SENSOR_SEPARATION_DEG,
    SCAN_READINGS - 2 * SENSOR_SEPARATION_DEG,
    SCAN_READINGS / 2,
];

/// Paint order (rear first, then right to left across the front)
const PAINT_ORDER: [usize; SENSOR_PAIRS] = [5, 4, 3, 2, 1, 0];

/// One converted reading pair in meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangePair {
    pub ping: f32,
    pub infrared: f32,
}

impl RangePair {
    /// Convert raw centimeter readings to meters, adding the mount offset
    pub fn from_centimeters(ping_cm: i64, infrared_cm: i64) -> Self {
        Self {
            ping: centimeters_to_range(ping_cm),
            infrared: centimeters_to_range(infrared_cm),
        }
    }
}

/// Raw centimeters -> meters from the modeled sensor origin
pub fn centimeters_to_range(raw_cm: i64) -> f32 {
    (raw_cm as f64 / 100.0 + SENSOR_OFFSET_M) as f32
}

/// Scan indices covered by a sensor pair, wrapping at 360
pub fn sensor_window(pair: usize) -> impl Iterator<Item = usize> {
    let start = PAIR_BEARINGS_DEG[pair] + SCAN_READINGS - SENSOR_SPREAD_DEG / 2;
    (0..SENSOR_SPREAD_DEG).map(move |offset| (start + offset) % SCAN_READINGS)
}

/// Ultrasonic and infrared ranges synthesized from one sensor report
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedRanges {
    pub ping: Vec<f32>,
    pub infrared: Vec<f32>,
}

/// Paint six sensor pairs into two 360-entry range arrays
pub fn synthesize(pairs: &[RangePair; SENSOR_PAIRS]) -> SynthesizedRanges {
    let mut ping = vec![0.0f32; SCAN_READINGS];
    let mut infrared = vec![0.0f32; SCAN_READINGS];

    for pair in PAINT_ORDER {
        for index in sensor_window(pair) {
            ping[index] = pairs[pair].ping;
            infrared[index] = pairs[pair].infrared;
        }
    }

    SynthesizedRanges { ping, infrared }
}
