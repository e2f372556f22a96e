//! Outbound command encoding
//!
//! The firmware accepts comma-separated ASCII commands terminated by `\r`:
//!
//! | Command | Format | Units |
//! |---------|--------|-------|
//! | Velocity | `s,<linear>,<angular>\r` | m/s, rad/s, 3 decimals |
//! | Drive geometry | `d,<track_width>,<distance_per_count>\r` | m, m/count, 6 decimals |

use crate::core::types::{DriveGeometry, SafetyState};

/// Command terminator expected by the firmware
pub const COMMAND_TERMINATOR: char = '\r';

/// Velocity command sent whenever motion is not allowed
pub const STOP_COMMAND: &str = "s,0.000,0.000\r";

/// Encode a velocity command
///
/// While the interlock is [`SafetyState::Unsafe`] the requested values are
/// ignored and [`STOP_COMMAND`] is returned. Non-finite requests also map to
/// the stop command.
pub fn encode_velocity(linear: f64, angular: f64, safety: SafetyState) -> String {
    if safety == SafetyState::Unsafe {
        return STOP_COMMAND.to_string();
    }
    if !linear.is_finite() || !angular.is_finite() {
        log::warn!(
            "Non-finite velocity request (linear={}, angular={}), sending stop",
            linear,
            angular
        );
        return STOP_COMMAND.to_string();
    }
    format!("s,{:.3},{:.3}{}", linear, angular, COMMAND_TERMINATOR)
}

/// Encode the drive geometry configuration command
pub fn encode_drive_geometry(geometry: &DriveGeometry) -> String {
    format!(
        "d,{:.6},{:.6}{}",
        geometry.track_width, geometry.distance_per_count, COMMAND_TERMINATOR
    )
}
