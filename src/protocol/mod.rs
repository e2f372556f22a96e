//! Propeller serial line protocol
//!
//! - [`line`]: Tokenizing inbound lines and classifying them by tag
//! - [`odometry`]: Translating `o` lines into pose, twist and scans
//! - [`range_scan`]: Painting the six sensor pairs into 360-degree scans
//! - [`encoder`]: Building outbound `s` and `d` commands

pub mod encoder;
pub mod line;
pub mod odometry;
pub mod range_scan;

pub use encoder::{encode_drive_geometry, encode_velocity, STOP_COMMAND};
pub use line::{LineTag, SerialLine};
pub use odometry::{OdometryError, OdometryReport, OdometryTranslator};
