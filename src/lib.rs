//! SetuIO - serial protocol bridge for the ArloBot Propeller base
//!
//! The [`engine::ProtocolEngine`] parses the firmware's tab-delimited line
//! protocol, tracks the safety interlock and motor power, turns odometry lines
//! into pose, twist and synthetic range scans, and encodes velocity and drive
//! geometry commands back onto the wire.
//!
//! Transport, bus and relay hardware are injected, so everything here can be
//! driven from tests with [`transport::MockTransport`],
//! [`core::bus::RecordingBus`] and [`engine::relay::MockRelayBoard`].

pub mod app;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod streaming;
pub mod transport;

// Re-export commonly used types
pub use app::SetuApp;
pub use config::AppConfig;
pub use engine::{EngineStats, ProtocolEngine};
pub use error::{Error, Result};
