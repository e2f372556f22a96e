//! Test utilities for SetuIO engine scenarios.
//!
//! Builds engines wired to in-memory doubles and formats firmware lines.

#![allow(dead_code)]

use setu_io::config::FrameConfig;
use setu_io::core::bus::RecordingBus;
use setu_io::core::types::DriveGeometry;
use setu_io::engine::motor_power::{MotorPowerController, MotorRelays};
use setu_io::engine::relay::MockRelayBoard;
use setu_io::transport::{shared, MockTransport};
use setu_io::ProtocolEngine;
use std::sync::Arc;

/// Geometry of a stock ArloBot
pub const ARLO_GEOMETRY: DriveGeometry = DriveGeometry {
    track_width: 0.403,
    distance_per_count: 0.000428,
};

/// Engine plus handles on every double it talks to
pub struct Harness {
    pub engine: Arc<ProtocolEngine>,
    pub bus: Arc<RecordingBus>,
    pub transport: MockTransport,
    pub relays: Option<MockRelayBoard>,
}

/// Engine tracking motor power without relay hardware
pub fn state_only_harness() -> Harness {
    let bus = Arc::new(RecordingBus::new());
    let transport = MockTransport::new();
    let engine = ProtocolEngine::new(
        shared(transport.clone()),
        bus.clone(),
        MotorPowerController::state_only(),
        ARLO_GEOMETRY,
        FrameConfig::default(),
    );
    Harness {
        engine: Arc::new(engine),
        bus,
        transport,
        relays: None,
    }
}

/// Engine switching the motors through relay channels 1 and 2
pub fn relay_harness() -> Harness {
    let bus = Arc::new(RecordingBus::new());
    let transport = MockTransport::new();
    let board = MockRelayBoard::new();
    let relays = MotorRelays::new(
        Box::new(board.clone()),
        "1".parse().unwrap(),
        "2".parse().unwrap(),
    );
    let engine = ProtocolEngine::new(
        shared(transport.clone()),
        bus.clone(),
        MotorPowerController::with_relays(relays),
        ARLO_GEOMETRY,
        FrameConfig::default(),
    );
    Harness {
        engine: Arc::new(engine),
        bus,
        transport,
        relays: Some(board),
    }
}

/// Build an `o` line; `sensors` holds (ping, infrared) centimeters per pair
pub fn odometry_line(
    x: f64,
    y: f64,
    theta: f64,
    vx: f64,
    omega: f64,
    sensors: [(i64, i64); 6],
) -> String {
    let mut fields = vec![
        "o".to_string(),
        x.to_string(),
        y.to_string(),
        theta.to_string(),
        theta.to_string(),
        vx.to_string(),
        omega.to_string(),
    ];
    for (ping, infrared) in sensors {
        fields.push(ping.to_string());
        fields.push(infrared.to_string());
    }
    fields.join("\t")
}

/// Odometry line at the origin with every sensor reading `cm`
pub fn uniform_odometry_line(cm: i64) -> String {
    odometry_line(0.0, 0.0, 0.0, 0.0, 0.0, [(cm, cm); 6])
}

/// Messages other than the serial mirror, as topic names
pub fn output_topics(bus: &RecordingBus) -> Vec<&'static str> {
    bus.messages()
        .iter()
        .map(|m| m.topic())
        .filter(|t| *t != "serial")
        .collect()
}
