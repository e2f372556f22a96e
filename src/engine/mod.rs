//! Protocol engine
//!
//! Single owner of the safety interlock, motor power controller and the
//! diagnostics line counter. Three event sources call in, possibly from
//! different threads:
//!
//! - [`ProtocolEngine::handle_line`] from the serial gateway
//! - [`ProtocolEngine::handle_velocity_command`] from the bus
//! - [`ProtocolEngine::handle_safety_signal`] from the bus
//!
//! All state lives behind one mutex. Lock order is state, then transport:
//! a command and its diagnostics mirror are written while the state lock is
//! held, so they appear on the bus and the wire as one unit.

pub mod motor_power;
pub mod relay;
pub mod safety;

use crate::config::{AppConfig, FrameConfig};
use crate::core::bus::{Bus, BusMessage};
use crate::core::types::{timestamp_us, DriveGeometry, MotorPowerState, SafetyState};
use crate::error::Result;
use crate::protocol::{
    encode_drive_geometry, encode_velocity, LineTag, OdometryTranslator, SerialLine,
};
use crate::transport::SharedTransport;
use motor_power::{MotorPowerController, MotorRelays};
use parking_lot::{Mutex, MutexGuard};
use relay::RelayBoard;
use safety::SafetyInterlock;
use serde::Serialize;
use std::sync::Arc;

/// Traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Every line handed to the engine, empty ones included
    pub lines_received: u64,
    /// Lines that were routed but could not be used
    pub lines_rejected: u64,
    pub commands_written: u64,
    pub write_failures: u64,
}

struct EngineState {
    safety: SafetyInterlock,
    motors: MotorPowerController,
    line_counter: u64,
    stats: EngineStats,
}

/// Bridges the firmware line protocol to the bus
pub struct ProtocolEngine {
    state: Mutex<EngineState>,
    transport: SharedTransport,
    bus: Arc<dyn Bus>,
    translator: OdometryTranslator,
    drive_geometry: DriveGeometry,
}

impl ProtocolEngine {
    pub fn new(
        transport: SharedTransport,
        bus: Arc<dyn Bus>,
        motors: MotorPowerController,
        drive_geometry: DriveGeometry,
        frames: FrameConfig,
    ) -> Self {
        log::info!(
            "Protocol engine created (relays: {}, track width: {} m, distance/count: {} m)",
            if motors.has_relays() { "yes" } else { "no" },
            drive_geometry.track_width,
            drive_geometry.distance_per_count
        );

        Self {
            state: Mutex::new(EngineState {
                safety: SafetyInterlock::new(),
                motors,
                line_counter: 0,
                stats: EngineStats::default(),
            }),
            transport,
            bus,
            translator: OdometryTranslator::new(frames),
            drive_geometry,
        }
    }

    /// Build an engine from application config
    ///
    /// `relay_board` is used only when the config says relays are installed;
    /// otherwise the motors are tracked in state-only mode.
    pub fn from_config(
        config: &AppConfig,
        transport: SharedTransport,
        bus: Arc<dyn Bus>,
        relay_board: Option<Box<dyn RelayBoard>>,
    ) -> Result<Self> {
        let motors = match relay_board {
            Some(board) if config.relay.installed => {
                let (left, right) = config.relay.channels()?;
                log::info!(
                    "Motor relays on channels {} (left) and {} (right)",
                    left,
                    right
                );
                MotorPowerController::with_relays(MotorRelays::new(board, left, right))
            }
            _ => MotorPowerController::state_only(),
        };

        Ok(Self::new(
            transport,
            bus,
            motors,
            config.drive_geometry.into(),
            config.frames.clone(),
        ))
    }

    /// Dispatch one line received from the firmware
    ///
    /// Never fails: bad lines are logged and counted.
    pub fn handle_line(&self, raw: &str) {
        let mut state = self.state.lock();
        state.line_counter += 1;
        state.stats.lines_received += 1;
        self.bus.publish(BusMessage::Serial {
            text: format!("{}, in:  {}", state.line_counter, raw),
        });

        let Some(line) = SerialLine::parse(raw) else {
            return;
        };

        match line.tag() {
            LineTag::Odometry => {
                if state.motors.is_on() {
                    drop(state);
                    self.publish_odometry(&line);
                } else if state.safety.is_safe() {
                    // Consumed as the power-on trigger only
                    log::debug!("Odometry line while motors off, switching on");
                    Self::switch_motors_on(&mut state);
                } else {
                    log::trace!("Odometry line ignored: unsafe and motors off");
                }
            }
            LineTag::Init => {
                if state.safety.is_safe() {
                    let command = encode_drive_geometry(&self.drive_geometry);
                    self.write_command(&mut state, &command);
                } else if let Some(message) = line.field(1) {
                    drop(state);
                    self.bus.publish(BusMessage::Status {
                        text: message.to_string(),
                    });
                } else {
                    state.stats.lines_rejected += 1;
                    log::debug!("Init line without message discarded");
                }
            }
            LineTag::Status => {
                drop(state);
                self.bus.publish(BusMessage::Status {
                    text: line.payload().to_string(),
                });
            }
            LineTag::Unknown => {
                log::trace!("Ignoring line with unknown tag: {:?}", line.field(0));
            }
        }
    }

    /// Send a velocity request to the firmware
    ///
    /// While unsafe the request is replaced by a stop command.
    pub fn handle_velocity_command(&self, linear: f64, angular: f64) {
        let mut state = self.state.lock();
        let command = encode_velocity(linear, angular, state.safety.state());
        self.write_command(&mut state, &command);
    }

    /// Apply the external safe-to-operate signal
    ///
    /// Every unsafe signal retries the switch-off while the motors are still
    /// on, so a failed relay write does not leave them powered.
    pub fn handle_safety_signal(&self, safe_to_operate: bool) {
        let mut state = self.state.lock();
        state.safety.apply_signal(safe_to_operate);
        if safe_to_operate || !state.motors.is_on() {
            return;
        }

        log::warn!("Unsafe with motors on, switching off");
        if let Err(e) = state.motors.switch_off() {
            log::error!("Failed to switch motors off: {}", e);
        }
    }

    /// Stop sequence: force the motor relays open
    ///
    /// The caller closes the transport afterwards.
    pub fn shutdown(&self) -> Result<()> {
        log::info!("Protocol engine shutting down");
        self.state.lock().motors.force_off()
    }

    pub fn safety_state(&self) -> SafetyState {
        self.state.lock().safety.state()
    }

    pub fn motor_power(&self) -> MotorPowerState {
        self.state.lock().motors.state()
    }

    /// Diagnostics line counter
    pub fn line_counter(&self) -> u64 {
        self.state.lock().line_counter
    }

    pub fn stats(&self) -> EngineStats {
        self.state.lock().stats
    }

    fn switch_motors_on(state: &mut MutexGuard<'_, EngineState>) {
        if let Err(e) = state.motors.switch_on() {
            log::error!("Failed to switch motors on: {}", e);
        }
    }

    fn publish_odometry(&self, line: &SerialLine<'_>) {
        let report = match self.translator.translate(line, timestamp_us()) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Dropping odometry line: {}", e);
                self.state.lock().stats.lines_rejected += 1;
                return;
            }
        };

        self.bus.publish(BusMessage::Transform(report.transform));
        self.bus.publish(BusMessage::Odometry(report.odometry));
        self.bus
            .publish(BusMessage::UltrasonicScan(report.ultrasonic_scan));
        self.bus.publish(BusMessage::InfraredScan(report.infrared_scan));
    }

    /// Mirror and write a command as one unit under the state lock
    fn write_command(&self, state: &mut MutexGuard<'_, EngineState>, command: &str) {
        self.bus.publish(BusMessage::Serial {
            text: format!("{}, out: {}", state.line_counter, command),
        });

        let result = {
            let mut transport = self.transport.lock();
            transport
                .write_all(command.as_bytes())
                .and_then(|_| transport.flush())
        };

        match result {
            Ok(()) => {
                state.stats.commands_written += 1;
                log::debug!("Sent command: {:?}", command);
            }
            Err(e) => {
                state.stats.write_failures += 1;
                log::error!("Failed to write command {:?}: {}", command, e);
            }
        }
    }
}
