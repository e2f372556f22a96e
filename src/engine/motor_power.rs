//! Motor power tracking and relay switching

use super::relay::{RelayBoard, RelayChannel};
use crate::core::types::MotorPowerState;
use crate::error::Result;

/// Relay board plus the two channels wired to the drive motors
pub struct MotorRelays {
    board: Box<dyn RelayBoard>,
    left: RelayChannel,
    right: RelayChannel,
}

impl MotorRelays {
    pub fn new(board: Box<dyn RelayBoard>, left: RelayChannel, right: RelayChannel) -> Self {
        Self { board, left, right }
    }

    /// Close both relays, or leave both open
    fn close(&mut self) -> Result<()> {
        let result = self
            .board
            .set_channel_bits(self.left.mask())
            .and_then(|_| self.board.set_channel_bits(self.right.mask()));

        if result.is_err() {
            if let Err(e) = self.open() {
                log::error!("Failed to reopen motor relays after failed close: {}", e);
            }
        }
        result
    }

    /// Open both relays; the second is tried even if the first fails
    fn open(&mut self) -> Result<()> {
        let left = self.board.clear_channel_bits(self.left.mask());
        let right = self.board.clear_channel_bits(self.right.mask());
        left.and(right)
    }
}

/// Tracks motor power and drives the relays when a board is present
///
/// Without relays the controller only flips its own state flag. The safety
/// guard for switching on belongs to the caller; this type does not check it.
pub struct MotorPowerController {
    state: MotorPowerState,
    relays: Option<MotorRelays>,
}

impl MotorPowerController {
    /// Controller that assumes every switch succeeds
    pub fn state_only() -> Self {
        Self {
            state: MotorPowerState::Off,
            relays: None,
        }
    }

    /// Controller that switches the given relays
    pub fn with_relays(relays: MotorRelays) -> Self {
        Self {
            state: MotorPowerState::Off,
            relays: Some(relays),
        }
    }

    pub fn state(&self) -> MotorPowerState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == MotorPowerState::On
    }

    pub fn has_relays(&self) -> bool {
        self.relays.is_some()
    }

    /// Switch motors on
    ///
    /// Returns `Ok(true)` if the state changed. Already on is a no-op. On relay
    /// failure the state stays Off and the error is returned.
    pub fn switch_on(&mut self) -> Result<bool> {
        if self.is_on() {
            return Ok(false);
        }
        if let Some(relays) = self.relays.as_mut() {
            relays.close()?;
        }
        self.state = MotorPowerState::On;
        log::info!("Motors switched on");
        Ok(true)
    }

    /// Switch motors off
    ///
    /// Returns `Ok(true)` if the state changed. Already off is a no-op.
    pub fn switch_off(&mut self) -> Result<bool> {
        if !self.is_on() {
            return Ok(false);
        }
        self.force_off()?;
        Ok(true)
    }

    /// Open the relays regardless of the tracked state
    ///
    /// Used by the stop sequence, where the relays may have been left closed by
    /// an earlier process.
    pub fn force_off(&mut self) -> Result<()> {
        if let Some(relays) = self.relays.as_mut() {
            relays.open()?;
        }
        if self.is_on() {
            log::info!("Motors switched off");
        }
        self.state = MotorPowerState::Off;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::relay::MockRelayBoard;
    use crate::error::Error;

    fn relay_controller(left: &str, right: &str) -> (MotorPowerController, MockRelayBoard) {
        let board = MockRelayBoard::new();
        let relays = MotorRelays::new(
            Box::new(board.clone()),
            left.parse().unwrap(),
            right.parse().unwrap(),
        );
        (MotorPowerController::with_relays(relays), board)
    }

    #[test]
    fn test_state_only_mode() {
        let mut motors = MotorPowerController::state_only();
        assert_eq!(motors.state(), MotorPowerState::Off);
        assert!(!motors.has_relays());

        assert!(motors.switch_on().unwrap());
        assert!(motors.is_on());
        assert!(!motors.switch_on().unwrap());

        assert!(motors.switch_off().unwrap());
        assert!(!motors.switch_off().unwrap());
        assert_eq!(motors.state(), MotorPowerState::Off);
    }

    #[test]
    fn test_relay_bits_follow_power() {
        let (mut motors, board) = relay_controller("1", "2");

        motors.switch_on().unwrap();
        assert_eq!(board.port(), 0x03);

        motors.switch_off().unwrap();
        assert_eq!(board.port(), 0x00);
    }

    #[test]
    fn test_switch_on_twice_touches_relays_once() {
        let (mut motors, board) = relay_controller("5", "8");

        motors.switch_on().unwrap();
        motors.switch_on().unwrap();
        assert_eq!(board.port(), 0x90);
        assert_eq!(board.operations(), 2);
    }

    #[test]
    fn test_relay_failure_keeps_state() {
        let (mut motors, board) = relay_controller("1", "2");
        board.set_failing(true);

        let err = motors.switch_on().unwrap_err();
        assert!(matches!(err, Error::Relay(_)));
        assert_eq!(motors.state(), MotorPowerState::Off);
    }

    #[test]
    fn test_partial_close_reopens_first_relay() {
        let (mut motors, board) = relay_controller("1", "2");
        board.fail_once_after(1);

        assert!(motors.switch_on().is_err());
        assert_eq!(motors.state(), MotorPowerState::Off);
        assert_eq!(board.port(), 0x00);
    }

    #[test]
    fn test_force_off_clears_relays_even_when_off() {
        let (mut motors, board) = relay_controller("3", "4");
        let mut raw = board.clone();
        raw.set_channel_bits(0x0C).unwrap();

        motors.force_off().unwrap();
        assert_eq!(board.port(), 0x00);
        assert_eq!(motors.state(), MotorPowerState::Off);
    }
}
