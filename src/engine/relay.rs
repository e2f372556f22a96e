//! Motor power relay board interface
//!
//! Motor power is switched through a multi-channel USB relay board driven in
//! bit-bang mode: each channel is one bit of the board's output port.
//!
//! | Channel | Mask |
//! |---------|------|
//! | 1 | 0x01 |
//! | 2 | 0x02 |
//! | 3 | 0x04 |
//! | 4 | 0x08 |
//! | 5 | 0x10 |
//! | 6 | 0x20 |
//! | 7 | 0x40 |
//! | 8 | 0x80 |
//! | all | 0xFF |
//!
//! The physical driver lives outside this crate; it plugs in through
//! [`RelayBoard`].

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;

/// Highest numbered channel on the board
pub const RELAY_CHANNEL_COUNT: u8 = 8;

const CHANNEL_NAMES: [&str; RELAY_CHANNEL_COUNT as usize] = ["1", "2", "3", "4", "5", "6", "7", "8"];

/// Addressable relay channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayChannel {
    /// Single channel, 1-based
    Channel(u8),
    /// Every channel at once
    All,
}

impl RelayChannel {
    /// Output port bitmask for this channel (0 for an out-of-range channel number)
    pub fn mask(self) -> u8 {
        match self {
            RelayChannel::Channel(n @ 1..=RELAY_CHANNEL_COUNT) => 1 << (n - 1),
            RelayChannel::Channel(_) => 0,
            RelayChannel::All => 0xFF,
        }
    }
}

impl FromStr for RelayChannel {
    type Err = String;

    /// Only the exact table names are accepted
    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        if name == "all" {
            return Ok(RelayChannel::All);
        }
        CHANNEL_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|index| RelayChannel::Channel(index as u8 + 1))
            .ok_or_else(|| {
                format!(
                    "unknown relay channel {:?} (expected 1-{} or \"all\")",
                    name, RELAY_CHANNEL_COUNT
                )
            })
    }
}

impl fmt::Display for RelayChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayChannel::Channel(n) => write!(f, "{}", n),
            RelayChannel::All => write!(f, "all"),
        }
    }
}

/// Relay hardware collaborator
pub trait RelayBoard: Send {
    /// Set the bits of `mask` on the output port (relays close)
    fn set_channel_bits(&mut self, mask: u8) -> Result<()>;

    /// Clear the bits of `mask` on the output port (relays open)
    fn clear_channel_bits(&mut self, mask: u8) -> Result<()>;
}

/// In-memory relay board for tests and dry runs
///
/// Clones share the same port byte, so a test can keep one handle while the
/// engine owns another.
#[derive(Clone, Default)]
pub struct MockRelayBoard {
    inner: std::sync::Arc<Mutex<MockRelayInner>>,
}

#[derive(Default)]
struct MockRelayInner {
    port: u8,
    operations: usize,
    fail: bool,
    /// Operations left before a single injected failure
    fail_once_after: Option<usize>,
}

impl MockRelayInner {
    /// Count an operation; true if it must fail
    fn record(&mut self) -> bool {
        self.operations += 1;
        match self.fail_once_after {
            Some(0) => {
                self.fail_once_after = None;
                true
            }
            Some(n) => {
                self.fail_once_after = Some(n - 1);
                self.fail
            }
            None => self.fail,
        }
    }
}

impl MockRelayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current output port byte
    pub fn port(&self) -> u8 {
        self.inner.lock().port
    }

    /// Number of set/clear calls received
    pub fn operations(&self) -> usize {
        self.inner.lock().operations
    }

    /// Make every following operation fail
    pub fn set_failing(&self, fail: bool) {
        let mut inner = self.inner.lock();
        inner.fail = fail;
        inner.fail_once_after = None;
    }

    /// Let `successes` more operations through, then fail exactly one
    pub fn fail_once_after(&self, successes: usize) {
        self.inner.lock().fail_once_after = Some(successes);
    }
}

impl RelayBoard for MockRelayBoard {
    fn set_channel_bits(&mut self, mask: u8) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.record() {
            return Err(Error::Relay(format!("cannot set mask 0x{:02X}", mask)));
        }
        inner.port |= mask;
        Ok(())
    }

    fn clear_channel_bits(&mut self, mask: u8) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.record() {
            return Err(Error::Relay(format!("cannot clear mask 0x{:02X}", mask)));
        }
        inner.port &= !mask;
        Ok(())
    }
}
