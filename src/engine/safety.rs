//! Safety interlock state machine
//!
//! ```text
//! ┌──────────┐  signal(true)   ┌──────────┐
//! │  Unsafe  │ ───────────────▶│   Safe   │
//! │ (initial)│◀─────────────── │          │
//! └──────────┘  signal(false)  └──────────┘
//! ```
//!
//! The only input is the external "safe to operate" signal. Forcing the motors
//! off on the way to Unsafe is the engine's job, since it owns both machines.

use crate::core::types::SafetyState;

/// Two-state interlock driven by an external boolean signal
#[derive(Debug, Default)]
pub struct SafetyInterlock {
    state: SafetyState,
}

impl SafetyInterlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SafetyState {
        self.state
    }

    pub fn is_safe(&self) -> bool {
        self.state == SafetyState::Safe
    }

    /// Apply a signal; returns the new state if it changed
    pub fn apply_signal(&mut self, safe_to_operate: bool) -> Option<SafetyState> {
        let next = if safe_to_operate {
            SafetyState::Safe
        } else {
            SafetyState::Unsafe
        };
        if next == self.state {
            return None;
        }
        log::info!("Safety interlock: {:?} -> {:?}", self.state, next);
        self.state = next;
        Some(next)
    }
}
