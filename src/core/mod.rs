//! Core abstractions shared across the crate.
//!
//! - [`types`]: Pose, twist, scan and state types produced by the engine
//! - [`bus::Bus`]: Trait the engine publishes its output through

pub mod bus;
pub mod types;
