//! JSON-lines streaming for the daemon

pub mod json_lines;
pub mod messages;

pub use json_lines::{CommandReader, JsonLinesPublisher};
pub use messages::BusCommand;
