//! Inbound bus commands
//!
//! Outbound traffic is [`crate::core::bus::BusMessage`]; this is the other
//! direction. One JSON object per line, tagged by `type`:
//!
//! ```text
//! {"type":"velocity","linear":0.2,"angular":-0.1}
//! {"type":"safety","safe":true}
//! {"type":"shutdown"}
//! ```

use serde::{Deserialize, Serialize};

/// Command delivered to the engine from the bus
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusCommand {
    /// Velocity request
    ///
    /// - `linear`: forward velocity (m/s)
    /// - `angular`: yaw rate (rad/s, positive = counter-clockwise)
    Velocity { linear: f64, angular: f64 },

    /// External safe-to-operate signal
    Safety { safe: bool },

    /// Graceful daemon shutdown
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let velocity: BusCommand =
            serde_json::from_str(r#"{"type":"velocity","linear":0.2,"angular":-0.1}"#).unwrap();
        assert_eq!(
            velocity,
            BusCommand::Velocity {
                linear: 0.2,
                angular: -0.1
            }
        );

        let safety: BusCommand = serde_json::from_str(r#"{"type":"safety","safe":false}"#).unwrap();
        assert_eq!(safety, BusCommand::Safety { safe: false });

        let shutdown: BusCommand = serde_json::from_str(r#"{"type":"shutdown"}"#).unwrap();
        assert_eq!(shutdown, BusCommand::Shutdown);
    }

    #[test]
    fn test_reject_malformed() {
        assert!(serde_json::from_str::<BusCommand>(r#"{"type":"velocity","linear":1}"#).is_err());
        assert!(serde_json::from_str::<BusCommand>(r#"{"type":"teleport"}"#).is_err());
        assert!(serde_json::from_str::<BusCommand>("velocity 1 2").is_err());
    }
}
