//! Bus collaborator interface
//!
//! The engine never talks to a publish/subscribe system directly. Everything it
//! produces is handed to a [`Bus`] as a [`BusMessage`]; the daemon plugs in a
//! JSON-lines publisher, tests plug in a [`RecordingBus`].

use crate::core::types::{Odometry, RangeScan, TransformStamped};
use parking_lot::Mutex;
use serde::Serialize;

/// Outbound message published by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum BusMessage {
    /// Raw serial traffic mirror, prefixed with the line counter
    Serial { text: String },
    /// Free-form status text from the firmware
    Status { text: String },
    /// Parent -> child frame transform
    #[serde(rename = "tf")]
    Transform(TransformStamped),
    /// Pose + twist record
    #[serde(rename = "odom")]
    Odometry(Odometry),
    /// Scan synthesized from the ultrasonic (PING) sensors
    UltrasonicScan(RangeScan),
    /// Scan synthesized from the infrared sensors
    InfraredScan(RangeScan),
}

impl BusMessage {
    /// Topic name this message is published on
    pub fn topic(&self) -> &'static str {
        match self {
            BusMessage::Serial { .. } => "serial",
            BusMessage::Status { .. } => "status",
            BusMessage::Transform(_) => "tf",
            BusMessage::Odometry(_) => "odom",
            BusMessage::UltrasonicScan(_) => "ultrasonic_scan",
            BusMessage::InfraredScan(_) => "infrared_scan",
        }
    }
}

/// Sink for engine output
///
/// Implementations must not call back into the engine from `publish`: the
/// serial mirror is published while the engine holds its state lock.
pub trait Bus: Send + Sync {
    fn publish(&self, message: BusMessage);
}

/// Bus that keeps every published message in memory
#[derive(Default)]
pub struct RecordingBus {
    messages: Mutex<Vec<BusMessage>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages published so far
    pub fn messages(&self) -> Vec<BusMessage> {
        self.messages.lock().clone()
    }

    /// Messages on one topic
    pub fn on_topic(&self, topic: &str) -> Vec<BusMessage> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.topic() == topic)
            .cloned()
            .collect()
    }

    /// Texts of status messages
    pub fn status_texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match m {
                BusMessage::Status { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts of serial mirror messages
    pub fn serial_texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match m {
                BusMessage::Serial { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Bus for RecordingBus {
    fn publish(&self, message: BusMessage) {
        self.messages.lock().push(message);
    }
}
