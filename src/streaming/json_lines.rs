//! JSON-lines bus adapter
//!
//! The daemon speaks to the rest of the robot stack over a pair of byte
//! streams: messages go out one JSON object per line, commands come in the
//! same way. Stdout/stdin in production, in-memory buffers in tests.

use crate::core::bus::{Bus, BusMessage};
use crate::engine::ProtocolEngine;
use crate::error::Result;
use crate::streaming::messages::BusCommand;
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Bus that writes each message as one JSON line
pub struct JsonLinesPublisher<W: Write + Send> {
    writer: Mutex<W>,
    published: AtomicU64,
    failures: AtomicU64,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            published: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Messages written successfully
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Messages lost to serialization or write errors
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_message(&self, message: &BusMessage) -> Result<()> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Bus for JsonLinesPublisher<W> {
    fn publish(&self, message: BusMessage) {
        match self.write_message(&message) {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // Only the first failure is loud; a closed stdout repeats forever
                if self.failures.fetch_add(1, Ordering::Relaxed) == 0 {
                    log::error!("Failed to publish {} message: {}", message.topic(), e);
                } else {
                    log::trace!("Failed to publish {} message: {}", message.topic(), e);
                }
            }
        }
    }
}

/// Feeds JSON-lines commands to the engine
pub struct CommandReader {
    engine: Arc<ProtocolEngine>,
    running: Arc<AtomicBool>,
}

impl CommandReader {
    /// `running` is cleared when a shutdown command arrives
    pub fn new(engine: Arc<ProtocolEngine>, running: Arc<AtomicBool>) -> Self {
        Self { engine, running }
    }

    /// Read commands until end of input, a shutdown command, or `running`
    /// going false
    ///
    /// Malformed lines are logged and skipped.
    pub fn run<R: BufRead>(&self, reader: R) -> Result<()> {
        for line in reader.lines() {
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<BusCommand>(line) {
                Ok(BusCommand::Shutdown) => {
                    log::info!("Shutdown command received");
                    self.running.store(false, Ordering::Relaxed);
                    break;
                }
                Ok(command) => self.dispatch(command),
                Err(e) => log::warn!("Ignoring malformed command {:?}: {}", line, e),
            }
        }

        log::debug!("Command reader finished");
        Ok(())
    }

    fn dispatch(&self, command: BusCommand) {
        log::debug!("Command: {:?}", command);
        match command {
            BusCommand::Velocity { linear, angular } => {
                self.engine.handle_velocity_command(linear, angular)
            }
            BusCommand::Safety { safe } => self.engine.handle_safety_signal(safe),
            BusCommand::Shutdown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameConfig;
    use crate::core::bus::RecordingBus;
    use crate::core::types::{DriveGeometry, SafetyState};
    use crate::engine::motor_power::MotorPowerController;
    use crate::transport::{shared, MockTransport};
    use std::io::Cursor;

    fn engine_with(transport: &MockTransport) -> Arc<ProtocolEngine> {
        Arc::new(ProtocolEngine::new(
            shared(transport.clone()),
            Arc::new(RecordingBus::new()),
            MotorPowerController::state_only(),
            DriveGeometry::default(),
            FrameConfig::default(),
        ))
    }

    #[test]
    fn test_publisher_writes_one_line_per_message() {
        let publisher = JsonLinesPublisher::new(Vec::new());
        publisher.publish(BusMessage::Status {
            text: "Arlo ready".to_string(),
        });
        publisher.publish(BusMessage::Serial {
            text: "1, in:  s\tArlo ready".to_string(),
        });
        assert_eq!(publisher.published(), 2);

        let output = String::from_utf8(publisher.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"topic":"status","text":"Arlo ready"}"#);

        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["topic"], "serial");
        assert_eq!(value["text"], "1, in:  s\tArlo ready");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_publisher_counts_failures() {
        let publisher = JsonLinesPublisher::new(BrokenPipe);
        for _ in 0..3 {
            publisher.publish(BusMessage::Status {
                text: "lost".to_string(),
            });
        }
        assert_eq!(publisher.published(), 0);
        assert_eq!(publisher.failures(), 3);
    }

    #[test]
    fn test_reader_dispatches_commands() {
        let transport = MockTransport::new();
        let engine = engine_with(&transport);
        let running = Arc::new(AtomicBool::new(true));
        let reader = CommandReader::new(Arc::clone(&engine), Arc::clone(&running));

        let input = concat!(
            "{\"type\":\"safety\",\"safe\":true}\n",
            "\n",
            "not json\n",
            "{\"type\":\"velocity\",\"linear\":0.25,\"angular\":0.5}\n",
        );
        reader.run(Cursor::new(input)).unwrap();

        assert_eq!(engine.safety_state(), SafetyState::Safe);
        assert_eq!(transport.written_string(), "s,0.250,0.500\r");
        assert!(running.load(Ordering::Relaxed));
    }

    #[test]
    fn test_reader_stops_on_shutdown() {
        let transport = MockTransport::new();
        let engine = engine_with(&transport);
        let running = Arc::new(AtomicBool::new(true));
        let reader = CommandReader::new(engine, Arc::clone(&running));

        let input = concat!(
            "{\"type\":\"shutdown\"}\n",
            "{\"type\":\"velocity\",\"linear\":0.25,\"angular\":0.5}\n",
        );
        reader.run(Cursor::new(input)).unwrap();

        assert!(!running.load(Ordering::Relaxed));
        assert!(transport.get_written().is_empty());
    }
}
