//! Application orchestration for the SetuIO daemon
//!
//! Opens the serial port, wires the engine between the serial gateway and the
//! JSON-lines bus, and runs the stop sequence on shutdown.

use crate::config::AppConfig;
use crate::engine::ProtocolEngine;
use crate::error::{Error, Result};
use crate::streaming::{CommandReader, JsonLinesPublisher};
use crate::transport::{shared, SerialGateway, SerialTransport};
use log::{debug, error, info, warn};
use std::io::Stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// Main application structure that manages all components
pub struct SetuApp {
    engine: Arc<ProtocolEngine>,
    gateway: SerialGateway,
    publisher: Arc<JsonLinesPublisher<Stdout>>,
    running: Arc<AtomicBool>,
    stopped: bool,
}

impl SetuApp {
    /// Create the application from validated config
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing SetuIO application");
        config.validate()?;

        let transport = shared(SerialTransport::open(
            &config.serial.port,
            config.serial.baud_rate,
        )?);

        if config.relay.installed {
            warn!(
                "Relay board {:?} configured but no relay driver is available; tracking motor power only",
                config.relay.serial_number
            );
        }

        let publisher = Arc::new(JsonLinesPublisher::new(std::io::stdout()));
        let engine = Arc::new(ProtocolEngine::from_config(
            &config,
            Arc::clone(&transport),
            publisher.clone(),
            None,
        )?);
        let gateway = SerialGateway::new(transport);

        info!("✓ Serial port and bus initialized");

        Ok(Self {
            engine,
            gateway,
            publisher,
            running: Arc::new(AtomicBool::new(true)),
            stopped: false,
        })
    }

    /// Start the reader threads and block until shutdown
    pub fn run(&mut self) -> Result<()> {
        self.setup_signal_handler()?;

        let engine = Arc::clone(&self.engine);
        self.gateway.start(move |line| engine.handle_line(line))?;

        self.start_command_reader()?;

        info!("✓ All threads started, press Ctrl+C to stop");

        let mut last_stats = Instant::now();
        while self.running.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(100));

            if last_stats.elapsed() >= STATS_INTERVAL {
                self.log_statistics();
                last_stats = Instant::now();
            }
        }

        info!("Shutdown requested, stopping...");
        self.stop()
    }

    fn setup_signal_handler(&self) -> Result<()> {
        let running = Arc::clone(&self.running);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::Relaxed);
        })
        .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))
    }

    /// Commands arrive on stdin; the thread is left detached since the read
    /// blocks until input or EOF
    fn start_command_reader(&self) -> Result<()> {
        let reader = CommandReader::new(Arc::clone(&self.engine), Arc::clone(&self.running));

        std::thread::Builder::new()
            .name("command-reader".to_string())
            .spawn(move || {
                debug!("Command reader thread started");
                let stdin = std::io::stdin();
                if let Err(e) = reader.run(stdin.lock()) {
                    error!("Command reader failed: {}", e);
                }
                debug!("Command reader thread exiting");
            })?;

        info!("✓ Command reader started");
        Ok(())
    }

    fn log_statistics(&self) {
        let stats = self.engine.stats();
        info!(
            "Lines: rx={} rejected={} | Commands: tx={} failed={} | Bus: published={} failed={} | Safety={:?} Motors={:?}",
            stats.lines_received,
            stats.lines_rejected,
            stats.commands_written,
            stats.write_failures,
            self.publisher.published(),
            self.publisher.failures(),
            self.engine.safety_state(),
            self.engine.motor_power()
        );
    }

    /// Stop sequence: motors off, then close the serial side
    fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.running.store(false, Ordering::Relaxed);

        if let Err(e) = self.engine.shutdown() {
            error!("Failed to switch motors off: {}", e);
        }
        self.gateway.stop()?;

        info!("✓ SetuIO stopped");
        Ok(())
    }
}

impl Drop for SetuApp {
    fn drop(&mut self) {
        debug!("SetuApp cleaning up...");
        if let Err(e) = self.stop() {
            error!("Error during cleanup: {}", e);
        }
    }
}
