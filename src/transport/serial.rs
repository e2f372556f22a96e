//! Serial transport implementation

use super::Transport;
use crate::error::Result;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Read timeout; keeps the gateway responsive to shutdown and lets writers in
const READ_TIMEOUT_MS: u64 = 10;

/// Serial transport for the Propeller board UART
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open the board's serial port, 8N1 without flow control
    ///
    /// Whatever the firmware printed before we attached is discarded so the
    /// first framed line starts clean.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()
            .map_err(|e| {
                log::error!("Cannot open {} at {} baud: {}", path, baud_rate, e);
                e
            })?;

        let stale = port.bytes_to_read().unwrap_or(0);
        if let Err(e) = port.clear(ClearBuffer::Input) {
            log::warn!("Could not flush stale input on {}: {}", path, e);
        } else if stale > 0 {
            log::debug!("Discarded {} stale bytes on {}", stale, path);
        }

        log::info!("Serial link to Propeller board on {} ({} baud)", path, baud_rate);
        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }
}
