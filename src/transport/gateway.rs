//! Serial line gateway
//!
//! Owns the reader thread that pulls bytes from the shared transport, frames
//! them into lines and hands each line to a callback. Writers lock the same
//! transport between reads, so the read lock is held only for one poll.

use super::SharedTransport;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Longest line kept; anything longer is line noise and is dropped
pub const MAX_LINE_LENGTH: usize = 1024;

const READ_CHUNK: usize = 256;
const IDLE_SLEEP_MS: u64 = 2;
const ERROR_BACKOFF_MS: u64 = 100;

/// Splits a byte stream into `\n` terminated lines
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    discarding: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line completed by them
    ///
    /// A trailing `\r` is stripped. Invalid UTF-8 is replaced rather than
    /// rejected; the parser downstream decides what the line means.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in data {
            if byte == b'\n' {
                if self.discarding {
                    self.discarding = false;
                } else {
                    if self.buffer.last() == Some(&b'\r') {
                        self.buffer.pop();
                    }
                    lines.push(String::from_utf8_lossy(&self.buffer).into_owned());
                }
                self.buffer.clear();
                continue;
            }

            if self.discarding {
                continue;
            }

            self.buffer.push(byte);
            if self.buffer.len() > MAX_LINE_LENGTH {
                log::warn!(
                    "Dropping serial line longer than {} bytes",
                    MAX_LINE_LENGTH
                );
                self.buffer.clear();
                self.discarding = true;
            }
        }

        lines
    }

    /// Bytes of the line still being assembled
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Reader thread bridging the transport to a line callback
pub struct SerialGateway {
    transport: SharedTransport,
    shutdown: Arc<AtomicBool>,
    reader_handle: Option<JoinHandle<()>>,
}

impl SerialGateway {
    pub fn new(transport: SharedTransport) -> Self {
        Self {
            transport,
            shutdown: Arc::new(AtomicBool::new(false)),
            reader_handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.reader_handle.is_some()
    }

    /// Spawn the reader thread
    pub fn start<F>(&mut self, on_line: F) -> Result<()>
    where
        F: Fn(&str) + Send + 'static,
    {
        if self.reader_handle.is_some() {
            return Err(Error::Other("Serial gateway already running".to_string()));
        }

        self.shutdown.store(false, Ordering::Relaxed);
        let transport = Arc::clone(&self.transport);
        let shutdown = Arc::clone(&self.shutdown);

        self.reader_handle = Some(
            thread::Builder::new()
                .name("serial-reader".to_string())
                .spawn(move || reader_loop(transport, shutdown, on_line))
                .map_err(|e| Error::Other(format!("Failed to spawn reader thread: {}", e)))?,
        );

        log::info!("Serial gateway started");
        Ok(())
    }

    /// Stop the reader thread and flush the transport
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.reader_handle.take() else {
            return Ok(());
        };

        log::info!("Stopping serial gateway...");
        self.shutdown.store(true, Ordering::Relaxed);
        handle.join().map_err(|_| Error::ThreadPanic)?;

        self.transport.lock().flush()?;
        log::info!("Serial gateway stopped");
        Ok(())
    }
}

impl Drop for SerialGateway {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Serial gateway stop failed: {}", e);
        }
    }
}

fn reader_loop<F>(transport: SharedTransport, shutdown: Arc<AtomicBool>, on_line: F)
where
    F: Fn(&str),
{
    let mut framer = LineFramer::new();
    let mut buffer = [0u8; READ_CHUNK];

    log::debug!("Serial reader thread running");

    while !shutdown.load(Ordering::Relaxed) {
        // Guard dropped before dispatch: the callback writes to the same transport
        let read = transport.lock().read(&mut buffer);

        match read {
            Ok(0) => thread::sleep(Duration::from_millis(IDLE_SLEEP_MS)),
            Ok(n) => {
                for line in framer.push(&buffer[..n]) {
                    on_line(&line);
                }
            }
            Err(e) => {
                log::error!("Serial read error: {}", e);
                thread::sleep(Duration::from_millis(ERROR_BACKOFF_MS));
            }
        }
    }

    log::debug!("Serial reader thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{shared, MockTransport};
    use parking_lot::Mutex;
    use std::time::Instant;

    #[test]
    fn test_framer_splits_lines() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"s\tArlo").is_empty());
        assert_eq!(framer.pending(), 6);

        let lines = framer.push(b" ready\r\ni\tinit\n\n");
        assert_eq!(lines, vec!["s\tArlo ready", "i\tinit", ""]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_framer_drops_long_lines() {
        let mut framer = LineFramer::new();
        let noise = vec![b'x'; MAX_LINE_LENGTH + 10];

        assert!(framer.push(&noise).is_empty());
        assert_eq!(framer.pending(), 0);

        // The rest of the long line is discarded up to its terminator
        let lines = framer.push(b"yyy\ns\tok\n");
        assert_eq!(lines, vec!["s\tok"]);
    }

    #[test]
    fn test_framer_keeps_line_at_limit() {
        let mut framer = LineFramer::new();
        let mut data = vec![b'a'; MAX_LINE_LENGTH];
        data.push(b'\n');

        let lines = framer.push(&data);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_LINE_LENGTH);
    }

    #[test]
    fn test_gateway_delivers_lines() {
        let mock = MockTransport::new();
        mock.inject_read(b"s\tfirst\ns\tsecond\n");

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut gateway = SerialGateway::new(shared(mock.clone()));
        gateway
            .start(move |line| sink.lock().push(line.to_string()))
            .unwrap();
        assert!(gateway.is_running());
        assert!(gateway.start(|_| {}).is_err());

        let deadline = Instant::now() + Duration::from_secs(2);
        while received.lock().len() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        gateway.stop().unwrap();
        assert!(!gateway.is_running());
        assert_eq!(*received.lock(), vec!["s\tfirst", "s\tsecond"]);
    }

    #[test]
    fn test_stop_without_start() {
        let mut gateway = SerialGateway::new(shared(MockTransport::new()));
        assert!(gateway.stop().is_ok());
    }
}
