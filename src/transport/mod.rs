//! Transport layer for I/O abstraction

use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

mod gateway;
mod mock;
mod serial;

pub use gateway::{LineFramer, SerialGateway, MAX_LINE_LENGTH};
pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Transport shared between the gateway reader thread and engine writes
pub type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

/// Wrap a transport for sharing
pub fn shared<T: Transport + 'static>(transport: T) -> SharedTransport {
    Arc::new(Mutex::new(Box::new(transport)))
}

/// Transport trait for device communication
pub trait Transport: Send {
    /// Read available data into buffer, returns number of bytes read (0 on timeout)
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write all of `data`
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;
}
