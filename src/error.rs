//! Error types for SetuIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SetuIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration is structurally valid but semantically wrong
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding failed on the bus adapter
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Relay board rejected a channel operation
    #[error("Relay error: {0}")]
    Relay(String),

    /// Worker thread panicked
    #[error("Thread panicked")]
    ThreadPanic,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
