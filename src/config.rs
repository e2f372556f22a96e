//! Configuration for SetuIO
//!
//! Loads configuration from a TOML file. Every section has defaults matching a
//! stock ArloBot base, so a config file only needs the values that differ.

use crate::core::types::DriveGeometry;
use crate::engine::relay::RelayChannel;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub drive_geometry: DriveGeometryConfig,
    pub relay: RelayConfig,
    pub frames: FrameConfig,
    pub logging: LoggingConfig,
}

/// Serial link to the Propeller board
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
        }
    }
}

/// Drive geometry sent to the firmware when it asks for it
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DriveGeometryConfig {
    /// Wheel track width in meters
    pub track_width: f64,
    /// Meters per encoder count
    pub distance_per_count: f64,
}

impl From<DriveGeometryConfig> for DriveGeometry {
    fn from(config: DriveGeometryConfig) -> Self {
        DriveGeometry {
            track_width: config.track_width,
            distance_per_count: config.distance_per_count,
        }
    }
}

/// USB relay board that switches motor power
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Whether a relay board is wired to the motors
    pub installed: bool,
    /// Serial number of the relay board
    pub serial_number: String,
    /// Channel name of the left motor relay ("1".."8" or "all")
    pub left_motor: String,
    /// Channel name of the right motor relay ("1".."8" or "all")
    pub right_motor: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            installed: false,
            serial_number: String::new(),
            left_motor: "1".to_string(),
            right_motor: "2".to_string(),
        }
    }
}

impl RelayConfig {
    /// Resolve motor channel names against the relay channel table
    pub fn channels(&self) -> Result<(RelayChannel, RelayChannel)> {
        let left = self
            .left_motor
            .parse::<RelayChannel>()
            .map_err(|e| Error::Config(format!("relay.left_motor: {}", e)))?;
        let right = self
            .right_motor
            .parse::<RelayChannel>()
            .map_err(|e| Error::Config(format!("relay.right_motor: {}", e)))?;
        Ok((left, right))
    }
}

/// Coordinate frame identifiers stamped on published records
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Odometry parent frame
    pub odom: String,
    /// Child frame of the odometry transform
    pub base_footprint: String,
    /// Child frame of the odometry record
    pub base_link: String,
    /// Frame of the ultrasonic scan
    pub ping_sensor_array: String,
    /// Frame of the infrared scan
    pub ir_sensor_array: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            odom: "odom".to_string(),
            base_footprint: "base_footprint".to_string(),
            base_link: "base_link".to_string(),
            ping_sensor_array: "ping_sensor_array".to_string(),
            ir_sensor_array: "ir_sensor_array".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use setu_io::config::AppConfig;
    ///
    /// let config = AppConfig::load("setuio.toml")?;
    /// # Ok::<(), setu_io::Error>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that TOML typing alone cannot catch
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(Error::Config("serial.port must not be empty".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("serial.baud_rate must be non-zero".to_string()));
        }
        if !self.drive_geometry.track_width.is_finite()
            || !self.drive_geometry.distance_per_count.is_finite()
        {
            return Err(Error::Config(
                "drive_geometry values must be finite".to_string(),
            ));
        }
        // Channel names are checked even without a relay so a typo surfaces early
        self.relay.channels()?;
        if self.relay.installed && self.relay.serial_number.is_empty() {
            log::warn!("relay.installed is set but relay.serial_number is empty");
        }
        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.drive_geometry.track_width, 0.0);
        assert!(!config.relay.installed);
        assert_eq!(config.frames.odom, "odom");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[serial]
port = "/dev/ttyACM0"

[drive_geometry]
track_width = 0.403
distance_per_count = 0.000428

[relay]
installed = true
serial_number = "A9026EI5"
left_motor = "3"
right_motor = "all"
"#;

        let config = AppConfig::from_toml(toml_content).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.drive_geometry.track_width, 0.403);
        assert_eq!(config.drive_geometry.distance_per_count, 0.000428);
        assert_eq!(
            config.relay.channels().unwrap(),
            (RelayChannel::Channel(3), RelayChannel::All)
        );
        assert_eq!(config.frames, FrameConfig::default());
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = AppConfig::from_toml(include_str!("../setuio.toml")).unwrap();
        assert_eq!(config.drive_geometry.track_width, 0.403);
        assert_eq!(config.frames, FrameConfig::default());
    }

    #[test]
    fn test_unknown_relay_channel_is_config_error() {
        let toml_content = r#"
[relay]
left_motor = "9"
"#;
        let err = AppConfig::from_toml(toml_content).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("relay.left_motor"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[serial]\nbaud_rate = 0\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[serial]\nport = \"\"\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[drive_geometry]\ntrack_width = nan\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[serial]\nbaud_rate = \"fast\"\n"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setuio.toml");

        let mut config = AppConfig::default();
        config.drive_geometry.track_width = 0.39;
        config.relay.right_motor = "8".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.drive_geometry.track_width, 0.39);
        assert_eq!(loaded.relay.right_motor, "8");
    }
}
