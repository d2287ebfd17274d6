//! Startup configuration.
//!
//! All tunables of the controller live in one immutable [`ControllerConfig`]
//! built once at startup and passed to constructors. Defaults come from
//! [`crate::consts`]; the binary overrides them from its command line.
//!
//! # Usage
//!
//! ```rust
//! use servo_common::config::{ControllerConfig, ProtocolVersion};
//!
//! let mut config = ControllerConfig::default();
//! config.bus.protocol = ProtocolVersion::V1;
//! config.validate().expect("defaults are valid");
//! ```

use crate::consts::{
    DEFAULT_BUS_BAUD, DEFAULT_BUS_DEVICE, DEFAULT_DXL_ID, DEFAULT_MOVE_SPEED,
    DEFAULT_POLL_INTERVAL, DEFAULT_POSITION_MAX, DEFAULT_POSITION_MIN, DEFAULT_RX_TIMEOUT,
    DEFAULT_SENSOR_BAUD, DEFAULT_SENSOR_DEVICE, DEFAULT_STOP_KEY,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A value could not be parsed.
    #[error("Failed to parse configuration value: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Framing protocol spoken on the actuator bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    /// Protocol 1.0 (checksum framing, 1-byte register addresses).
    V1,
    /// Protocol 2.0 (CRC-16 framing, byte stuffing, 2-byte register addresses).
    #[default]
    V2,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("1.0"),
            Self::V2 => f.write_str("2.0"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "1.0" => Ok(Self::V1),
            "2" | "2.0" => Ok(Self::V2),
            other => Err(ConfigError::ParseError(format!(
                "unknown protocol version '{other}' (expected 1.0 or 2.0)"
            ))),
        }
    }
}

/// Actuator bus settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    /// Serial device of the bus adapter.
    pub device: PathBuf,
    /// Bus baud rate.
    pub baud_rate: u32,
    /// Framing protocol.
    pub protocol: ProtocolVersion,
    /// Id of the commanded actuator.
    pub device_id: u8,
    /// How long to wait for a status packet after a write.
    pub rx_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_BUS_DEVICE),
            baud_rate: DEFAULT_BUS_BAUD,
            protocol: ProtocolVersion::default(),
            device_id: DEFAULT_DXL_ID,
            rx_timeout: DEFAULT_RX_TIMEOUT,
        }
    }
}

/// Button board line settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    /// Serial device of the button board.
    pub device: PathBuf,
    /// Line baud rate.
    pub baud_rate: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_SENSOR_DEVICE),
            baud_rate: DEFAULT_SENSOR_BAUD,
        }
    }
}

/// The two target positions and the shared move speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionConfig {
    /// Position commanded on the first trigger.
    pub position_max: i32,
    /// Position commanded on the second trigger.
    pub position_min: i32,
    /// Speed written before every move.
    pub speed: u16,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            position_max: DEFAULT_POSITION_MAX,
            position_min: DEFAULT_POSITION_MIN,
            speed: DEFAULT_MOVE_SPEED,
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Actuator bus.
    pub bus: BusConfig,
    /// Button board line.
    pub sensor: SensorConfig,
    /// Positions and speed.
    pub motion: MotionConfig,
    /// Fixed sleep between loop iterations.
    pub poll_interval: Duration,
    /// Key that stops the controller.
    pub stop_key: char,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            sensor: SensorConfig::default(),
            motion: MotionConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_key: DEFAULT_STOP_KEY,
        }
    }
}

impl ControllerConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. Baud rates > 0
    /// 2. `bus.rx_timeout` > 0
    /// 3. `poll_interval` > 0
    /// 4. `motion.speed` > 0 and both positions >= 0
    /// 5. Protocol 1.0 positions fit in 2 bytes
    /// 6. `stop_key` is a printable ASCII character
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.baud_rate == 0 || self.sensor.baud_rate == 0 {
            return Err(ConfigError::ValidationError(
                "baud rates must be greater than 0".to_string(),
            ));
        }

        if self.bus.rx_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "rx_timeout must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.motion.speed == 0 {
            return Err(ConfigError::ValidationError(
                "speed must be greater than 0".to_string(),
            ));
        }

        if self.motion.position_min < 0 || self.motion.position_max < 0 {
            return Err(ConfigError::ValidationError(format!(
                "positions must not be negative (min={}, max={})",
                self.motion.position_min, self.motion.position_max
            )));
        }

        if self.bus.protocol == ProtocolVersion::V1 {
            let limit = i32::from(u16::MAX);
            if self.motion.position_min > limit || self.motion.position_max > limit {
                return Err(ConfigError::ValidationError(format!(
                    "protocol 1.0 positions must fit in 2 bytes (max {limit})"
                )));
            }
        }

        if !self.stop_key.is_ascii_graphic() {
            return Err(ConfigError::ValidationError(format!(
                "stop_key must be a printable ASCII character, got {:?}",
                self.stop_key
            )));
        }

        Ok(())
    }
}
