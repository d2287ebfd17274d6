//! Actuator link and sensor line contracts.
//!
//! This module defines:
//! - `ActuatorLink` trait - Interface for register-write bus drivers
//! - `SensorLine` trait - Interface for newline-delimited token sources
//! - `LinkError` / `CommFault` - Error types for link operations
//! - `ActuatorChannel` - Scoped, exclusively owned handle over an open link
//! - `Register` / `RegisterMap` - Fixed-address, fixed-width control registers

use crate::config::{BusConfig, ProtocolVersion};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Transport-level failure on a bus transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommFault {
    /// The instruction packet could not be written completely.
    #[error("failed to transmit instruction packet: {0}")]
    TxFail(String),

    /// No complete status packet arrived within the timeout.
    #[error("timed out waiting for status packet")]
    RxTimeout,

    /// A status packet arrived but failed framing or checksum checks.
    #[error("corrupt status packet: {0}")]
    RxCorrupt(String),

    /// The channel has already been closed.
    #[error("channel is closed")]
    PortClosed,

    /// Any other I/O error on the underlying port.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Error types for link operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The device could not be claimed or configured.
    #[error("Open failed: {0}")]
    OpenFailed(String),

    /// Transport-level write failure.
    #[error("Communication failure: {0}")]
    CommFailure(#[from] CommFault),

    /// The device rejected the value and reported an error code.
    #[error("Device error (code {0:#04x})")]
    DeviceError(u8),

    /// The value does not fit the register width and was not sent.
    #[error("Value {value} does not fit {width} register '{register}'")]
    InvalidValue {
        /// Register name.
        register: &'static str,
        /// Register width.
        width: RegisterWidth,
        /// Rejected value.
        value: u32,
    },
}

/// Width of a control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWidth {
    /// 1 byte.
    Byte,
    /// 2 bytes.
    Word,
    /// 4 bytes.
    DWord,
}

impl RegisterWidth {
    /// Number of bytes written on the wire.
    pub const fn len(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::DWord => 4,
        }
    }

    /// Largest raw value the register can hold.
    pub const fn max_value(self) -> u32 {
        match self {
            Self::Byte => u8::MAX as u32,
            Self::Word => u16::MAX as u32,
            Self::DWord => u32::MAX,
        }
    }
}

impl fmt::Display for RegisterWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-byte", self.len())
    }
}

/// A fixed-address, fixed-width control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    /// Human-readable name used in logs.
    pub name: &'static str,
    /// Control table address.
    pub address: u16,
    /// Write width.
    pub width: RegisterWidth,
}

/// Registers the controller writes, per protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    /// Target velocity (moving speed).
    pub goal_velocity: Register,
    /// Target position.
    pub goal_position: Register,
}

impl RegisterMap {
    /// Control table of protocol 2.0 actuators.
    pub const PROTOCOL_2: Self = Self {
        goal_velocity: Register {
            name: "goal_velocity",
            address: 104,
            width: RegisterWidth::Word,
        },
        goal_position: Register {
            name: "goal_position",
            address: 116,
            width: RegisterWidth::DWord,
        },
    };

    /// Control table of protocol 1.0 actuators.
    pub const PROTOCOL_1: Self = Self {
        goal_velocity: Register {
            name: "moving_speed",
            address: 32,
            width: RegisterWidth::Word,
        },
        goal_position: Register {
            name: "goal_position",
            address: 30,
            width: RegisterWidth::Word,
        },
    };

    /// Register map for the given protocol.
    pub const fn for_protocol(protocol: ProtocolVersion) -> Self {
        match protocol {
            ProtocolVersion::V1 => Self::PROTOCOL_1,
            ProtocolVersion::V2 => Self::PROTOCOL_2,
        }
    }
}

/// Description of an opened channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Device identifier (port path or simulated name).
    pub device: String,
    /// Baud rate the port was configured with.
    pub baud_rate: u32,
    /// Framing protocol.
    pub protocol: ProtocolVersion,
    /// Actuator id on the bus.
    pub device_id: u8,
    /// Registers used for speed and position.
    pub registers: RegisterMap,
}

/// Trait defining the interface for actuator bus drivers.
///
/// # Lifecycle
///
/// 1. `open()` - Called once; claims the port
/// 2. `write_register()` - One addressed write per call, strictly sequential
/// 3. `close()` - Releases the port; must be idempotent
///
/// Drivers are normally not used directly but through [`ActuatorChannel`],
/// which guarantees the close on every exit path.
pub trait ActuatorLink: Send {
    /// Returns the driver's unique identifier (e.g., "dynamixel", "simulation").
    fn name(&self) -> &'static str;

    /// Claim the physical channel.
    ///
    /// # Errors
    /// Return `LinkError::OpenFailed` if the device cannot be claimed.
    fn open(&mut self, config: &BusConfig) -> Result<ChannelInfo, LinkError>;

    /// Perform a single addressed write and wait for its outcome.
    ///
    /// # Errors
    /// `LinkError::CommFailure` on transport failure,
    /// `LinkError::DeviceError` if the device rejected the value.
    fn write_register(&mut self, register: Register, value: u32) -> Result<(), LinkError>;

    /// Release the channel. Calling it on a closed link does nothing.
    fn close(&mut self);
}

/// Trait defining the interface for sensor line drivers.
pub trait SensorLine: Send {
    /// Returns a name for logging.
    fn name(&self) -> &str;

    /// Non-blocking poll for the most recently completed line.
    ///
    /// Returns `Ok(None)` when no complete line is buffered. Older complete
    /// lines received since the previous poll are dropped.
    fn poll_line(&mut self) -> Result<Option<Vec<u8>>, LinkError>;

    /// Release the line. Calling it on a closed line does nothing.
    fn close(&mut self);
}

/// An open, exclusively owned connection to one actuator.
///
/// Created by [`ActuatorChannel::open`]; closed exactly once, either by an
/// explicit [`close`](Self::close) or when dropped.
pub struct ActuatorChannel {
    link: Box<dyn ActuatorLink>,
    info: ChannelInfo,
    open: bool,
}

impl ActuatorChannel {
    /// Open `link` with the given bus configuration.
    ///
    /// # Errors
    /// Propagates the link's `LinkError::OpenFailed`.
    pub fn open(mut link: Box<dyn ActuatorLink>, config: &BusConfig) -> Result<Self, LinkError> {
        let info = link.open(config)?;
        info!(
            "Actuator channel open: driver={}, device={}, baud={}, protocol={}, id={}",
            link.name(),
            info.device,
            info.baud_rate,
            info.protocol,
            info.device_id
        );
        Ok(Self {
            link,
            info,
            open: true,
        })
    }

    /// Channel description.
    pub fn info(&self) -> &ChannelInfo {
        &self.info
    }

    /// Registers for this channel's protocol.
    pub fn registers(&self) -> RegisterMap {
        self.info.registers
    }

    /// Whether the channel is still open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Write `value` to `register`.
    ///
    /// Values wider than the register are rejected before touching the bus.
    pub fn write_register(&mut self, register: Register, value: u32) -> Result<(), LinkError> {
        if !self.open {
            return Err(CommFault::PortClosed.into());
        }
        if value > register.width.max_value() {
            return Err(LinkError::InvalidValue {
                register: register.name,
                width: register.width,
                value,
            });
        }
        self.link.write_register(register, value)
    }

    /// Release the channel. Idempotent.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.link.close();
        info!("Actuator channel {} closed", self.info.device);
    }
}

impl Drop for ActuatorChannel {
    fn drop(&mut self) {
        if self.open {
            warn!("Actuator channel dropped while open; closing");
            self.close();
        }
    }
}

impl fmt::Debug for ActuatorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActuatorChannel")
            .field("driver", &self.link.name())
            .field("info", &self.info)
            .field("open", &self.open)
            .finish()
    }
}
