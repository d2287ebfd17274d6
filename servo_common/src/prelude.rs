//! Prelude module for common re-exports.
//!
//! ```rust
//! use servo_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    BusConfig, ConfigError, ControllerConfig, MotionConfig, ProtocolVersion, SensorConfig,
};

// ─── Links ──────────────────────────────────────────────────────────
pub use crate::link::{
    ActuatorChannel, ActuatorLink, ChannelInfo, CommFault, LinkError, Register, RegisterMap,
    RegisterWidth, SensorLine,
};

// ─── Tokens & Commands ─────────────────────────────────────────────
pub use crate::token::{MotorCommand, SensorToken, Trigger};

// ─── Cancellation ───────────────────────────────────────────────────
pub use crate::stop::StopToken;
