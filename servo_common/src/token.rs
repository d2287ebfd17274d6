//! Sensor tokens and motor commands.
//!
//! A raw line from the button board is decoded into a [`SensorToken`]; a
//! recognized trigger maps to exactly one [`MotorCommand`].

use crate::config::MotionConfig;
use crate::consts::{TOKEN_TRIGGER_A, TOKEN_TRIGGER_B};
use std::fmt;
use tracing::debug;

/// The two recognized trigger events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// First button: move to the maximum position.
    A,
    /// Second button: move to the minimum position.
    B,
}

impl Trigger {
    /// Wire token for this trigger.
    pub const fn token(self) -> &'static str {
        match self {
            Self::A => TOKEN_TRIGGER_A,
            Self::B => TOKEN_TRIGGER_B,
        }
    }
}

/// A decoded and classified sensor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorToken {
    /// One of the two recognized triggers.
    Trigger(Trigger),
    /// Anything else, including lines that are not valid UTF-8.
    Unrecognized(String),
}

impl SensorToken {
    /// Classify an already decoded line.
    ///
    /// Whitespace is ignored at both ends, not only trailing.
    pub fn classify(line: &str) -> Self {
        match line.trim() {
            TOKEN_TRIGGER_A => Self::Trigger(Trigger::A),
            TOKEN_TRIGGER_B => Self::Trigger(Trigger::B),
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Decode raw line bytes and classify them.
    ///
    /// Malformed UTF-8 is treated as an unrecognized token.
    pub fn decode(raw: &[u8]) -> Self {
        match std::str::from_utf8(raw) {
            Ok(line) => Self::classify(line),
            Err(e) => {
                debug!("Sensor line is not valid UTF-8 ({e}); ignoring");
                Self::Unrecognized(String::from_utf8_lossy(raw).into_owned())
            }
        }
    }

    /// The trigger, if recognized.
    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Self::Trigger(t) => Some(*t),
            Self::Unrecognized(_) => None,
        }
    }
}

/// Move to `target_position` at `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    /// Goal position in raw actuator units.
    pub target_position: i32,
    /// Goal velocity in raw actuator units.
    pub speed: u16,
}

impl MotorCommand {
    /// Create a command.
    pub const fn new(target_position: i32, speed: u16) -> Self {
        Self {
            target_position,
            speed,
        }
    }

    /// Command mapped to `trigger` under `motion`.
    pub const fn for_trigger(trigger: Trigger, motion: &MotionConfig) -> Self {
        match trigger {
            Trigger::A => Self::new(motion.position_max, motion.speed),
            Trigger::B => Self::new(motion.position_min, motion.speed),
        }
    }
}

impl fmt::Display for MotorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position={} speed={}", self.target_position, self.speed)
    }
}
