//! # Servo HAL Library
//!
//! Concrete collaborators of the control loop: the actuator bus, the button
//! board line and the keyboard stop listener, plus simulated stand-ins.
//!
//! # Module Structure
//!
//! - [`serial`] - Raw non-blocking serial port (`BusPort`)
//! - [`dynamixel`] - Dynamixel protocol 1.0/2.0 framing and `DynamixelLink`
//! - [`sensor`] - Newline-delimited sensor line over a serial port
//! - [`keyboard`] - Detached stop-key listener and raw terminal guard
//! - [`simulation`] - Simulated actuator and button board
//! - [`driver_registry`] - Actuator driver factories by name
//!
//! # Architecture
//!
//! ```text
//!   DynamixelLink        SerialSensorLine       key-listener
//!   (ActuatorLink)       (SensorLine)           (StopToken)
//!        │                    │
//!        └─────────┬──────────┘
//!                  ▼
//!             SerialPort (BusPort)
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod dynamixel;
pub mod keyboard;
pub mod sensor;
pub mod serial;
pub mod simulation;

// Re-export key types for convenience
pub use crate::driver_registry::ActuatorRegistry;
pub use crate::dynamixel::DynamixelLink;
pub use crate::sensor::SerialSensorLine;
pub use crate::serial::{BusPort, SerialPort};
