//! Servo Common Library
//!
//! This crate provides the types shared by the bus/sensor drivers in
//! `servo_hal` and the control loop in `servo_control`.
//!
//! # Module Structure
//!
//! - [`consts`] - Default addresses, rates and trigger vocabulary
//! - [`config`] - Startup configuration structure and validation
//! - [`link`] - Actuator link and sensor line contracts, scoped actuator channel
//! - [`token`] - Sensor tokens and motor commands
//! - [`stop`] - Write-once stop token shared with the termination listener
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use servo_common::prelude::*;
//!
//! let config = ControllerConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod consts;
pub mod link;
pub mod prelude;
pub mod stop;
pub mod token;
