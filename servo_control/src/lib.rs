//! # Servo Control Library
//!
//! Button-triggered servo control loop. Polls a sensor line for trigger
//! tokens and answers each trigger with a speed write followed by a position
//! write on the actuator channel, until a stop is requested.
//!
//! ## Modules
//!
//! 1. [`state`] - Running → Stopping → Stopped lifecycle
//! 2. [`issuer`] - Speed-then-position command issuing
//! 3. [`cycle`] - Startup, iteration and shutdown of the loop
//!
//! Drivers are injected as trait objects, so the loop runs unchanged against
//! the Dynamixel bus, the simulation drivers or test doubles.

pub mod cycle;
pub mod issuer;
pub mod state;

pub use cycle::{ControlLoop, LoopStats, StartupError, StepOutcome};
pub use issuer::{IssueOutcome, MotorCommandIssuer};
pub use state::{LoopEvent, LoopState, LoopStateMachine, TransitionResult};
