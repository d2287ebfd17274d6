//! Simulation drivers.
//!
//! Software stand-ins for the actuator bus and the button board, for
//! development and testing without physical hardware.

mod actuator;
mod buttons;

pub use actuator::SimulatedActuator;
pub use buttons::SimulatedButtons;

use servo_common::link::ActuatorLink;

/// Factory function to create a simulated actuator instance.
pub fn create_driver() -> Box<dyn ActuatorLink> {
    Box::new(SimulatedActuator::new())
}
