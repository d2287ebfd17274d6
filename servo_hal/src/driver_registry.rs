//! Driver registry for actuator links.
//!
//! Provides an `ActuatorRegistry` struct for registering and retrieving
//! actuator driver factories by name. Constructed at startup and passed by
//! value, no global state.

use servo_common::link::ActuatorLink;
use std::collections::HashMap;
use thiserror::Error;

/// Factory function type for creating driver instances.
pub type ActuatorFactory = fn() -> Box<dyn ActuatorLink>;

/// Error returned when a driver name is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Driver not found: {name} (available: {available})")]
pub struct DriverNotFound {
    /// Requested name.
    pub name: String,
    /// Comma-separated registered names.
    pub available: String,
}

/// Registry of available actuator drivers.
pub struct ActuatorRegistry {
    factories: HashMap<&'static str, ActuatorFactory>,
}

impl ActuatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with all built-in drivers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("dynamixel", crate::dynamixel::create_driver);
        registry.register("simulation", crate::simulation::create_driver);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: ActuatorFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Create a driver instance by name.
    pub fn create(&self, name: &str) -> Result<Box<dyn ActuatorLink>, DriverNotFound> {
        let factory = self.factories.get(name).ok_or_else(|| DriverNotFound {
            name: name.to_string(),
            available: self.list_drivers().join(", "),
        })?;
        Ok(factory())
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ActuatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
