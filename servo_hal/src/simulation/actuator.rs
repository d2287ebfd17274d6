//! Simulated actuator.
//!
//! Accepts register writes like a real actuator: values beyond the position
//! limit are rejected with the protocol's range error, everything else is
//! stored. Motion is instantaneous.

use servo_common::config::{BusConfig, ProtocolVersion};
use servo_common::link::{ActuatorLink, ChannelInfo, CommFault, LinkError, Register, RegisterMap};
use std::collections::HashMap;
use tracing::{debug, info};

/// Highest goal position a 12-bit actuator accepts.
pub const SIM_POSITION_LIMIT: u32 = 4095;

/// Range error code per protocol.
const fn range_error(protocol: ProtocolVersion) -> u8 {
    match protocol {
        // Range error flag.
        ProtocolVersion::V1 => 0x08,
        // Data range error.
        ProtocolVersion::V2 => 0x04,
    }
}

/// Simulated actuator implementing `ActuatorLink`.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    open: bool,
    protocol: ProtocolVersion,
    registers: HashMap<u16, u32>,
    goal_position_address: Option<u16>,
    writes: u64,
}

impl SimulatedActuator {
    /// Create a closed simulated actuator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to `address`.
    pub fn register(&self, address: u16) -> Option<u32> {
        self.registers.get(&address).copied()
    }

    /// Number of accepted writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Whether the simulated port is open.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl ActuatorLink for SimulatedActuator {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn open(&mut self, config: &BusConfig) -> Result<ChannelInfo, LinkError> {
        if self.open {
            return Err(LinkError::OpenFailed("simulated bus already open".to_string()));
        }
        let registers = RegisterMap::for_protocol(config.protocol);
        self.open = true;
        self.protocol = config.protocol;
        self.goal_position_address = Some(registers.goal_position.address);
        info!("Simulated actuator {} opened", config.device_id);

        Ok(ChannelInfo {
            device: "simulation".to_string(),
            baud_rate: config.baud_rate,
            protocol: config.protocol,
            device_id: config.device_id,
            registers,
        })
    }

    fn write_register(&mut self, register: Register, value: u32) -> Result<(), LinkError> {
        if !self.open {
            return Err(CommFault::PortClosed.into());
        }
        if Some(register.address) == self.goal_position_address && value > SIM_POSITION_LIMIT {
            return Err(LinkError::DeviceError(range_error(self.protocol)));
        }

        self.registers.insert(register.address, value);
        self.writes += 1;
        debug!("Simulated write {}={}", register.name, value);
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            info!("Simulated actuator closed");
        }
    }
}
