//! Motor Command Issuer.
//!
//! Turns a [`MotorCommand`] into two sequential register writes on the
//! actuator channel: goal velocity first, goal position second. The position
//! write is attempted only after the speed write succeeded. Nothing is
//! retried; a failed write is reported to the caller.

use servo_common::link::{ActuatorChannel, LinkError};
use servo_common::token::MotorCommand;
use tracing::{error, info};

/// Result of issuing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// Both writes were accepted.
    Success,
    /// The speed write failed; the position was not written.
    SpeedFailed(LinkError),
    /// Speed accepted, position write failed. The new speed stays in effect.
    PositionFailed(LinkError),
}

impl IssueOutcome {
    /// Whether both writes were accepted.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Issues motor commands over an exclusively owned actuator channel.
#[derive(Debug)]
pub struct MotorCommandIssuer {
    channel: ActuatorChannel,
}

impl MotorCommandIssuer {
    /// Take ownership of an open channel.
    pub fn new(channel: ActuatorChannel) -> Self {
        Self { channel }
    }

    /// The underlying channel.
    pub fn channel(&self) -> &ActuatorChannel {
        &self.channel
    }

    /// Write speed, then position.
    pub fn issue(&mut self, command: MotorCommand) -> IssueOutcome {
        let registers = self.channel.registers();

        info!("Setting motor speed to {}", command.speed);
        if let Err(e) = self
            .channel
            .write_register(registers.goal_velocity, u32::from(command.speed))
        {
            error!("Failed to set speed {}: {e}", command.speed);
            return IssueOutcome::SpeedFailed(e);
        }
        info!("Motor speed set to {}", command.speed);

        info!("Setting motor position to {}", command.target_position);
        // Two's complement, as the control table stores signed positions.
        let position = command.target_position as u32;
        if let Err(e) = self
            .channel
            .write_register(registers.goal_position, position)
        {
            error!("Failed to set position {}: {e}", command.target_position);
            return IssueOutcome::PositionFailed(e);
        }
        info!(
            "Motor moving to position {} with speed {}",
            command.target_position, command.speed
        );

        IssueOutcome::Success
    }

    /// Release the channel. Idempotent.
    pub fn close(&mut self) {
        self.channel.close();
    }
}
