//! Simulated button board.
//!
//! Presses the two buttons alternately, one press every `period` polls.

use servo_common::link::{CommFault, LinkError, SensorLine};
use servo_common::token::Trigger;
use tracing::info;

/// Simulated sensor line implementing `SensorLine`.
#[derive(Debug)]
pub struct SimulatedButtons {
    period: u32,
    polls: u64,
    next: Trigger,
    open: bool,
}

impl SimulatedButtons {
    /// Press a button every `period` polls (a period of 0 is treated as 1).
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            polls: 0,
            next: Trigger::A,
            open: true,
        }
    }
}

impl SensorLine for SimulatedButtons {
    fn name(&self) -> &str {
        "simulated-buttons"
    }

    fn poll_line(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        if !self.open {
            return Err(CommFault::PortClosed.into());
        }

        self.polls += 1;
        if self.polls % u64::from(self.period) != 0 {
            return Ok(None);
        }

        let trigger = self.next;
        self.next = match trigger {
            Trigger::A => Trigger::B,
            Trigger::B => Trigger::A,
        };
        Ok(Some(trigger.token().as_bytes().to_vec()))
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            info!("Simulated button board closed");
        }
    }
}
