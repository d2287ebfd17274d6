//! Control loop: observe stop → poll sensor → classify → issue → sleep.
//!
//! ## Startup
//! The actuator channel is opened first; failure aborts startup and no loop
//! is created. The sensor line is opened second; on failure the already open
//! channel is released before returning.
//!
//! ## Iteration
//! 1. Stop token set → `Stopping`.
//! 2. Poll the sensor line (non-blocking).
//! 3. Trigger A → move to `position_max`, trigger B → `position_min`,
//!    anything else → no action.
//! 4. Sleep `poll_interval`.
//!
//! Every failure inside an iteration is logged and the loop continues.
//!
//! ## Shutdown
//! `Stopping → Stopped` releases the channel and the sensor line exactly
//! once, whichever way the loop was left (including drop).

use crate::issuer::{IssueOutcome, MotorCommandIssuer};
use crate::state::{LoopEvent, LoopState, LoopStateMachine, TransitionResult};
use servo_common::config::{ConfigError, ControllerConfig, SensorConfig};
use servo_common::link::{ActuatorChannel, ActuatorLink, LinkError, SensorLine};
use servo_common::stop::StopToken;
use servo_common::token::{MotorCommand, SensorToken, Trigger};
use std::fmt;
use std::thread;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// Fatal errors before the loop reaches `Running`.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The actuator channel could not be opened.
    #[error("failed to open actuator channel: {0}")]
    ActuatorOpen(#[source] LinkError),

    /// The sensor line could not be opened.
    #[error("failed to open sensor line: {0}")]
    SensorOpen(#[source] LinkError),
}

/// What a single iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Stop observed; the loop is now `Stopping`.
    Stopping,
    /// No complete line was available.
    Idle,
    /// A line arrived but is not a trigger.
    Ignored(String),
    /// A trigger was recognized and its command issued.
    Issued(Trigger, IssueOutcome),
    /// The sensor line reported an error.
    SensorError(LinkError),
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Iterations executed (including the one that observed the stop).
    pub iterations: u64,
    /// Commands issued.
    pub commands: u64,
    /// Commands where both writes succeeded.
    pub successes: u64,
    /// Commands aborted at the speed write.
    pub speed_failures: u64,
    /// Commands that failed at the position write.
    pub position_failures: u64,
    /// Lines that were not triggers.
    pub ignored_tokens: u64,
    /// Sensor line poll errors.
    pub sensor_errors: u64,
}

impl fmt::Display for LoopStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iterations, {} commands ({} ok, {} speed failed, {} position failed), {} ignored tokens, {} sensor errors",
            self.iterations,
            self.commands,
            self.successes,
            self.speed_failures,
            self.position_failures,
            self.ignored_tokens,
            self.sensor_errors
        )
    }
}

/// The button → servo control loop.
pub struct ControlLoop {
    config: ControllerConfig,
    issuer: MotorCommandIssuer,
    sensor: Box<dyn SensorLine>,
    stop: StopToken,
    machine: LoopStateMachine,
    stats: LoopStats,
}

impl ControlLoop {
    /// Validate `config`, open the actuator channel on `link` and the sensor
    /// line via `open_sensor`, and enter `Running`.
    ///
    /// # Errors
    /// `StartupError` if the config is invalid or either resource fails to
    /// open. Nothing is left open on error.
    pub fn start<F>(
        config: ControllerConfig,
        link: Box<dyn ActuatorLink>,
        open_sensor: F,
        stop: StopToken,
    ) -> Result<Self, StartupError>
    where
        F: FnOnce(&SensorConfig) -> Result<Box<dyn SensorLine>, LinkError>,
    {
        config.validate()?;

        let mut channel = ActuatorChannel::open(link, &config.bus).map_err(|e| {
            error!("Failed to open actuator channel: {e}");
            StartupError::ActuatorOpen(e)
        })?;

        let sensor = match open_sensor(&config.sensor) {
            Ok(sensor) => sensor,
            Err(e) => {
                error!("Failed to open sensor line: {e}");
                channel.close();
                return Err(StartupError::SensorOpen(e));
            }
        };

        info!(
            "Control loop running (poll_interval={}ms, stop key '{}')",
            config.poll_interval.as_millis(),
            config.stop_key
        );

        Ok(Self {
            config,
            issuer: MotorCommandIssuer::new(channel),
            sensor,
            stop,
            machine: LoopStateMachine::new(),
            stats: LoopStats::default(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.machine.state()
    }

    /// Counters so far.
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Run one iteration without the trailing sleep.
    ///
    /// Returns `StepOutcome::Stopping` once the stop token is observed; after
    /// that no further command is issued.
    pub fn step(&mut self) -> StepOutcome {
        if self.machine.state() != LoopState::Running {
            return StepOutcome::Stopping;
        }
        self.stats.iterations += 1;

        if self.stop.is_stop_requested() {
            self.transition(LoopEvent::StopRequested);
            return StepOutcome::Stopping;
        }

        trace!("Reading button state...");
        let raw = match self.sensor.poll_line() {
            Ok(Some(raw)) => raw,
            Ok(None) => return StepOutcome::Idle,
            Err(e) => {
                self.stats.sensor_errors += 1;
                let count = self.stats.sensor_errors;
                if count <= 10 || count % 1000 == 0 {
                    warn!("Sensor line {} poll failed (#{count}): {e}", self.sensor.name());
                }
                return StepOutcome::SensorError(e);
            }
        };

        let token = SensorToken::decode(&raw);
        debug!("Button state: {token:?}");

        let trigger = match token {
            SensorToken::Trigger(trigger) => trigger,
            SensorToken::Unrecognized(text) => {
                self.stats.ignored_tokens += 1;
                debug!("Ignoring unrecognized token {text:?}");
                return StepOutcome::Ignored(text);
            }
        };

        let command = MotorCommand::for_trigger(trigger, &self.config.motion);
        info!("{} received, commanding {}", trigger.token(), command);

        let outcome = self.issuer.issue(command);
        self.stats.commands += 1;
        match &outcome {
            IssueOutcome::Success => self.stats.successes += 1,
            IssueOutcome::SpeedFailed(_) => self.stats.speed_failures += 1,
            IssueOutcome::PositionFailed(_) => self.stats.position_failures += 1,
        }

        StepOutcome::Issued(trigger, outcome)
    }

    /// Iterate until the stop token is observed, then shut down.
    pub fn run(&mut self) -> LoopStats {
        while self.step() != StepOutcome::Stopping {
            thread::sleep(self.config.poll_interval);
        }
        self.shutdown();
        info!("Control loop finished: {}", self.stats);
        self.stats.clone()
    }

    /// Release the actuator channel and the sensor line and enter `Stopped`.
    ///
    /// Safe to call in any state; resources are released only once.
    pub fn shutdown(&mut self) {
        if self.machine.state() == LoopState::Running {
            self.transition(LoopEvent::StopRequested);
        }
        if self.machine.state() != LoopState::Stopping {
            return;
        }

        self.issuer.close();
        self.sensor.close();
        self.transition(LoopEvent::Released);
    }

    fn transition(&mut self, event: LoopEvent) {
        let from = self.machine.state();
        match self.machine.handle_event(event) {
            TransitionResult::Ok(to) => info!("Control loop {from} -> {to}"),
            TransitionResult::Rejected(reason) => {
                debug!("Ignored {event:?} in {from}: {reason}")
            }
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLoop")
            .field("state", &self.machine.state())
            .field("channel", self.issuer.channel())
            .field("sensor", &self.sensor.name())
            .field("stats", &self.stats)
            .finish()
    }
}
