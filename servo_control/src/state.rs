//! Control loop state machine.
//!
//! Linear lifecycle: Running → Stopping → Stopped. No state is re-entered.
//! The machine is only constructed after the actuator channel opened, so a
//! failed start never reaches `Running`.

use std::fmt;

/// Control loop lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Polling and issuing commands.
    Running,
    /// Stop observed; resources are being released.
    Stopping,
    /// Terminal.
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "Running",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Event that can trigger a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Stop token observed (stop key or interrupt signal).
    StopRequested,
    /// Actuator channel and sensor line released.
    Released,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded; the new state.
    Ok(LoopState),
    /// Transition rejected, with the reason.
    Rejected(&'static str),
}

/// Loop state holder.
#[derive(Debug, Clone)]
pub struct LoopStateMachine {
    state: LoopState,
}

impl LoopStateMachine {
    /// Create a machine in `Running`.
    pub const fn new() -> Self {
        Self {
            state: LoopState::Running,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LoopEvent) -> TransitionResult {
        use LoopEvent::*;
        use LoopState::*;

        let next = match (self.state, event) {
            (Running, StopRequested) => Stopping,
            (Stopping, Released) => Stopped,
            (Running, Released) => return TransitionResult::Rejected("release before stop"),
            (Stopping, StopRequested) => return TransitionResult::Rejected("already stopping"),
            (Stopped, _) => return TransitionResult::Rejected("Stopped is terminal"),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }
}

impl Default for LoopStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running() {
        assert_eq!(LoopStateMachine::new().state(), LoopState::Running);
    }

    #[test]
    fn linear_lifecycle() {
        let mut sm = LoopStateMachine::new();
        assert_eq!(
            sm.handle_event(LoopEvent::StopRequested),
            TransitionResult::Ok(LoopState::Stopping)
        );
        assert_eq!(
            sm.handle_event(LoopEvent::Released),
            TransitionResult::Ok(LoopState::Stopped)
        );
    }

    #[test]
    fn release_requires_stopping() {
        let mut sm = LoopStateMachine::new();
        assert!(matches!(
            sm.handle_event(LoopEvent::Released),
            TransitionResult::Rejected(_)
        ));
        assert_eq!(sm.state(), LoopState::Running);
    }

    #[test]
    fn repeated_stop_is_rejected() {
        let mut sm = LoopStateMachine::new();
        sm.handle_event(LoopEvent::StopRequested);
        assert_eq!(
            sm.handle_event(LoopEvent::StopRequested),
            TransitionResult::Rejected("already stopping")
        );
        assert_eq!(sm.state(), LoopState::Stopping);
    }

    #[test]
    fn stopped_is_terminal() {
        let mut sm = LoopStateMachine::new();
        sm.handle_event(LoopEvent::StopRequested);
        sm.handle_event(LoopEvent::Released);
        for event in [LoopEvent::StopRequested, LoopEvent::Released] {
            assert!(matches!(
                sm.handle_event(event),
                TransitionResult::Rejected(_)
            ));
            assert_eq!(sm.state(), LoopState::Stopped);
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(LoopState::Stopping.to_string(), "Stopping");
    }
}
