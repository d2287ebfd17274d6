//! Write-once stop token.
//!
//! The only state shared between the control loop and the termination
//! listener. The listener (and the Ctrl-C handler) may only set it; the loop
//! only reads it. Once set it stays set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable cancellation token, false until [`request_stop`](Self::request_stop).
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Create a token in the "not stopped" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token. Returns `true` if this call performed the transition.
    pub fn request_stop(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Whether a stop was requested.
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
