//! Keyboard termination listener.
//!
//! A detached thread reads stdin one byte at a time and sets the
//! [`StopToken`] when the stop key arrives. The thread is never joined and
//! owns nothing that needs cleanup; the terminal mode it relies on is owned
//! by a [`RawTerminalGuard`] held by the caller.

use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use servo_common::stop::StopToken;
use std::io::{self, ErrorKind, IsTerminal, Read};
use std::thread;
use tracing::{debug, info, warn};

/// Puts the controlling terminal in non-canonical, no-echo mode so single
/// keypresses are delivered without Enter. Restores the original mode on drop.
pub struct RawTerminalGuard {
    original: Termios,
}

impl RawTerminalGuard {
    /// Switch stdin to key-at-a-time mode.
    ///
    /// Returns `Ok(None)` if stdin is not a terminal (piped input works as-is).
    pub fn enable() -> nix::Result<Option<Self>> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Ok(None);
        }

        let original = termios::tcgetattr(&stdin)?;
        let mut raw = original.clone();
        // ISIG stays set so Ctrl-C still raises SIGINT.
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw)?;

        debug!("Terminal switched to key-at-a-time mode");
        Ok(Some(Self { original }))
    }
}

impl Drop for RawTerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = termios::tcsetattr(&io::stdin(), SetArg::TCSANOW, &self.original) {
            warn!("Failed to restore terminal mode: {e}");
        } else {
            debug!("Terminal mode restored");
        }
    }
}

/// Why [`listen_for_key`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// The stop key was read and the token set.
    KeyPressed,
    /// Input reached end of file.
    InputClosed,
    /// Reading failed.
    ReadFailed,
}

/// Read `input` until `key` arrives, then set `stop`.
pub fn listen_for_key<R: Read>(mut input: R, key: u8, stop: &StopToken) -> ListenOutcome {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return ListenOutcome::InputClosed,
            Ok(_) if byte[0] == key => {
                info!("Key '{}' pressed. Exiting the program.", char::from(key));
                stop.request_stop();
                return ListenOutcome::KeyPressed;
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                warn!("Key listener read failed: {e}");
                return ListenOutcome::ReadFailed;
            }
        }
    }
}

/// Spawn the detached listener thread on stdin.
///
/// The join handle is discarded: the thread is abandoned at process exit.
pub fn spawn_key_listener(stop: StopToken, key: char) -> io::Result<()> {
    let key = u8::try_from(key)
        .ok()
        .filter(u8::is_ascii_graphic)
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, format!("invalid stop key {key:?}")))?;

    thread::Builder::new()
        .name("key-listener".to_string())
        .spawn(move || {
            let outcome = listen_for_key(io::stdin().lock(), key, &stop);
            debug!("Key listener finished: {outcome:?}");
        })?;
    Ok(())
}
