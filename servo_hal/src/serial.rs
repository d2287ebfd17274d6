//! Raw serial port.
//!
//! Both the actuator bus and the button board are plain 8N1 serial lines.
//! [`SerialPort`] opens the device non-blocking, puts it in raw mode at the
//! requested baud rate and exposes it through the [`BusPort`] trait so that
//! the framing and line-splitting code can be tested against in-memory ports.

use nix::fcntl::OFlag;
use nix::sys::termios::{
    self, BaudRate, ControlFlags, FlushArg, SetArg, SpecialCharacterIndices,
};
use servo_common::link::{CommFault, LinkError};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a transmit may stall on a full output buffer.
const TX_TIMEOUT: Duration = Duration::from_millis(100);

/// Byte-level access to a half-duplex port.
pub trait BusPort: Send {
    /// Write all bytes, waiting briefly if the output buffer is full.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), CommFault>;

    /// Read whatever is buffered without blocking. Returns 0 if nothing is.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, CommFault>;

    /// Discard unread input.
    fn flush_input(&mut self) -> Result<(), CommFault>;
}

/// A raw, non-blocking serial port.
#[derive(Debug)]
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open `path` and configure it for raw 8N1 at `baud_rate`.
    ///
    /// # Errors
    /// `LinkError::OpenFailed` if the device cannot be opened, is not a
    /// terminal, or the baud rate is not supported.
    pub fn open(path: &Path, baud_rate: u32) -> Result<Self, LinkError> {
        let baud = baud_rate_from(baud_rate).ok_or_else(|| {
            LinkError::OpenFailed(format!("unsupported baud rate {baud_rate}"))
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags((OFlag::O_NOCTTY | OFlag::O_NONBLOCK).bits())
            .open(path)
            .map_err(|e| LinkError::OpenFailed(format!("{}: {e}", path.display())))?;

        let mut tio = termios::tcgetattr(&file).map_err(|e| {
            LinkError::OpenFailed(format!("{}: not a serial port ({e})", path.display()))
        })?;

        termios::cfmakeraw(&mut tio);
        termios::cfsetspeed(&mut tio, baud).map_err(|e| {
            LinkError::OpenFailed(format!("{}: failed to set baud rate ({e})", path.display()))
        })?;
        tio.control_flags
            .insert(ControlFlags::CLOCAL | ControlFlags::CREAD);
        tio.control_flags
            .remove(ControlFlags::CSTOPB | ControlFlags::CRTSCTS);
        tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(&file, SetArg::TCSANOW, &tio).map_err(|e| {
            LinkError::OpenFailed(format!("{}: failed to configure ({e})", path.display()))
        })?;
        termios::tcflush(&file, FlushArg::TCIOFLUSH).map_err(|e| {
            LinkError::OpenFailed(format!("{}: failed to flush ({e})", path.display()))
        })?;

        debug!("Serial port {} configured at {} baud", path.display(), baud_rate);

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

}

impl BusPort for SerialPort {
    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), CommFault> {
        let deadline = Instant::now() + TX_TIMEOUT;
        while !bytes.is_empty() {
            match self.file.write(bytes) {
                Ok(0) => return Err(CommFault::TxFail("port accepted no bytes".to_string())),
                Ok(n) => bytes = &bytes[n..],
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(CommFault::TxFail("output buffer full".to_string()));
                    }
                    thread::sleep(Duration::from_micros(200));
                }
                Err(e) => return Err(CommFault::TxFail(e.to_string())),
            }
        }
        termios::tcdrain(&self.file).map_err(|e| CommFault::TxFail(e.to_string()))
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, CommFault> {
        loop {
            match self.file.read(buf) {
                // A non-blocking tty reports "no data" as WouldBlock; end of
                // file means the line was hung up unless the device still answers.
                Ok(0) if !buf.is_empty() => {
                    return match termios::tcgetattr(&self.file) {
                        Ok(_) => Ok(0),
                        Err(e) => Err(CommFault::Io(format!(
                            "{}: device hung up ({e})",
                            self.path.display()
                        ))),
                    };
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(e) => {
                    return Err(CommFault::Io(format!("{}: {e}", self.path.display())));
                }
            }
        }
    }

    fn flush_input(&mut self) -> Result<(), CommFault> {
        termios::tcflush(&self.file, FlushArg::TCIFLUSH).map_err(|e| CommFault::Io(e.to_string()))
    }
}

/// Map a numeric baud rate to the termios constant.
pub fn baud_rate_from(baud_rate: u32) -> Option<BaudRate> {
    let baud = match baud_rate {
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        #[cfg(target_os = "linux")]
        460_800 => BaudRate::B460800,
        #[cfg(target_os = "linux")]
        500_000 => BaudRate::B500000,
        #[cfg(target_os = "linux")]
        576_000 => BaudRate::B576000,
        #[cfg(target_os = "linux")]
        921_600 => BaudRate::B921600,
        #[cfg(target_os = "linux")]
        1_000_000 => BaudRate::B1000000,
        #[cfg(target_os = "linux")]
        2_000_000 => BaudRate::B2000000,
        #[cfg(target_os = "linux")]
        3_000_000 => BaudRate::B3000000,
        #[cfg(target_os = "linux")]
        4_000_000 => BaudRate::B4000000,
        _ => return None,
    };
    Some(baud)
}
