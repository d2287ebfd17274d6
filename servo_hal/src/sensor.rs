//! Serial sensor line.
//!
//! The button board prints one newline-terminated ASCII token per event.
//! [`SerialSensorLine`] drains whatever the port has buffered on each poll
//! and hands back only the most recent complete line; earlier complete lines
//! from the same poll are dropped, a partial tail is kept for the next poll.

use crate::serial::{BusPort, SerialPort};
use servo_common::config::SensorConfig;
use servo_common::consts::MAX_SENSOR_LINE;
use servo_common::link::{CommFault, LinkError, SensorLine};
use tracing::{debug, info, warn};

/// Splits a byte stream into lines, keeping only the latest complete one.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    latest: Option<Vec<u8>>,
    overflowed: bool,
    dropped: u64,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' {
                self.finish_line();
            } else if self.overflowed {
                // Discard until the next newline.
            } else if self.pending.len() >= MAX_SENSOR_LINE {
                warn!(
                    "Sensor line exceeds {} bytes without newline; discarding",
                    MAX_SENSOR_LINE
                );
                self.pending.clear();
                self.overflowed = true;
            } else {
                self.pending.push(byte);
            }
        }
    }

    /// Take the most recent complete line, if any.
    pub fn take_latest(&mut self) -> Option<Vec<u8>> {
        self.latest.take()
    }

    /// Number of complete lines overwritten before they were taken.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn finish_line(&mut self) {
        if self.overflowed {
            self.overflowed = false;
            self.pending.clear();
            return;
        }

        let mut line = std::mem::take(&mut self.pending);
        while line.last().is_some_and(u8::is_ascii_whitespace) {
            line.pop();
        }
        if line.is_empty() {
            return;
        }

        if self.latest.replace(line).is_some() {
            self.dropped += 1;
        }
    }
}

/// Sensor line reading newline-delimited tokens from a serial port.
pub struct SerialSensorLine<P: BusPort = SerialPort> {
    name: String,
    port: Option<P>,
    buffer: LineBuffer,
}

impl SerialSensorLine<SerialPort> {
    /// Open the configured button board device.
    ///
    /// # Errors
    /// `LinkError::OpenFailed` if the device cannot be opened.
    pub fn open(config: &SensorConfig) -> Result<Self, LinkError> {
        let port = SerialPort::open(&config.device, config.baud_rate)?;
        info!(
            "Sensor line {} opened at {} baud",
            config.device.display(),
            config.baud_rate
        );
        Ok(Self::from_port(config.device.display().to_string(), port))
    }
}

impl<P: BusPort> SerialSensorLine<P> {
    /// Wrap an already opened port.
    pub fn from_port(name: impl Into<String>, port: P) -> Self {
        Self {
            name: name.into(),
            port: Some(port),
            buffer: LineBuffer::new(),
        }
    }

    /// Whether the port is still held.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl<P: BusPort> SensorLine for SerialSensorLine<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_line(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        let port = self.port.as_mut().ok_or(CommFault::PortClosed)?;

        let mut chunk = [0u8; 128];
        loop {
            let n = port.read_available(&mut chunk)?;
            if n == 0 {
                break;
            }
            self.buffer.push(&chunk[..n]);
        }

        let before = self.buffer.dropped();
        let line = self.buffer.take_latest();
        if self.buffer.dropped() > before {
            debug!("Sensor line {}: older lines dropped", self.name);
        }
        Ok(line)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Sensor line {} closed", self.name);
        }
    }
}
