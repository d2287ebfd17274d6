//! `DynamixelLink` - register writes over a Dynamixel bus.
//!
//! The status reader resynchronizes instead of giving up: echoed instruction
//! packets are skipped, and frames that fail to parse or come from another id
//! are dropped one byte at a time until our status packet arrives or
//! `rx_timeout` expires.

use super::{StatusPacket, describe_status_error, frame_start, header, parse_status, write_packet};
use crate::serial::{BusPort, SerialPort};
use servo_common::config::{BusConfig, ProtocolVersion};
use servo_common::consts::BROADCAST_ID;
use servo_common::link::{ActuatorLink, ChannelInfo, CommFault, LinkError, Register, RegisterMap};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

type PortOpener<P> = Box<dyn FnMut(&BusConfig) -> Result<P, LinkError> + Send>;

/// Actuator link speaking Dynamixel protocol 1.0 or 2.0.
///
/// Every write is a full transaction: flush stale input, transmit the
/// instruction packet, then wait up to `rx_timeout` for the status packet
/// (skipped for the broadcast id).
pub struct DynamixelLink<P: BusPort = SerialPort> {
    opener: PortOpener<P>,
    port: Option<P>,
    protocol: ProtocolVersion,
    device_id: u8,
    rx_timeout: Duration,
    rx: Vec<u8>,
}

impl DynamixelLink<SerialPort> {
    /// Driver that opens the configured serial device.
    pub fn new() -> Self {
        Self::with_opener(|config: &BusConfig| SerialPort::open(&config.device, config.baud_rate))
    }
}

impl Default for DynamixelLink<SerialPort> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: BusPort> DynamixelLink<P> {
    /// Driver that obtains its port from `opener`.
    pub fn with_opener<F>(opener: F) -> Self
    where
        F: FnMut(&BusConfig) -> Result<P, LinkError> + Send + 'static,
    {
        Self {
            opener: Box::new(opener),
            port: None,
            protocol: ProtocolVersion::default(),
            device_id: 0,
            rx_timeout: Duration::ZERO,
            rx: Vec::with_capacity(super::MAX_PACKET_LEN),
        }
    }

    /// Whether the port is currently held.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl<P: BusPort> ActuatorLink for DynamixelLink<P> {
    fn name(&self) -> &'static str {
        "dynamixel"
    }

    fn open(&mut self, config: &BusConfig) -> Result<ChannelInfo, LinkError> {
        if self.port.is_some() {
            return Err(LinkError::OpenFailed(format!(
                "{} is already open",
                config.device.display()
            )));
        }

        let port = (self.opener)(config)?;
        info!("Port {} opened successfully", config.device.display());
        info!("Baudrate set to {}", config.baud_rate);

        self.port = Some(port);
        self.protocol = config.protocol;
        self.device_id = config.device_id;
        self.rx_timeout = config.rx_timeout;

        Ok(ChannelInfo {
            device: config.device.display().to_string(),
            baud_rate: config.baud_rate,
            protocol: config.protocol,
            device_id: config.device_id,
            registers: RegisterMap::for_protocol(config.protocol),
        })
    }

    fn write_register(&mut self, register: Register, value: u32) -> Result<(), LinkError> {
        let port = self.port.as_mut().ok_or(CommFault::PortClosed)?;

        let data = &value.to_le_bytes()[..register.width.len()];
        let packet = write_packet(self.protocol, self.device_id, register.address, data)
            .map_err(|e| CommFault::TxFail(e.to_string()))?;

        port.flush_input()?;
        trace!("TX {} -> {:02X?}", register.name, &packet[..]);
        port.write_all(&packet)?;

        if self.device_id == BROADCAST_ID {
            return Ok(());
        }

        let status = await_status(
            port,
            &mut self.rx,
            self.protocol,
            &packet,
            self.device_id,
            self.rx_timeout,
        )?;
        trace!(
            "Status from id {}: error={:#04x} params={:02X?}",
            status.id,
            status.error,
            &status.params[..]
        );
        if status.error != 0 {
            warn!(
                "Actuator {} rejected {}={}: {}",
                self.device_id,
                register.name,
                value,
                describe_status_error(self.protocol, status.error)
            );
            return Err(LinkError::DeviceError(status.error));
        }

        debug!("Wrote {}={} to id {}", register.name, value, self.device_id);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            self.rx.clear();
            info!("Dynamixel port closed");
        }
    }
}

/// Read from `port` until the status packet of `device_id` is parsed or
/// `timeout` expires.
///
/// On timeout the last rejected frame, if any, is reported as `RxCorrupt`.
fn await_status<P: BusPort>(
    port: &mut P,
    rx: &mut Vec<u8>,
    protocol: ProtocolVersion,
    sent: &[u8],
    device_id: u8,
    timeout: Duration,
) -> Result<StatusPacket, CommFault> {
    rx.clear();
    let deadline = Instant::now() + timeout;
    let mut chunk = [0u8; super::MAX_PACKET_LEN];
    let mut rejected: Option<String> = None;

    loop {
        let n = port.read_available(&mut chunk)?;
        if n > 0 {
            rx.extend_from_slice(&chunk[..n]);
            trace!("RX {:02X?}", &rx[..]);
        }

        while let Some(start) = frame_start(protocol, rx) {
            if rx[start..].starts_with(sent) {
                trace!("Skipping echoed instruction packet");
                rx.drain(..start + sent.len());
                continue;
            }
            let reason = match parse_status(protocol, &rx[start..]) {
                Ok(None) => break,
                Ok(Some(status)) if status.id == device_id => return Ok(status),
                Ok(Some(status)) => {
                    format!("status from id {} while addressing id {}", status.id, device_id)
                }
                Err(e) => e.to_string(),
            };
            debug!("Dropping frame: {reason}");
            rejected = Some(reason);
            rx.drain(..=start);
        }

        // Without a header only a partial header at the tail can matter.
        if frame_start(protocol, rx).is_none() {
            let keep = header(protocol).len() - 1;
            if rx.len() > keep {
                rx.drain(..rx.len() - keep);
            }
        }

        if Instant::now() >= deadline {
            return Err(match rejected {
                Some(reason) => CommFault::RxCorrupt(reason),
                None => CommFault::RxTimeout,
            });
        }
        if n == 0 {
            thread::sleep(Duration::from_micros(250));
        }
    }
}
