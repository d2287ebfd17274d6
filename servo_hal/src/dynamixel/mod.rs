//! Dynamixel bus driver.
//!
//! Register writes over a half-duplex serial bus using either framing
//! protocol:
//!
//! - [`protocol1`] - checksum framing, 1-byte addresses, bit-flag errors
//! - [`protocol2`] - CRC-16 framing with byte stuffing, numbered errors
//! - [`DynamixelLink`] - `ActuatorLink` implementation on top of a [`BusPort`](crate::serial::BusPort)

mod driver;
pub mod protocol1;
pub mod protocol2;

pub use driver::DynamixelLink;

use servo_common::config::ProtocolVersion;
use servo_common::link::ActuatorLink;
use thiserror::Error;

/// Largest packet either protocol builds or accepts.
pub const MAX_PACKET_LEN: usize = 64;

/// Fixed-capacity packet buffer.
pub type Packet = heapless::Vec<u8, MAX_PACKET_LEN>;

/// Framing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Packet does not fit the packet buffer.
    #[error("packet exceeds {MAX_PACKET_LEN} bytes")]
    TooLong,

    /// Register address not representable in this protocol.
    #[error("register address {0} not addressable")]
    AddressOutOfRange(u16),

    /// Length field is impossible.
    #[error("invalid length field {0}")]
    BadLength(usize),

    /// Checksum or CRC mismatch.
    #[error("checksum mismatch (expected {expected:#06x}, computed {actual:#06x})")]
    BadChecksum {
        /// Value carried by the packet.
        expected: u16,
        /// Value computed over the received bytes.
        actual: u16,
    },

    /// A packet other than a status packet was received.
    #[error("unexpected instruction {0:#04x}")]
    UnexpectedInstruction(u8),
}

/// A decoded status packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    /// Id of the responding actuator.
    pub id: u8,
    /// Raw error byte (0 = no error).
    pub error: u8,
    /// Returned parameters (empty for write acknowledgements).
    pub params: Packet,
}

/// Build a write instruction packet in the given protocol.
pub fn write_packet(
    protocol: ProtocolVersion,
    id: u8,
    address: u16,
    data: &[u8],
) -> Result<Packet, FrameError> {
    match protocol {
        ProtocolVersion::V1 => protocol1::write_packet(id, address, data),
        ProtocolVersion::V2 => protocol2::write_packet(id, address, data),
    }
}

/// Parse a status packet in the given protocol.
pub fn parse_status(
    protocol: ProtocolVersion,
    buf: &[u8],
) -> Result<Option<StatusPacket>, FrameError> {
    match protocol {
        ProtocolVersion::V1 => protocol1::parse_status(buf),
        ProtocolVersion::V2 => protocol2::parse_status(buf),
    }
}

/// Offset of the first packet header in `buf`, if any.
pub fn frame_start(protocol: ProtocolVersion, buf: &[u8]) -> Option<usize> {
    let header = header(protocol);
    buf.windows(header.len()).position(|w| w == header)
}

/// Packet header of the given protocol.
pub const fn header(protocol: ProtocolVersion) -> &'static [u8] {
    match protocol {
        ProtocolVersion::V1 => &protocol1::HEADER,
        ProtocolVersion::V2 => &protocol2::HEADER,
    }
}

/// Describe a status error byte in the given protocol.
pub fn describe_status_error(protocol: ProtocolVersion, code: u8) -> String {
    match protocol {
        ProtocolVersion::V1 => protocol1::describe_error(code),
        ProtocolVersion::V2 => protocol2::describe_error(code),
    }
}

/// Factory function to create a Dynamixel driver instance.
pub fn create_driver() -> Box<dyn ActuatorLink> {
    Box::new(DynamixelLink::new())
}
