//! Protocol 1.0 framing.
//!
//! ```text
//! FF FF | ID | LEN | INST/ERR | PARAM... | CHECKSUM
//! ```
//!
//! `LEN` counts INST (or ERR), PARAM and the checksum. The checksum is the
//! inverted low byte of the sum of everything after the header.

use super::{FrameError, Packet, StatusPacket};
use bitflags::bitflags;

/// Packet header.
pub const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Write instruction.
pub const INST_WRITE: u8 = 0x03;

bitflags! {
    /// Status error byte of protocol 1.0 actuators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusError: u8 {
        /// Input voltage out of the configured range.
        const INPUT_VOLTAGE = 0x01;
        /// Goal position outside the angle limits.
        const ANGLE_LIMIT   = 0x02;
        /// Internal temperature over the limit.
        const OVERHEATING   = 0x04;
        /// Instruction parameter out of range.
        const RANGE         = 0x08;
        /// Instruction packet checksum mismatch.
        const CHECKSUM      = 0x10;
        /// Load cannot be controlled with the set torque.
        const OVERLOAD      = 0x20;
        /// Undefined instruction or action without reg_write.
        const INSTRUCTION   = 0x40;
    }
}

/// Inverted-sum checksum over id, length, instruction and parameters.
pub fn checksum(data: &[u8]) -> u8 {
    !data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Build a write instruction packet for `data` at `address` on actuator `id`.
pub fn write_packet(id: u8, address: u16, data: &[u8]) -> Result<Packet, FrameError> {
    let address = u8::try_from(address).map_err(|_| FrameError::AddressOutOfRange(address))?;
    let length = u8::try_from(data.len() + 3).map_err(|_| FrameError::TooLong)?;

    let mut packet = Packet::new();
    let bytes = HEADER
        .into_iter()
        .chain([id, length, INST_WRITE, address])
        .chain(data.iter().copied());
    for byte in bytes {
        packet.push(byte).map_err(|_| FrameError::TooLong)?;
    }
    let sum = checksum(&packet[HEADER.len()..]);
    packet.push(sum).map_err(|_| FrameError::TooLong)?;
    Ok(packet)
}

/// Try to parse one status packet from the start of `buf`.
///
/// Leading bytes before the header are skipped. Returns `Ok(None)` while the
/// packet is still incomplete.
pub fn parse_status(buf: &[u8]) -> Result<Option<StatusPacket>, FrameError> {
    let Some(start) = buf.windows(HEADER.len()).position(|w| w == HEADER) else {
        return Ok(None);
    };
    let buf = &buf[start..];
    if buf.len() < 4 {
        return Ok(None);
    }

    let length = usize::from(buf[3]);
    // ERR + CHECKSUM at minimum.
    if length < 2 {
        return Err(FrameError::BadLength(length));
    }
    let total = 4 + length;
    if buf.len() < total {
        return Ok(None);
    }

    let packet = &buf[..total];
    let expected = u16::from(packet[total - 1]);
    let actual = u16::from(checksum(&packet[2..total - 1]));
    if expected != actual {
        return Err(FrameError::BadChecksum { expected, actual });
    }

    let mut params = Packet::new();
    for &byte in &packet[5..total - 1] {
        params.push(byte).map_err(|_| FrameError::TooLong)?;
    }

    Ok(Some(StatusPacket {
        id: packet[2],
        error: packet[4],
        params,
    }))
}

/// Human-readable description of a status error byte.
pub fn describe_error(code: u8) -> String {
    let flags = StatusError::from_bits_retain(code);
    if flags.is_empty() {
        return "no error".to_string();
    }
    let names: Vec<String> = flags
        .iter_names()
        .map(|(name, _)| name.to_ascii_lowercase().replace('_', " "))
        .collect();
    let unknown = flags.bits() & !StatusError::all().bits();
    match (names.is_empty(), unknown != 0) {
        (true, _) => format!("unknown error bits {unknown:#04x}"),
        (false, true) => format!("{} (+unknown bits {unknown:#04x})", names.join(", ")),
        (false, false) => names.join(", "),
    }
}
