//! Protocol 2.0 framing.
//!
//! ```text
//! FF FF FD 00 | ID | LEN_L LEN_H | INST | PARAM... | CRC_L CRC_H
//! ```
//!
//! `LEN` counts INST, PARAM and CRC. Inside INST+PARAM every `FF FF FD` is
//! followed by an extra `FD` (byte stuffing) so the header never appears in
//! the body. The CRC covers the whole packet after stuffing.

use super::{FrameError, Packet, StatusPacket};
use static_assertions::const_assert;

/// Packet header.
pub const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

/// Write instruction.
pub const INST_WRITE: u8 = 0x03;

/// Status (response) instruction.
pub const INST_STATUS: u8 = 0x55;

/// Alert bit of the status error byte: a hardware error is latched.
pub const ERROR_ALERT: u8 = 0x80;

/// Header, id and length field.
const PREFIX_LEN: usize = HEADER.len() + 3;

// A 4-byte write with worst-case stuffing must fit.
const_assert!(super::MAX_PACKET_LEN >= PREFIX_LEN + 1 + 2 + 4 + 2 + 2);

/// CRC-16 used by protocol 2.0 (polynomial 0x8005, init 0, not reflected).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x8005
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Build a write instruction packet for `data` at `address` on actuator `id`.
pub fn write_packet(id: u8, address: u16, data: &[u8]) -> Result<Packet, FrameError> {
    let mut body: Packet = Packet::new();
    push(&mut body, INST_WRITE)?;
    for byte in address.to_le_bytes().into_iter().chain(data.iter().copied()) {
        push(&mut body, byte)?;
    }

    let mut packet = Packet::new();
    for byte in HEADER {
        push(&mut packet, byte)?;
    }
    push(&mut packet, id)?;
    // Length is patched after stuffing.
    push(&mut packet, 0)?;
    push(&mut packet, 0)?;
    stuff_into(&mut packet, &body)?;

    let length = u16::try_from(packet.len() - PREFIX_LEN + 2).map_err(|_| FrameError::TooLong)?;
    let [len_l, len_h] = length.to_le_bytes();
    packet[5] = len_l;
    packet[6] = len_h;

    let [crc_l, crc_h] = crc16(&packet).to_le_bytes();
    push(&mut packet, crc_l)?;
    push(&mut packet, crc_h)?;
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
    if buf.len() < PREFIX_LEN {
        return Ok(None);
    }

    let length = usize::from(u16::from_le_bytes([buf[5], buf[6]]));
    // INST + ERR + CRC at minimum.
    if length < 4 {
        return Err(FrameError::BadLength(length));
    }
    let total = PREFIX_LEN + length;
    if total > super::MAX_PACKET_LEN {
        return Err(FrameError::BadLength(length));
    }
    if buf.len() < total {
        return Ok(None);
    }

    let packet = &buf[..total];
    let expected = u16::from_le_bytes([packet[total - 2], packet[total - 1]]);
    let actual = crc16(&packet[..total - 2]);
    if expected != actual {
        return Err(FrameError::BadChecksum {
            expected,
            actual,
        });
    }

    let instruction = packet[7];
    if instruction != INST_STATUS {
        return Err(FrameError::UnexpectedInstruction(instruction));
    }

    let mut params = Packet::new();
    unstuff_into(&mut params, &packet[9..total - 2])?;

    Ok(Some(StatusPacket {
        id: packet[4],
        error: packet[8],
        params,
    }))
}

/// Human-readable description of a status error byte.
pub fn describe_error(code: u8) -> String {
    let number = match code & !ERROR_ALERT {
        0 => None,
        1 => Some("result fail"),
        2 => Some("instruction error"),
        3 => Some("CRC error"),
        4 => Some("data range error"),
        5 => Some("data length error"),
        6 => Some("data limit error"),
        7 => Some("access error"),
        _ => Some("unknown error"),
    };
    match (number, code & ERROR_ALERT != 0) {
        (Some(desc), true) => format!("{desc} (hardware alert)"),
        (Some(desc), false) => desc.to_string(),
        (None, true) => "hardware alert".to_string(),
        (None, false) => "no error".to_string(),
    }
}

fn push(packet: &mut Packet, byte: u8) -> Result<(), FrameError> {
    packet.push(byte).map_err(|_| FrameError::TooLong)
}

fn stuff_into(out: &mut Packet, body: &[u8]) -> Result<(), FrameError> {
    let start = out.len();
    for &byte in body {
        push(out, byte)?;
        let written = &out[start..];
        if written.ends_with(&[0xFF, 0xFF, 0xFD]) {
            push(out, 0xFD)?;
        }
    }
    Ok(())
}

fn unstuff_into(out: &mut Packet, body: &[u8]) -> Result<(), FrameError> {
    let mut i = 0;
    while i < body.len() {
        push(out, body[i])?;
        if i >= 2 && body[i - 2..=i] == [0xFF, 0xFF, 0xFD] && body.get(i + 1) == Some(&0xFD) {
            i += 1;
        }
        i += 1;
    }
    Ok(())
}
