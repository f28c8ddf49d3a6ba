//! Binary VFD packet decoding
//!
//! The legacy controller addresses the display with single-byte opcodes
//! below 0x20 followed by positional operands. Opcodes with area or cursor
//! semantics decode to their typed commands; every other packet is treated
//! as text per the original adapter: UTF-8 if valid, otherwise one
//! character per byte.

use crate::command::{Command, Rect};
use crate::decode::DecodeError;

pub const VFD_SET_CURSOR: u8 = 0x10;
pub const VFD_SET_AREA: u8 = 0x11;
pub const VFD_CLEAR_AREA: u8 = 0x12;
pub const VFD_OUTLINE: u8 = 0x14;
pub const VFD_SET_WRITEMODE: u8 = 0x1A;

/// First-byte values below this are packet opcodes, never JSON or text
pub const OPCODE_LIMIT: u8 = 0x20;

/// Decode one binary packet
///
/// Opcodes whose operand count falls short are not errors: they fall
/// through to the text rule, exactly as the original adapter behaved.
pub fn decode_packet(data: &[u8]) -> Result<Command, DecodeError> {
    let (&opcode, operands) = data.split_first().ok_or(DecodeError::Empty)?;

    match opcode {
        VFD_SET_CURSOR if operands.len() >= 2 => Ok(Command::SetCursor {
            x: operands[0],
            y: operands[1],
        }),
        VFD_SET_AREA if operands.len() >= 4 => Ok(Command::FillArea(rect(operands))),
        VFD_CLEAR_AREA if operands.len() >= 4 => Ok(Command::ClearArea(rect(operands))),
        VFD_OUTLINE if operands.len() >= 4 => Ok(Command::Outline(rect(operands))),
        _ => Ok(Command::RawPacket {
            opcode,
            text: text_from_bytes(data),
        }),
    }
}

fn rect(operands: &[u8]) -> Rect {
    Rect {
        x1: operands[0],
        y1: operands[1],
        x2: operands[2],
        y2: operands[3],
    }
}

/// Text rule for packets without a recognized opcode: the whole packet,
/// opcode byte included, is the text payload
fn text_from_bytes(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_owned(),
        Err(_) => data.iter().map(|&b| b as char).collect(),
    }
}
