//! VFD client protocol
//!
//! This crate defines what clients may say to the bridge and turns raw
//! messages into the closed [`Command`] instruction set.
//!
//! # Wire overview
//!
//! Messages arrive newline-delimited on the bridge socket. Three forms are
//! accepted, auto-detected per message:
//!
//! - **Binary VFD packets** - a leading opcode byte below 0x20 followed by
//!   positional operands, as emitted by the legacy controller.
//! - **JSON objects** - `{"cmd": "<name>", ...fields}`.
//! - **Legacy tokens** - the bare word `clear` or a `write:<text>` prefix,
//!   kept for old clients.
//!
//! Decoding never touches display state; unknown or malformed messages are
//! reported as [`DecodeError`] and dropped at the connection loop.

pub mod command;
pub mod decode;
pub mod packet;

pub use command::{Command, FontProfile, Rect};
pub use decode::{decode_message, DecodeError};
