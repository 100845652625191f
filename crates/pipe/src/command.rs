//! Command and result codes exchanged after the parameter handshake.

use std::io::{Read, Write};

use crate::{codec, PipeError};

/// Commands sent parent → child, one byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Request graceful shutdown. After this no further commands are
    /// processed for the lifetime of the run.
    Quit = 0,
}

impl Command {
    pub fn write_to<W: Write>(self, writer: &mut W) -> Result<(), PipeError> {
        codec::write_u8(writer, self as u8)
    }

    /// Blocking read of the next command byte.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, PipeError> {
        match codec::read_u8(reader)? {
            0 => Ok(Command::Quit),
            other => Err(PipeError::UnknownCommand(other)),
        }
    }
}

/// Result codes sent child → parent, one byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultCode {
    Success = 0,
    Failed = 1,
}

impl ResultCode {
    pub fn write_to<W: Write>(self, writer: &mut W) -> Result<(), PipeError> {
        codec::write_u8(writer, self as u8)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, PipeError> {
        match codec::read_u8(reader)? {
            0 => Ok(ResultCode::Success),
            _ => Ok(ResultCode::Failed),
        }
    }
}
