//! Little-endian framing primitives.
//!
//! Built on `std::io` blocking reads and writes; `read_exact` /
//! `write_all` give the exact-count semantics the protocol requires.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::PipeError;

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<(), PipeError> {
    writer.write_u8(value)?;
    Ok(())
}

pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8, PipeError> {
    Ok(reader.read_u8()?)
}

pub fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<(), PipeError> {
    writer.write_u16::<LittleEndian>(value)?;
    Ok(())
}

pub fn read_u16<R: Read>(reader: &mut R) -> Result<u16, PipeError> {
    Ok(reader.read_u16::<LittleEndian>()?)
}

pub fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<(), PipeError> {
    writer.write_f32::<LittleEndian>(value)?;
    Ok(())
}

pub fn read_f32<R: Read>(reader: &mut R) -> Result<f32, PipeError> {
    Ok(reader.read_f32::<LittleEndian>()?)
}

/// Writes a u16-length-prefixed string (raw UTF-8 bytes, no terminator).
pub fn write_string16<W: Write>(writer: &mut W, value: &str) -> Result<(), PipeError> {
    let bytes = value.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(PipeError::StringTooLong(bytes.len()));
    }
    write_u16(writer, bytes.len() as u16)?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Reads a u16-length-prefixed string.
pub fn read_string16<R: Read>(reader: &mut R) -> Result<String, PipeError> {
    let length = read_u16(reader)? as usize;
    let mut buf = vec![0u8; length];
    reader.read_exact(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}
