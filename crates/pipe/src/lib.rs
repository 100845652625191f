//! Binary pipe protocol between the editor and its test-runner child.
//!
//! # Wire format
//!
//! All primitives are little-endian with no padding:
//!
//! ```text
//! u8:       1 byte
//! u16:      2 bytes LE
//! f32:      4 bytes LE (IEEE 754)
//! string16: [2 bytes LE: length][length raw bytes, UTF-8, no terminator]
//! ```
//!
//! Reads and writes are blocking and must transfer the exact byte count;
//! a short read or write is a fatal protocol error. There is no version
//! field and no checksum — both ends must be built from the same source.
//!
//! The parameter handshake is a single burst of the full [`RunConfig`]
//! written parent→child immediately after spawn; thereafter the parent
//! sends single-byte [`Command`]s and the child replies with
//! [`ResultCode`]s where a command demands one.

mod codec;
mod command;
mod config;
mod error;

pub use codec::{
    read_f32, read_string16, read_u8, read_u16, write_f32, write_string16, write_u8, write_u16,
};
pub use command::{Command, ResultCode};
pub use config::RunConfig;
pub use error::PipeError;
