//! Pipe protocol error types.

/// Errors on the editor↔test-runner pipe.
///
/// Any I/O failure — including a short read or write — means the peer
/// died or the stream desynchronized; the connection is unusable
/// afterwards.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("string too long for 16-bit length prefix: {0} bytes")]
    StringTooLong(usize),

    #[error("list too long for 16-bit count prefix: {0} entries")]
    ListTooLong(usize),

    #[error("invalid UTF-8 in string field: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("unknown command code: {0}")]
    UnknownCommand(u8),
}
