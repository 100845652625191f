//! Remote server error types.

use dropforge_vfs::VfsError;

/// Errors from the remote server and its sessions.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error("invalid string payload: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("unknown message code: {0}")]
    UnknownMessage(u8),

    #[error("no open file with handle {0}")]
    UnknownHandle(u32),

    #[error("client '{0}' is not connected")]
    NotConnected(String),

    #[error("server shut down")]
    Shutdown,
}
