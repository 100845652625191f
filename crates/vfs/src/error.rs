//! VFS error types.

/// Errors produced by virtual filesystem access and scanning.
#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    /// I/O failure annotated with the offending unix path.
    #[error("failed accessing VFS path {path}: {source}")]
    Access {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no such file: {0}")]
    NotFound(String),

    #[error("invalid exclude pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl VfsError {
    pub fn access(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Access {
            path: path.into(),
            source,
        }
    }
}
