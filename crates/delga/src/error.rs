//! Archive builder error types.

use dropforge_vfs::VfsError;

/// Errors produced while building a DELGA archive.
///
/// The first error aborts the whole task; there is no skip-and-continue
/// mode and partially written archives are not cleaned up.
#[derive(Debug, thiserror::Error)]
pub enum DelgaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed decoding icon {path}: {source}")]
    Icon {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("task already finished")]
    Finished,
}
