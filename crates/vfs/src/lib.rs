//! Virtual filesystem abstraction for distribution and remote sync.
//!
//! Paths are unix style with a leading `/` regardless of platform. The
//! [`Vfs`] trait presents a read-only view; [`DiskVfs`] maps it onto a
//! directory tree, [`MemoryVfs`] backs tests and fixtures.

mod disk;
mod error;
mod filter;
mod memory;
pub mod path;
mod scanner;

use std::io::Read;

use chrono::{DateTime, Utc};

pub use disk::DiskVfs;
pub use error::VfsError;
pub use filter::ExcludeFilter;
pub use memory::MemoryVfs;
pub use scanner::{DirectoryScanner, ScanFrame, ScanProgress};

/// Read-only virtual filesystem.
///
/// Directory listings return full unix paths in stable sorted order so
/// scans are deterministic.
pub trait Vfs: Send + Sync {
    /// Lists immediate subdirectories of `path`.
    fn list_directories(&self, path: &str) -> Result<Vec<String>, VfsError>;

    /// Lists files directly contained in `path`.
    fn list_files(&self, path: &str) -> Result<Vec<String>, VfsError>;

    /// Opens a file for reading.
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, VfsError>;

    /// Modification time of a file.
    fn modified(&self, path: &str) -> Result<DateTime<Utc>, VfsError>;

    /// Reads a whole file into memory.
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let mut data = Vec::new();
        self.open(path)?.read_to_end(&mut data).map_err(|e| {
            VfsError::access(path, e)
        })?;
        Ok(data)
    }
}
