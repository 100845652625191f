//! File servicing for remote project synchronization.
//!
//! Answers a client's list/open/read/close requests against the
//! project's VFS, applying the same exclusion rules as local archive
//! building so a synchronized remote copy contains exactly what a DELGA
//! would.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use dropforge_vfs::{ExcludeFilter, Vfs, VfsError};

use crate::RemoteError;

/// Upper bound on one read. `max_len` comes straight off the wire, so
/// the buffer it sizes must not.
const MAX_READ_CHUNK: usize = 1 << 20;

/// A filtered directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

/// Serves file-transfer requests for one synchronization session.
///
/// Excluded paths are invisible: they are dropped from listings and
/// opening one fails as if it did not exist.
pub struct FileServicer {
    vfs: Arc<dyn Vfs>,
    filter: ExcludeFilter,
    handles: HashMap<u32, Box<dyn Read + Send>>,
    next_handle: u32,
}

impl FileServicer {
    pub fn new(vfs: Arc<dyn Vfs>, filter: ExcludeFilter) -> Self {
        Self {
            vfs,
            filter,
            handles: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Lists `path` with the exclusion rules applied.
    pub fn list_directory(&self, path: &str) -> Result<DirectoryListing, RemoteError> {
        let directories = self
            .vfs
            .list_directories(path)?
            .into_iter()
            .filter(|dir| !self.filter.directory_excluded(dir))
            .collect();
        let files = self
            .vfs
            .list_files(path)?
            .into_iter()
            .filter(|file| !self.filter.file_excluded(file))
            .collect();
        Ok(DirectoryListing { directories, files })
    }

    /// Opens a file for sequential reading, returning a handle.
    pub fn open_file(&mut self, path: &str) -> Result<u32, RemoteError> {
        if self.filter.file_excluded(path) {
            tracing::debug!(path, "refusing excluded file");
            return Err(VfsError::NotFound(path.to_owned()).into());
        }
        let reader = self.vfs.open(path)?;
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(handle, reader);
        tracing::debug!(path, handle, "file opened for transfer");
        Ok(handle)
    }

    /// Reads up to `max_len` bytes from an open handle, capped at
    /// [`MAX_READ_CHUNK`]. An empty result means end of file.
    pub fn read_file(&mut self, handle: u32, max_len: usize) -> Result<Vec<u8>, RemoteError> {
        let reader = self
            .handles
            .get_mut(&handle)
            .ok_or(RemoteError::UnknownHandle(handle))?;
        let max_len = max_len.min(MAX_READ_CHUNK);
        let mut buf = vec![0u8; max_len];
        let mut filled = 0;
        // Loop so a short read from the backing store does not look
        // like a premature EOF to the client.
        while filled < max_len {
            match reader.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    pub fn close_file(&mut self, handle: u32) -> Result<(), RemoteError> {
        self.handles
            .remove(&handle)
            .map(|_| ())
            .ok_or(RemoteError::UnknownHandle(handle))
    }

    pub fn open_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropforge_vfs::MemoryVfs;

    fn servicer() -> FileServicer {
        let mut vfs = MemoryVfs::new();
        vfs.add_file("/data/model.demodel", b"model".to_vec());
        vfs.add_file("/data/scratch.tmp", b"junk".to_vec());
        vfs.add_file("/igde/editor.cfg", b"internal".to_vec());

        let filter = ExcludeFilter::new(&[], &["*.tmp".into()]).unwrap();
        FileServicer::new(Arc::new(vfs), filter)
    }

    #[test]
    fn listings_apply_exclusion_rules() {
        let servicer = servicer();
        let root = servicer.list_directory("/").unwrap();
        assert_eq!(root.directories, vec!["/data"]);
        assert!(root.files.is_empty());

        let data = servicer.list_directory("/data").unwrap();
        assert_eq!(data.files, vec!["/data/model.demodel"]);
    }

    #[test]
    fn open_read_close_cycle() {
        let mut servicer = servicer();
        let handle = servicer.open_file("/data/model.demodel").unwrap();

        assert_eq!(servicer.read_file(handle, 3).unwrap(), b"mod");
        assert_eq!(servicer.read_file(handle, 16).unwrap(), b"el");
        assert!(servicer.read_file(handle, 16).unwrap().is_empty());

        servicer.close_file(handle).unwrap();
        assert_eq!(servicer.open_count(), 0);
        assert!(matches!(
            servicer.read_file(handle, 1),
            Err(RemoteError::UnknownHandle(_))
        ));
    }

    #[test]
    fn oversized_read_requests_are_clamped() {
        let mut servicer = servicer();
        let handle = servicer.open_file("/data/model.demodel").unwrap();

        // A hostile length must not size an allocation.
        assert_eq!(servicer.read_file(handle, usize::MAX).unwrap(), b"model");
        assert!(servicer.read_file(handle, usize::MAX).unwrap().is_empty());
    }

    #[test]
    fn excluded_files_cannot_be_opened() {
        let mut servicer = servicer();
        assert!(servicer.open_file("/data/scratch.tmp").is_err());
        assert!(servicer.open_file("/igde/editor.cfg").is_err());
    }

    #[test]
    fn handles_are_independent() {
        let mut servicer = servicer();
        let a = servicer.open_file("/data/model.demodel").unwrap();
        let b = servicer.open_file("/data/model.demodel").unwrap();
        assert_ne!(a, b);

        assert_eq!(servicer.read_file(a, 5).unwrap(), b"model");
        assert_eq!(servicer.read_file(b, 5).unwrap(), b"model");
    }
}
