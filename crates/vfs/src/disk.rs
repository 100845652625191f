//! Disk-backed VFS rooted at a directory.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{path, Vfs, VfsError};

/// Maps unix VFS paths onto a directory tree on disk.
#[derive(Debug, Clone)]
pub struct DiskVfs {
    root: PathBuf,
}

impl DiskVfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn native(&self, unix_path: &str) -> PathBuf {
        let mut native = self.root.clone();
        for component in path::components(unix_path) {
            native.push(component);
        }
        native
    }

    fn list(&self, dir: &str, want_dirs: bool) -> Result<Vec<String>, VfsError> {
        let native = self.native(dir);
        let entries =
            std::fs::read_dir(&native).map_err(|e| VfsError::access(dir, e))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VfsError::access(dir, e))?;
            let file_type = entry.file_type().map_err(|e| VfsError::access(dir, e))?;
            if file_type.is_dir() != want_dirs {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                // Non-UTF-8 names cannot be represented as VFS paths.
                tracing::warn!(dir, "skipping entry with non-UTF-8 name");
                continue;
            };
            result.push(path::join(dir, &name));
        }
        result.sort_unstable();
        Ok(result)
    }
}

impl Vfs for DiskVfs {
    fn list_directories(&self, dir: &str) -> Result<Vec<String>, VfsError> {
        self.list(dir, true)
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>, VfsError> {
        self.list(dir, false)
    }

    fn open(&self, unix_path: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let file = std::fs::File::open(self.native(unix_path))
            .map_err(|e| VfsError::access(unix_path, e))?;
        Ok(Box::new(file))
    }

    fn modified(&self, unix_path: &str) -> Result<DateTime<Utc>, VfsError> {
        let metadata = std::fs::metadata(self.native(unix_path))
            .map_err(|e| VfsError::access(unix_path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| VfsError::access(unix_path, e))?;
        Ok(modified.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game.txt"), b"g").unwrap();
        std::fs::create_dir_all(dir.path().join("data").join("levels")).unwrap();
        std::fs::write(dir.path().join("data").join("config.ini"), b"cfg").unwrap();
        dir
    }

    #[test]
    fn lists_sorted_full_paths() {
        let dir = sample();
        let vfs = DiskVfs::new(dir.path());
        assert_eq!(vfs.list_files("/").unwrap(), vec!["/game.txt"]);
        assert_eq!(vfs.list_directories("/").unwrap(), vec!["/data"]);
        assert_eq!(vfs.list_files("/data").unwrap(), vec!["/data/config.ini"]);
        assert_eq!(
            vfs.list_directories("/data").unwrap(),
            vec!["/data/levels"]
        );
    }

    #[test]
    fn read_and_modified() {
        let dir = sample();
        let vfs = DiskVfs::new(dir.path());
        assert_eq!(vfs.read("/data/config.ini").unwrap(), b"cfg");
        assert!(vfs.modified("/data/config.ini").is_ok());
    }

    #[test]
    fn access_error_names_path() {
        let dir = sample();
        let vfs = DiskVfs::new(dir.path());
        let err = vfs.read("/nope/missing.bin").unwrap_err();
        assert!(err.to_string().contains("/nope/missing.bin"));
    }
}
