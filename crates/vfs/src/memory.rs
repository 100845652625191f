//! In-memory VFS for tests and synthetic trees.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};

use chrono::{DateTime, Utc};

use crate::{path, Vfs, VfsError};

/// A virtual filesystem held entirely in memory.
///
/// Listings derive from the stored file paths, so directories exist
/// exactly where files imply them. Iteration order is sorted.
#[derive(Debug, Default)]
pub struct MemoryVfs {
    files: BTreeMap<String, MemoryFile>,
}

#[derive(Debug)]
struct MemoryFile {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

impl MemoryVfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file at a unix path, replacing any previous content.
    pub fn add_file(&mut self, unix_path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.add_file_with_time(unix_path, data, Utc::now());
    }

    /// Adds a file with an explicit modification time.
    pub fn add_file_with_time(
        &mut self,
        unix_path: impl Into<String>,
        data: impl Into<Vec<u8>>,
        modified: DateTime<Utc>,
    ) {
        self.files.insert(
            unix_path.into(),
            MemoryFile {
                data: data.into(),
                modified,
            },
        );
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn child_of<'a>(&self, dir: &str, file_path: &'a str) -> Option<&'a str> {
        if !path::starts_with(file_path, dir) {
            return None;
        }
        let depth = path::components(dir).count();
        path::components(file_path).nth(depth)
    }
}

impl Vfs for MemoryVfs {
    fn list_directories(&self, dir: &str) -> Result<Vec<String>, VfsError> {
        let mut names = BTreeSet::new();
        for file_path in self.files.keys() {
            if let Some(child) = self.child_of(dir, file_path) {
                // A child is a directory if the path continues past it.
                let child_path = path::join(dir, child);
                if *file_path != child_path {
                    names.insert(child_path);
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>, VfsError> {
        let mut names = Vec::new();
        for file_path in self.files.keys() {
            if let Some(child) = self.child_of(dir, file_path) {
                let child_path = path::join(dir, child);
                if *file_path == child_path {
                    names.push(child_path);
                }
            }
        }
        Ok(names)
    }

    fn open(&self, unix_path: &str) -> Result<Box<dyn Read + Send>, VfsError> {
        let file = self
            .files
            .get(unix_path)
            .ok_or_else(|| VfsError::NotFound(unix_path.into()))?;
        Ok(Box::new(Cursor::new(file.data.clone())))
    }

    fn modified(&self, unix_path: &str) -> Result<DateTime<Utc>, VfsError> {
        self.files
            .get(unix_path)
            .map(|f| f.modified)
            .ok_or_else(|| VfsError::NotFound(unix_path.into()))
    }
}
