//! Resumable, step-driven directory scan.
//!
//! The scan keeps an explicit stack of [`ScanFrame`]s instead of
//! recursing, so one bounded unit of work can be performed per call and
//! the traversal resumed where it left off. Within a frame all files are
//! handed out before any subdirectory is descended.

use std::sync::Arc;

use crate::{ExcludeFilter, Vfs, VfsError};

/// One directory level being processed.
#[derive(Debug)]
pub struct ScanFrame {
    path: String,
    directories: Vec<String>,
    files: Vec<String>,
    next_directory: usize,
    next_file: usize,
    /// Set once the first file of this directory is actually processed.
    counted: bool,
}

impl ScanFrame {
    pub fn path(&self) -> &str {
        &self.path
    }

    fn exhausted(&self) -> bool {
        self.next_file >= self.files.len() && self.next_directory >= self.directories.len()
    }
}

/// Result of one scan step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanProgress {
    /// One file accepted for processing. `first_in_directory` is set for
    /// the first accepted file of the containing directory.
    File {
        path: String,
        first_in_directory: bool,
    },
    /// One file rejected by the exclusion rules.
    ExcludedFile { path: String },
    /// Entered and listed one subdirectory.
    EnteredDirectory { path: String },
    /// Skipped one excluded subdirectory; its contents are never visited.
    SkippedDirectory { path: String },
    /// Finished one directory level.
    LeftDirectory { path: String },
    /// The frame stack is empty; the scan is complete.
    Done,
}

/// Step-driven scan over a [`Vfs`] honoring an [`ExcludeFilter`].
pub struct DirectoryScanner {
    vfs: Arc<dyn Vfs>,
    filter: ExcludeFilter,
    frames: Vec<ScanFrame>,
    started: bool,
}

impl DirectoryScanner {
    pub fn new(vfs: Arc<dyn Vfs>, filter: ExcludeFilter) -> Self {
        Self {
            vfs,
            filter,
            frames: Vec::new(),
            started: false,
        }
    }

    /// Lists the root directory and seeds the frame stack.
    ///
    /// The root itself is never subject to exclusion.
    pub fn begin(&mut self) -> Result<(), VfsError> {
        self.frames.clear();
        self.push_frame("/")?;
        self.started = true;
        Ok(())
    }

    /// Whether the scan has been started and completed.
    pub fn is_done(&self) -> bool {
        self.started && self.frames.is_empty()
    }

    /// Current stack depth, for inspection between steps.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Performs exactly one unit of work: one file, one subdirectory
    /// entry or skip, or one frame pop.
    pub fn step(&mut self) -> Result<ScanProgress, VfsError> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(ScanProgress::Done);
        };

        if frame.next_file < frame.files.len() {
            let file = frame.files[frame.next_file].clone();
            frame.next_file += 1;

            if self.filter.file_excluded(&file) {
                tracing::debug!(path = %file, "excluded by filter");
                return Ok(ScanProgress::ExcludedFile { path: file });
            }

            let first_in_directory = !frame.counted;
            frame.counted = true;
            return Ok(ScanProgress::File {
                path: file,
                first_in_directory,
            });
        }

        if frame.next_directory < frame.directories.len() {
            let dir = frame.directories[frame.next_directory].clone();
            frame.next_directory += 1;

            if self.filter.directory_excluded(&dir) {
                tracing::debug!(path = %dir, "excluded directory skipped");
                return Ok(ScanProgress::SkippedDirectory { path: dir });
            }

            self.push_frame(&dir)?;
            return Ok(ScanProgress::EnteredDirectory { path: dir });
        }

        // A frame is popped only once both cursors are exhausted.
        debug_assert!(frame.exhausted());
        let frame = self.frames.pop().expect("frame present");
        Ok(ScanProgress::LeftDirectory { path: frame.path })
    }

    fn push_frame(&mut self, dir: &str) -> Result<(), VfsError> {
        let directories = self.vfs.list_directories(dir)?;
        let files = self.vfs.list_files(dir)?;
        self.frames.push(ScanFrame {
            path: dir.to_owned(),
            directories,
            files,
            next_directory: 0,
            next_file: 0,
            counted: false,
        });
        Ok(())
    }
}
