//! Log-file tailing for the editor's run panel.
//!
//! The parent polls once per frame and must never block waiting for log
//! growth: [`LogTail::read_new`] returns whatever was appended since the
//! last poll, [`last_lines`] serves the "show me the end of a huge log"
//! case with a byte-reverse scan instead of loading the whole file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Newline budget for [`last_lines`] callers that take the default.
pub const DEFAULT_LAST_LINES: usize = 500;

const REVERSE_CHUNK: usize = 8192;

/// Incremental reader over a growing log file.
#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    position: u64,
}

impl LogTail {
    /// Starts tailing from the beginning of `path`. The file does not
    /// need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            position: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset up to which the log has been consumed.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the bytes appended since the previous call.
    ///
    /// A missing file yields an empty string; a file shorter than the
    /// last position was truncated and is re-read from the start.
    pub fn read_new(&mut self) -> std::io::Result<String> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
            Err(err) => return Err(err),
        };

        let len = file.metadata()?.len();
        if len < self.position {
            tracing::debug!(path = %self.path.display(), "log truncated, restarting tail");
            self.position = 0;
        }
        if len == self.position {
            return Ok(String::new());
        }

        file.seek(SeekFrom::Start(self.position))?;
        let mut data = Vec::with_capacity((len - self.position) as usize);
        file.read_to_end(&mut data)?;
        self.position += data.len() as u64;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

/// Returns at most the last `max_lines` lines of `path`.
///
/// Scans backwards in fixed-size chunks counting newlines, so very
/// large logs never get loaded whole. A missing file yields an empty
/// string.
pub fn last_lines(path: &Path, max_lines: usize) -> std::io::Result<String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
        Err(err) => return Err(err),
    };

    let len = file.metadata()?.len();
    let mut offset = len;
    let mut newlines = 0usize;
    let mut chunk = vec![0u8; REVERSE_CHUNK];
    let mut start = 0u64;

    'scan: while offset > 0 {
        let read_len = REVERSE_CHUNK.min(offset as usize);
        offset -= read_len as u64;
        file.seek(SeekFrom::Start(offset))?;
        let chunk = &mut chunk[..read_len];
        file.read_exact(chunk)?;

        for (i, byte) in chunk.iter().enumerate().rev() {
            // The trailing newline of the file does not count as a line
            // boundary worth stopping at.
            if *byte == b'\n' && offset + i as u64 != len.saturating_sub(1) {
                newlines += 1;
                if newlines >= max_lines {
                    start = offset + i as u64 + 1;
                    break 'scan;
                }
            }
        }
    }

    file.seek(SeekFrom::Start(start))?;
    let mut data = Vec::with_capacity((len - start) as usize);
    file.read_to_end(&mut data)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}
