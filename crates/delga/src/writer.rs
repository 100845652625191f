//! Position-tracking writer adapter under the zip writer.

use std::io::{Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Wraps the archive output and keeps a byte-offset counter consistent
/// with the underlying writer's actual position.
///
/// The zip format patches header fields after the fact, so the archive
/// writer seeks backwards; `size` tracks the high-water mark (the final
/// archive size), `position` the current offset. The size counter is
/// shared so the owning task can report progress while the zip writer
/// owns this adapter.
pub struct CountingWriter<W: Write + Seek> {
    inner: W,
    position: u64,
    size: Arc<AtomicU64>,
}

impl<W: Write + Seek> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            position: 0,
            size: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared handle on the high-water size counter.
    pub fn size_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.size)
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        self.size.fetch_max(self.position, Ordering::Relaxed);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Seek> Seek for CountingWriter<W> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.position = self.inner.seek(pos)?;
        self.size.fetch_max(self.position, Ordering::Relaxed);
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tracks_position_and_size() {
        let mut writer = CountingWriter::new(Cursor::new(Vec::new()));
        let size = writer.size_handle();

        writer.write_all(b"hello world").unwrap();
        assert_eq!(writer.position(), 11);
        assert_eq!(size.load(Ordering::Relaxed), 11);

        // Backward seek to patch a header does not shrink the size.
        writer.seek(SeekFrom::Start(2)).unwrap();
        assert_eq!(writer.position(), 2);
        assert_eq!(size.load(Ordering::Relaxed), 11);

        writer.write_all(b"LL").unwrap();
        assert_eq!(writer.position(), 4);
        assert_eq!(size.load(Ordering::Relaxed), 11);

        let inner = writer.into_inner().into_inner();
        assert_eq!(&inner, b"heLLo world");
    }

    #[test]
    fn seek_end_updates_position() {
        let mut writer = CountingWriter::new(Cursor::new(b"0123456789".to_vec()));
        let at = writer.seek(SeekFrom::End(-2)).unwrap();
        assert_eq!(at, 8);
        assert_eq!(writer.position(), 8);
    }
}
