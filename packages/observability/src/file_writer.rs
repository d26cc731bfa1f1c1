//! Append-only JSONL file writer.
//!
//! Each write is flushed immediately so concurrent agents sharing one
//! diagnostics file interleave whole lines.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Shared handle on an append-mode log file.
#[derive(Clone)]
pub struct JsonlFileWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl JsonlFileWriter {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for JsonlFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for JsonlFileWriter {
    type Writer = JsonlFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_writer_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("test.jsonl");

        let mut writer = JsonlFileWriter::new(&path).unwrap();
        writer.write_all(b"test line\n").unwrap();

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "test line\n");
    }

    #[test]
    fn test_writer_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.jsonl");
        std::fs::write(&path, "first\n").unwrap();

        let mut writer = JsonlFileWriter::new(&path).unwrap();
        writer.write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
