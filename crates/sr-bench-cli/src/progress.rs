//! Log writer that keeps tracing output clear of the progress bar.

use std::io::{self, Write};

use indicatif::ProgressBar;

/// Writes to stderr with the progress bar hidden for the duration of the write.
pub struct SuspendWriter {
    pb: ProgressBar,
}

impl SuspendWriter {
    pub fn new(pb: ProgressBar) -> Self {
        Self { pb }
    }
}

impl Write for SuspendWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pb.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.pb.suspend(|| io::stderr().flush())
    }
}
