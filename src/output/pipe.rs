use super::frame::EncodedFrame;
use super::OutputSink;
use crate::error::Result;
use std::io::{self, BufWriter, Stdout, Write};

/// Writes framed results to a byte pipe (stdout by default).
///
/// Each frame goes out as one `write_all` of prefix and payload followed by a
/// flush, so a reader never sees a prefix without its payload.
pub struct PipeOutput<W: Write> {
    writer: BufWriter<W>,
    frames_written: u64,
}

impl PipeOutput<Stdout> {
    pub fn stdout() -> Self {
        tracing::info!("Streaming frames to stdout");
        Self::new(io::stdout())
    }
}

impl<W: Write> PipeOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            frames_written: 0,
        }
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error().into())
    }
}

impl<W: Write> OutputSink for PipeOutput<W> {
    fn write_frame(&mut self, frame: &EncodedFrame) -> Result<()> {
        self.writer.write_all(frame.as_bytes())?;
        self.writer.flush()?;
        self.frames_written += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }
}
