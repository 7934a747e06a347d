mod frame;
mod pipe;

pub use frame::{
    decode_dense, decode_sparse, encode_dense, encode_sparse, EncodedFrame, FrameReader,
};
pub use pipe::PipeOutput;

use crate::error::Result;

/// Trait for output destinations
pub trait OutputSink {
    /// Write one complete frame
    fn write_frame(&mut self, frame: &EncodedFrame) -> Result<()>;

    /// Number of frames fully written so far
    fn frames_written(&self) -> u64;
}
