pub mod capture;
pub mod config;
pub mod error;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod runner;
pub mod segmentation;

pub use config::{ColorOrder, ColorTriple, EncodingMode, OutlineConfig};
pub use error::{OutlineError, Result};
pub use pipeline::{FrameResult, OutlinePipeline};
