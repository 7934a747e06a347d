use thiserror::Error;

/// Errors produced by the outline pipeline and its frame codecs.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// A configuration value cannot be used (e.g. zero layers, even kernel).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A sparse-encoded coordinate does not fit in 16 bits.
    #[error("coordinate ({x}, {y}) exceeds the 16-bit sparse encoding range")]
    DimensionOverflow {
        /// Column of the offending pixel.
        x: usize,
        /// Row of the offending pixel.
        y: usize,
    },

    /// The segmentation collaborator handed over an unusable mask.
    #[error("upstream segmentation error: {0}")]
    Upstream(String),

    /// Two grids of one frame disagree on their shape.
    #[error("grid shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected (height, width).
        expected: (usize, usize),
        /// Actual (height, width).
        actual: (usize, usize),
    },

    /// Reading or writing a frame stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding or decoding failed.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

impl OutlineError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an upstream error.
    #[must_use]
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// True when the consumer of the output stream has gone away.
    #[must_use]
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

/// Result alias for the outline core.
pub type Result<T> = std::result::Result<T, OutlineError>;
