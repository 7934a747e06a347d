use super::CaptureSource;
use anyhow::Result;
use image::{Rgb, RgbImage};

/// Test pattern: a black square on a white frame.
///
/// The square can drift right one pixel per frame, restarting at its origin
/// once it reaches the right edge.
pub struct SyntheticCapture {
    width: u32,
    height: u32,
    square: (u32, u32, u32),
    drift: bool,
    frame_index: u32,
}

impl SyntheticCapture {
    /// The classic 512x512 pattern with the square spanning 64..192.
    pub fn new() -> Self {
        Self::with_square(512, 512, 64, 64, 128)
    }

    /// Frame of `width` x `height` with a `side`-pixel square at `(x, y)`.
    pub fn with_square(width: u32, height: u32, x: u32, y: u32, side: u32) -> Self {
        Self {
            width,
            height,
            square: (x, y, side),
            drift: false,
            frame_index: 0,
        }
    }

    pub fn drifting(mut self, drift: bool) -> Self {
        self.drift = drift;
        self
    }
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for SyntheticCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let (sx, sy, side) = self.square;
        let shift = if self.drift {
            // Restart at the origin before the square leaves the frame.
            self.frame_index % (self.width.saturating_sub(sx + side) + 1)
        } else {
            0
        };
        self.frame_index = self.frame_index.wrapping_add(1);

        let x0 = sx + shift;
        Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
            let inside = (x0..x0 + side).contains(&x) && (sy..sy + side).contains(&y);
            if inside {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        }))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
