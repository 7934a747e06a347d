use super::types::SegmentationModel;
use crate::outline::RegionMask;
use anyhow::Result;
use image::RgbImage;

/// Model-free stand-in: pixels darker than a luma threshold are foreground.
///
/// Pairs with the synthetic test pattern, whose subject is a black square on
/// white.
pub struct LumaThreshold {
    threshold: u8,
}

impl LumaThreshold {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl Default for LumaThreshold {
    fn default() -> Self {
        Self::new(128)
    }
}

impl SegmentationModel for LumaThreshold {
    fn segment(&mut self, frame: &RgbImage) -> Result<RegionMask> {
        let _span = tracing::debug_span!("threshold_segment").entered();

        let (width, height) = frame.dimensions();
        Ok(RegionMask::from_fn(width as usize, height as usize, |x, y| {
            let p = frame.get_pixel(x as u32, y as u32);
            let luma = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
            luma < self.threshold as f32
        }))
    }
}
