use crate::outline::RegionMask;
use anyhow::Result;
use image::RgbImage;

/// Trait for segmentation models
/// Allows swapping between different backends (DeepLabV3 ONNX, luma threshold, ...)
pub trait SegmentationModel {
    /// Process a frame and return a binary foreground mask
    ///
    /// # Arguments
    /// * `frame` - Input RGB frame
    ///
    /// # Returns
    /// * Mask with the frame's resolution, 1 where the subject is
    fn segment(&mut self, frame: &RgbImage) -> Result<RegionMask>;
}
