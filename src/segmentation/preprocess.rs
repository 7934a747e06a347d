use crate::outline::RegionMask;
use anyhow::{ensure, Result};
use image::{imageops, GrayImage, RgbImage};
use ndarray::Array4;

/// ImageNet channel statistics expected by torchvision segmentation models.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocessor for converting RGB images to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGB image into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Scale to [0, 1] and standardize with ImageNet mean/std
    /// 3. Transpose from HWC to NCHW format
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            image.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let v = pixel[c] as f32 / 255.0;
                tensor[[0, c, y as usize, x as usize]] = (v - MEAN[c]) / STD[c];
            }
        }

        tensor
    }

    /// Turns per-class logits `[classes, height, width]` (flattened) into a
    /// mask of the pixels whose best class is `class`, resized to the frame.
    pub fn class_mask(
        logits: &[f32],
        classes: usize,
        mask_width: u32,
        mask_height: u32,
        class: usize,
        frame_size: (u32, u32),
    ) -> Result<RegionMask> {
        let _span = tracing::debug_span!("postprocess").entered();

        let plane = (mask_width * mask_height) as usize;
        ensure!(
            logits.len() == classes * plane,
            "logits hold {} values, expected {classes}x{mask_width}x{mask_height}",
            logits.len()
        );
        ensure!(class < classes, "class {class} outside model's {classes} classes");

        let labels = GrayImage::from_fn(mask_width, mask_height, |x, y| {
            let idx = (y * mask_width + x) as usize;
            let best = (0..classes)
                .max_by(|&a, &b| logits[a * plane + idx].total_cmp(&logits[b * plane + idx]))
                .unwrap_or(0);
            image::Luma([if best == class { 255 } else { 0 }])
        });

        // Nearest keeps the mask binary.
        let (frame_width, frame_height) = frame_size;
        let labels = if (mask_width, mask_height) != frame_size {
            imageops::resize(&labels, frame_width, frame_height, imageops::FilterType::Nearest)
        } else {
            labels
        };

        let (width, height) = labels.dimensions();
        Ok(RegionMask::from_vec(width as usize, height as usize, labels.into_raw())?)
    }
}
