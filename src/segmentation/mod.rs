mod deeplab;
mod preprocess;
mod threshold;
pub mod types;

pub use deeplab::{DeepLabV3, PERSON_CLASS};
pub use preprocess::Preprocessor;
pub use threshold::LumaThreshold;
pub use types::SegmentationModel;

use anyhow::Result;

/// Create the default segmentation model (DeepLabV3) for `subject_class`
pub fn create_default_model(
    model_path: &str,
    input_size: (u32, u32),
    subject_class: usize,
) -> Result<Box<dyn SegmentationModel>> {
    let model = DeepLabV3::new(model_path, input_size)?.with_subject_class(subject_class);
    Ok(Box::new(model))
}
