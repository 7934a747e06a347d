use super::preprocess::Preprocessor;
use super::types::SegmentationModel;
use crate::outline::RegionMask;
use anyhow::{anyhow, ensure, Context, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::fmt::Display;
use std::path::Path;

/// Pascal VOC label of the "person" class.
pub const PERSON_CLASS: usize = 15;

/// DeepLabV3 semantic segmentation exported to ONNX.
///
/// The model outputs one logit plane per Pascal VOC class; the mask keeps the
/// pixels whose best class is the configured subject class.
pub struct DeepLabV3 {
    session: Session,
    preprocessor: Preprocessor,
    subject_class: usize,
}

impl DeepLabV3 {
    /// Create a new DeepLabV3 model from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `input_size` - (width, height) the frame is resized to before inference
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: (u32, u32)) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading DeepLabV3 model from {}", path.display());

        let session = Session::builder()
            .map_err(ort_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_error)?
            .with_intra_threads(4)
            .map_err(ort_error)?
            .commit_from_file(path)
            .map_err(ort_error)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("DeepLabV3 model loaded successfully");

        let (width, height) = input_size;
        Ok(Self {
            session,
            preprocessor: Preprocessor::new(width, height),
            subject_class: PERSON_CLASS,
        })
    }

    /// Segment a different class instead of "person".
    pub fn with_subject_class(mut self, class: usize) -> Self {
        self.subject_class = class;
        self
    }
}

impl SegmentationModel for DeepLabV3 {
    fn segment(&mut self, frame: &RgbImage) -> Result<RegionMask> {
        let _span = tracing::debug_span!("deeplab_segment").entered();

        let input = self.preprocessor.preprocess(frame);
        let (n, c, h, w) = input.dim();
        let input = Tensor::from_array(([n, c, h, w], input.into_raw_vec()))
            .map_err(ort_error)
            .context("Failed to build input tensor")?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(ort_error)
            .context("Failed to run inference")?;
        drop(_infer_span);

        // Output "out": [1, classes, H, W]
        let (dims, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ort_error)
            .context("Failed to read model output")?;
        ensure!(dims.len() == 4, "unexpected output rank {}", dims.len());
        let (classes, height, width) = (dims[1] as usize, dims[2] as u32, dims[3] as u32);

        Preprocessor::class_mask(
            logits,
            classes,
            width,
            height,
            self.subject_class,
            frame.dimensions(),
        )
    }
}

/// Flattens an ONNX Runtime error into its message.
fn ort_error(e: impl Display) -> anyhow::Error {
    anyhow!("{e}")
}
