use crate::config::{EncodingMode, OutlineConfig};
use crate::error::Result;
use crate::outline::{
    band_outline, compute_distance, compute_gradient, extract_boundary, normalize,
    render_arrows, render_contours, render_level_sets, BoundaryMask, ContourMask, GradientField,
    NormalizedField, RegionMask, ScalarField,
};
use crate::output::{encode_dense, encode_sparse, EncodedFrame};
use image::RgbImage;

/// Every intermediate grid of one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub mask: RegionMask,
    pub boundary: BoundaryMask,
    pub field: ScalarField,
    pub normalized: NormalizedField,
    pub contour: ContourMask,
    /// Present when the configuration asks for gradients.
    pub gradient: Option<GradientField>,
}

/// Stateless outline pipeline; one instance serves every frame of a run.
#[derive(Debug, Clone)]
pub struct OutlinePipeline {
    config: OutlineConfig,
}

impl OutlinePipeline {
    /// Validates `config` once so per-frame processing cannot hit a
    /// configuration error.
    pub fn new(config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Runs boundary, distance, normalization, banding and (optionally)
    /// gradient stages.
    pub fn process(&self, mask: &RegionMask) -> Result<FrameResult> {
        let _span = tracing::debug_span!("process", width = mask.width(), height = mask.height())
            .entered();
        let config = &self.config;

        let boundary = extract_boundary(mask, config.kernel_size, config.border_policy)?;
        let field = compute_distance(&boundary);
        let normalized = normalize(&field);
        let contour = band_outline(&normalized, config.layer_count, mask, config.include_outside)?;

        let gradient = if config.compute_gradient {
            let mut gradient = compute_gradient(&field)?;
            if !config.include_outside {
                gradient.mask_outside(mask)?;
            }
            Some(gradient)
        } else {
            None
        };

        Ok(FrameResult {
            mask: mask.clone(),
            boundary,
            field,
            normalized,
            contour,
            gradient,
        })
    }

    /// Colored overlay streamed in dense mode.
    pub fn overlay(&self, result: &FrameResult) -> Result<RgbImage> {
        render_contours(
            &result.contour,
            &result.boundary,
            self.config.outline_color,
            self.config.ring_color(),
        )
    }

    /// Frames `result` in the configured wire mode.
    pub fn encode(&self, result: &FrameResult) -> Result<EncodedFrame> {
        match self.config.encoding {
            EncodingMode::Dense => encode_dense(&self.overlay(result)?),
            EncodingMode::Sparse => encode_sparse(&result.contour),
        }
    }

    /// `process` followed by `encode`.
    pub fn run(&self, mask: &RegionMask) -> Result<EncodedFrame> {
        let result = self.process(mask)?;
        self.encode(&result)
    }

    /// Level-set shading of the distance field.
    pub fn level_set_image(&self, result: &FrameResult) -> Result<RgbImage> {
        render_level_sets(
            &result.field,
            &result.mask,
            &result.boundary,
            self.config.outline_color,
            self.config.include_outside,
        )
    }

    /// Gradient arrows, if the gradient was computed.
    pub fn arrow_image(&self, result: &FrameResult) -> Option<RgbImage> {
        result
            .gradient
            .as_ref()
            .map(|g| render_arrows(g, &self.config.arrows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OutlineError;
    use crate::output::decode_sparse;

    fn disc(size: usize, radius: f32) -> RegionMask {
        let c = size as f32 / 2.0;
        RegionMask::from_fn(size, size, |x, y| {
            let (dx, dy) = (x as f32 - c, y as f32 - c);
            dx * dx + dy * dy <= radius * radius
        })
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = OutlineConfig { layer_count: 0, ..Default::default() };
        assert!(matches!(
            OutlinePipeline::new(config),
            Err(OutlineError::Configuration(_))
        ));
    }

    #[test]
    fn stage_invariants_hold_on_a_disc() {
        let pipeline = OutlinePipeline::new(OutlineConfig::default()).unwrap();
        let mask = disc(64, 20.0);
        let result = pipeline.process(&mask).unwrap();

        assert!(result.boundary.lit_pixels().all(|(x, y)| mask.get(x, y)));
        for (x, y) in result.boundary.lit_pixels() {
            assert_eq!(result.field.get(x, y), Some(0.0));
        }
        assert!(result.field.as_array().iter().all(|&d| d >= 0.0));
        assert!(result.contour.lit_pixels().all(|(x, y)| mask.get(x, y)));
        // The outer boundary is always on the first band.
        assert!(result.boundary.lit_pixels().all(|(x, y)| result.contour.get(x, y)));
        assert!(result.gradient.is_none());
    }

    #[test]
    fn more_layers_draw_more_rings() {
        let mask = disc(96, 40.0);
        let count = |layers| {
            let config = OutlineConfig { layer_count: layers, ..Default::default() };
            let pipeline = OutlinePipeline::new(config).unwrap();
            pipeline.process(&mask).unwrap().contour.count()
        };
        assert!(count(15) > count(3));
    }

    #[test]
    fn single_layer_keeps_the_outline() {
        let config = OutlineConfig { layer_count: 1, ..Default::default() };
        let pipeline = OutlinePipeline::new(config).unwrap();
        let result = pipeline.process(&disc(40, 15.0)).unwrap();

        assert!(result.contour.count() >= result.boundary.count());
        for (x, y) in result.contour.lit_pixels() {
            let v = result.normalized.get(x, y).unwrap();
            assert!(v == 0 || v == 255);
        }
    }

    #[test]
    fn processing_is_idempotent() {
        let config = OutlineConfig { compute_gradient: true, ..Default::default() };
        let pipeline = OutlinePipeline::new(config).unwrap();
        let mask = disc(50, 18.0);

        let first = pipeline.process(&mask).unwrap();
        let second = pipeline.process(&mask).unwrap();
        assert_eq!(first.contour, second.contour);
        assert_eq!(first.gradient, second.gradient);
        assert_eq!(pipeline.run(&mask).unwrap(), pipeline.run(&mask).unwrap());
    }

    #[test]
    fn gradient_is_zero_outside_mask_unless_requested() {
        let mask = disc(40, 12.0);
        let inside_only = OutlinePipeline::new(OutlineConfig {
            compute_gradient: true,
            ..Default::default()
        })
        .unwrap();
        let grad = inside_only.process(&mask).unwrap().gradient.unwrap();
        assert_eq!(grad.get(0, 0), Some((0.0, 0.0)));

        let everywhere = OutlinePipeline::new(OutlineConfig {
            compute_gradient: true,
            include_outside: true,
            ..Default::default()
        })
        .unwrap();
        let grad = everywhere.process(&mask).unwrap().gradient.unwrap();
        assert_ne!(grad.get(2, 2), Some((0.0, 0.0)));
    }

    #[test]
    fn sparse_run_lists_contour_pixels() {
        let config = OutlineConfig { encoding: EncodingMode::Sparse, ..Default::default() };
        let pipeline = OutlinePipeline::new(config).unwrap();
        let mask = disc(32, 10.0);

        let frame = pipeline.run(&mask).unwrap();
        let contour = pipeline.process(&mask).unwrap().contour;
        assert_eq!(frame.declared() as usize, contour.count());
        assert_eq!(decode_sparse(frame.as_bytes()).unwrap().len(), contour.count());
    }

    #[test]
    fn empty_mask_degrades_to_empty_overlay() {
        let pipeline = OutlinePipeline::new(OutlineConfig::default()).unwrap();
        let result = pipeline.process(&RegionMask::zeros(16, 16)).unwrap();

        assert_eq!(result.boundary.count(), 0);
        assert!(result.normalized.as_array().iter().all(|&v| v == 0));
        assert_eq!(result.contour.count(), 0);
        assert!(pipeline.overlay(&result).unwrap().pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
