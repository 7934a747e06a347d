use super::grid::{GradientField, ScalarField};
use crate::error::Result;
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis, Zip};

/// First-derivative taps.
const DERIVATIVE: [f32; 5] = [-1.0, -2.0, 0.0, 2.0, 1.0];
/// Smoothing taps orthogonal to the derivative direction.
const SMOOTHING: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];

/// Computes `(d/dx, d/dy)` of `field` at every pixel.
pub fn compute_gradient(field: &ScalarField) -> Result<GradientField> {
    let (height, width) = field.shape();
    let _span = tracing::debug_span!("compute_gradient", width, height).entered();

    let src = field.as_array();
    let dx = separable(src, &DERIVATIVE, &SMOOTHING);
    let dy = separable(src, &SMOOTHING, &DERIVATIVE);

    GradientField::new(dx, dy)
}

/// Correlates rows with `along_x`, then columns with `along_y`.
fn separable(src: &Array2<f32>, along_x: &[f32; 5], along_y: &[f32; 5]) -> Array2<f32> {
    let mut rows = Array2::<f32>::zeros(src.dim());
    Zip::from(rows.lanes_mut(Axis(1)))
        .and(src.lanes(Axis(1)))
        .par_for_each(|dst, lane| correlate_lane(lane, dst, along_x));

    let mut out = Array2::<f32>::zeros(src.dim());
    Zip::from(out.lanes_mut(Axis(0)))
        .and(rows.lanes(Axis(0)))
        .par_for_each(|dst, lane| correlate_lane(lane, dst, along_y));

    out
}

fn correlate_lane(src: ArrayView1<f32>, mut dst: ArrayViewMut1<f32>, kernel: &[f32; 5]) {
    let len = src.len();
    for i in 0..len {
        dst[i] = kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| w * src[reflect101(i as isize + k as isize - 2, len)])
            .sum();
    }
}

/// Maps an out-of-range index back into `0..len` by mirroring without
/// repeating the edge (reflect-101: `dcb|abcd|cba`).
fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = (2 * len - 2) as isize;
    let r = i.rem_euclid(period) as usize;
    if r < len {
        r
    } else {
        period as usize - r
    }
}
