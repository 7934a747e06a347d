use super::grid::{NormalizedField, ScalarField};
use ndarray::Array2;

/// Linearly maps `[min, max]` of `field` onto `0..=255`, truncating.
///
/// A constant field maps to all zeros.
pub fn normalize(field: &ScalarField) -> NormalizedField {
    let _span = tracing::debug_span!("normalize").entered();

    let data = match field.min_max() {
        Some((lo, hi)) if hi > lo => {
            let (lo, span) = (lo as f64, (hi - lo) as f64);
            field
                .as_array()
                .mapv(|v| ((v as f64 - lo) * 255.0 / span).clamp(0.0, 255.0) as u8)
        }
        _ => Array2::zeros(field.shape()),
    };

    NormalizedField::from_array(data)
}

/// Linearly maps `[min, max]` of `field` onto `[lo, hi]`.
///
/// A constant field maps to `lo` everywhere.
pub fn normalize_to(field: &ScalarField, lo: f32, hi: f32) -> Array2<f32> {
    match field.min_max() {
        Some((min, max)) if max > min => {
            let (min, span) = (min as f64, (max - min) as f64);
            let (lo, range) = (lo as f64, (hi - lo) as f64);
            field
                .as_array()
                .mapv(|v| (lo + (v as f64 - min) * range / span) as f32)
        }
        _ => Array2::from_elem(field.shape(), lo),
    }
}
