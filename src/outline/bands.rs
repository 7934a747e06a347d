use super::grid::{ContourMask, NormalizedField, RegionMask};
use crate::error::{OutlineError, Result};
use ndarray::Zip;

/// Width of one band in normalized units, `floor(255 / layer_count)`.
///
/// Fails for `layer_count == 0` and for `layer_count > 255`, where the band
/// width would be zero.
pub fn band_width(layer_count: u32) -> Result<u8> {
    match layer_count {
        1..=255 => Ok((255 / layer_count) as u8),
        _ => Err(OutlineError::config(format!(
            "layer count must be in 1..=255, got {layer_count}"
        ))),
    }
}

/// Marks pixels whose normalized value is a multiple of the band width.
///
/// Marks outside `mask` are cleared unless `include_outside` is set.
pub fn band_outline(
    normalized: &NormalizedField,
    layer_count: u32,
    mask: &RegionMask,
    include_outside: bool,
) -> Result<ContourMask> {
    let width = band_width(layer_count)?;
    if normalized.shape() != mask.shape() {
        return Err(OutlineError::ShapeMismatch {
            expected: mask.shape(),
            actual: normalized.shape(),
        });
    }
    let _span = tracing::debug_span!("band_outline", layer_count, width).entered();

    let contour = Zip::from(normalized.as_array())
        .and(mask.as_array())
        .map_collect(|&v, &m| u8::from(v % width == 0 && (include_outside || m != 0)));

    Ok(ContourMask::from_array(contour))
}
