use super::grid::{BoundaryMask, ContourMask, RegionMask, ScalarField};
use super::normalize::normalize_to;
use crate::error::{OutlineError, Result};
use image::{Rgb, RgbImage};

/// Black image with contour pixels painted.
///
/// Contour pixels on the outer boundary use `outline`; the inner rings use
/// `sub_outline`.
pub fn render_contours(
    contour: &ContourMask,
    boundary: &BoundaryMask,
    outline: Rgb<u8>,
    sub_outline: Rgb<u8>,
) -> Result<RgbImage> {
    same_shape(contour.shape(), boundary.shape())?;
    let _span = tracing::debug_span!("render_contours").entered();

    let mut image = RgbImage::new(contour.width() as u32, contour.height() as u32);
    for (x, y) in contour.lit_pixels() {
        let color = if boundary.get(x, y) { outline } else { sub_outline };
        image.put_pixel(x as u32, y as u32, color);
    }
    Ok(image)
}

/// Level-set visualization: the green channel is bright at the outline and
/// fades toward the deepest interior point; boundary pixels use `outline`.
pub fn render_level_sets(
    field: &ScalarField,
    mask: &RegionMask,
    boundary: &BoundaryMask,
    outline: Rgb<u8>,
    include_outside: bool,
) -> Result<RgbImage> {
    same_shape(mask.shape(), field.shape())?;
    same_shape(mask.shape(), boundary.shape())?;

    let shade = normalize_to(field, 255.0, 0.0);
    let mut image = RgbImage::new(mask.width() as u32, mask.height() as u32);
    for ((y, x), &g) in shade.indexed_iter() {
        let pixel = if boundary.get(x, y) {
            outline
        } else if include_outside || mask.get(x, y) {
            Rgb([0, g.clamp(0.0, 255.0) as u8, 0])
        } else {
            continue;
        };
        image.put_pixel(x as u32, y as u32, pixel);
    }
    Ok(image)
}

/// Keeps `frame` pixels under the mask and blacks out the rest.
pub fn cutout(frame: &RgbImage, mask: &RegionMask) -> Result<RgbImage> {
    let (width, height) = frame.dimensions();
    same_shape(mask.shape(), (height as usize, width as usize))?;

    Ok(RgbImage::from_fn(width, height, |x, y| {
        if mask.get(x as usize, y as usize) {
            *frame.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

fn same_shape(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(OutlineError::ShapeMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const GREEN: Rgb<u8> = Rgb([57, 255, 20]);

    #[test]
    fn contours_use_outline_color_on_boundary_only() {
        let contour = ContourMask::from_array(array![[1u8, 1, 0]]);
        let boundary = BoundaryMask::from_array(array![[1u8, 0, 0]]);

        let image = render_contours(&contour, &boundary, RED, GREEN).unwrap();
        assert_eq!(image.get_pixel(0, 0), &RED);
        assert_eq!(image.get_pixel(1, 0), &GREEN);
        assert_eq!(image.get_pixel(2, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn level_sets_fade_inward_and_clip_to_mask() {
        let field = ScalarField::from_array(array![[0.0, 1.0, 2.0, 3.0]]);
        let mask = RegionMask::from_array(array![[1u8, 1, 1, 0]]);
        let boundary = BoundaryMask::from_array(array![[1u8, 0, 0, 0]]);

        let image = render_level_sets(&field, &mask, &boundary, RED, false).unwrap();
        assert_eq!(image.get_pixel(0, 0), &RED);
        assert_eq!(image.get_pixel(1, 0), &Rgb([0, 170, 0]));
        assert_eq!(image.get_pixel(2, 0), &Rgb([0, 85, 0]));
        assert_eq!(image.get_pixel(3, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn cutout_keeps_masked_pixels() {
        let frame = RgbImage::from_pixel(2, 1, Rgb([9, 8, 7]));
        let mask = RegionMask::from_array(array![[0u8, 1]]);

        let image = cutout(&frame, &mask).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([9, 8, 7]));
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let contour = ContourMask::zeros(3, 2);
        let boundary = BoundaryMask::zeros(2, 3);
        assert!(matches!(
            render_contours(&contour, &boundary, RED, GREEN),
            Err(OutlineError::ShapeMismatch { .. })
        ));
    }
}
