use super::grid::{BoundaryMask, RegionMask};
use crate::error::{OutlineError, Result};
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis, Zip};

/// How erosion treats pixels outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderPolicy {
    /// Out-of-bounds pixels count as foreground: regions touching the image
    /// edge are not outlined along that edge.
    #[default]
    Foreground,
    /// Out-of-bounds pixels count as background: erosion shrinks regions
    /// that touch the image edge.
    Background,
}

/// Returns `mask - erode(mask)` for a `kernel_size` x `kernel_size` element.
///
/// The square element is separable: a horizontal pass, then a vertical one.
pub fn extract_boundary(
    mask: &RegionMask,
    kernel_size: usize,
    border: BorderPolicy,
) -> Result<BoundaryMask> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(OutlineError::config(format!(
            "kernel size must be odd and >= 1, got {kernel_size}"
        )));
    }
    let _span = tracing::debug_span!("extract_boundary", kernel_size).entered();

    let eroded = erode(mask.as_array(), kernel_size / 2, border);
    let mut boundary = mask.as_array().clone();
    Zip::from(&mut boundary)
        .and(&eroded)
        .for_each(|b, &e| *b = b.saturating_sub(e));

    Ok(BoundaryMask::from_array(boundary))
}

fn erode(src: &Array2<u8>, radius: usize, border: BorderPolicy) -> Array2<u8> {
    if radius == 0 {
        return src.clone();
    }

    let mut horizontal = Array2::<u8>::zeros(src.dim());
    Zip::from(horizontal.rows_mut())
        .and(src.rows())
        .for_each(|dst, row| erode_lane(row, dst, radius, border));

    let mut out = Array2::<u8>::zeros(src.dim());
    Zip::from(out.lanes_mut(Axis(0)))
        .and(horizontal.lanes(Axis(0)))
        .for_each(|dst, col| erode_lane(col, dst, radius, border));

    out
}

/// 1D erosion: a cell survives if every cell within `radius` is set.
fn erode_lane(src: ArrayView1<u8>, mut dst: ArrayViewMut1<u8>, radius: usize, border: BorderPolicy) {
    let len = src.len();
    for i in 0..len {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius).min(len - 1);
        let clipped = i < radius || i + radius >= len;
        if clipped && border == BorderPolicy::Background {
            dst[i] = 0;
            continue;
        }
        dst[i] = u8::from((lo..=hi).all(|j| src[j] != 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: usize, lo: usize, hi: usize) -> RegionMask {
        RegionMask::from_fn(size, size, |x, y| (lo..hi).contains(&x) && (lo..hi).contains(&y))
    }

    #[test]
    fn full_frame_mask_with_foreground_border_has_no_boundary() {
        let mask = RegionMask::from_fn(4, 4, |_, _| true);
        let boundary = extract_boundary(&mask, 3, BorderPolicy::Foreground).unwrap();
        assert_eq!(boundary.count(), 0);
    }

    #[test]
    fn full_frame_mask_with_background_border_yields_frame_ring() {
        let mask = RegionMask::from_fn(4, 4, |_, _| true);
        let boundary = extract_boundary(&mask, 3, BorderPolicy::Background).unwrap();

        assert_eq!(boundary.count(), 12);
        assert!(!boundary.get(1, 1));
        assert!(!boundary.get(2, 2));
        assert!(boundary.get(0, 3));
    }

    #[test]
    fn square_yields_one_pixel_perimeter() {
        let mask = square(10, 3, 7);
        let boundary = extract_boundary(&mask, 3, BorderPolicy::default()).unwrap();

        assert_eq!(boundary.count(), 12);
        for (x, y) in boundary.lit_pixels() {
            let on_edge = x == 3 || x == 6 || y == 3 || y == 6;
            assert!(on_edge, "({x}, {y}) is not on the square's perimeter");
        }
        assert!(!boundary.get(4, 4));
        assert!(!boundary.get(5, 5));
    }

    #[test]
    fn boundary_is_subset_of_mask() {
        let mask = RegionMask::from_fn(16, 12, |x, y| (x * 7 + y * 3) % 5 != 0);
        for kernel in [1, 3, 5] {
            for border in [BorderPolicy::Foreground, BorderPolicy::Background] {
                let boundary = extract_boundary(&mask, kernel, border).unwrap();
                assert!(boundary.lit_pixels().all(|(x, y)| mask.get(x, y)));
            }
        }
    }

    #[test]
    fn wider_kernel_thickens_boundary() {
        let mask = square(20, 4, 16);
        let thin = extract_boundary(&mask, 3, BorderPolicy::default()).unwrap();
        let thick = extract_boundary(&mask, 5, BorderPolicy::default()).unwrap();

        assert_eq!(thin.count(), 44);
        assert_eq!(thick.count(), 12 * 12 - 8 * 8);
    }

    #[test]
    fn unit_kernel_and_empty_mask_yield_empty_boundary() {
        let mask = square(8, 2, 6);
        assert_eq!(extract_boundary(&mask, 1, BorderPolicy::default()).unwrap().count(), 0);

        let empty = RegionMask::zeros(8, 8);
        for border in [BorderPolicy::Foreground, BorderPolicy::Background] {
            assert_eq!(extract_boundary(&empty, 3, border).unwrap().count(), 0);
        }
    }

    #[test]
    fn even_kernel_is_rejected() {
        let mask = square(8, 2, 6);
        assert!(matches!(
            extract_boundary(&mask, 4, BorderPolicy::default()),
            Err(OutlineError::Configuration(_))
        ));
    }
}
