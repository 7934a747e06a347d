use super::grid::{BoundaryMask, ScalarField};
use ndarray::{Array2, ArrayViewMut1, Axis, Zip};

/// Stands in for "no boundary pixel on this lane yet". Finite so that
/// parabola intersections never produce NaN.
const FAR: f64 = 1e20;

/// Exact Euclidean distance from every pixel to the nearest boundary pixel,
/// by the lower envelope of parabolas (Felzenszwalb & Huttenlocher) down
/// each column and then along each row.
///
/// Boundary pixels get exactly 0. An empty boundary saturates the field to
/// the image diagonal.
pub fn compute_distance(boundary: &BoundaryMask) -> ScalarField {
    let (height, width) = boundary.shape();
    let _span = tracing::debug_span!("compute_distance", width, height).entered();

    if boundary.count() == 0 {
        let diagonal = ((width * width + height * height) as f64).sqrt() as f32;
        tracing::debug!("empty boundary, saturating field to {diagonal:.1}");
        return ScalarField::from_array(Array2::from_elem((height, width), diagonal));
    }

    let mut squared = boundary
        .as_array()
        .mapv(|v| if v != 0 { 0.0 } else { FAR });

    Zip::from(squared.lanes_mut(Axis(0))).par_for_each(squared_distance_lane);
    Zip::from(squared.lanes_mut(Axis(1))).par_for_each(squared_distance_lane);

    ScalarField::from_array(squared.mapv(|d| d.sqrt() as f32))
}

/// In-place 1D squared distance transform of a sampled function.
fn squared_distance_lane(mut lane: ArrayViewMut1<f64>) {
    let n = lane.len();
    if n == 0 {
        return;
    }
    let f = lane.to_vec();

    // Parabola vertices of the lower envelope and the boundaries between them.
    let mut v = vec![0usize; n];
    let mut z = vec![0f64; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let intersect = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    for q in 1..n {
        let mut s = intersect(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for q in 0..n {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let offset = q as f64 - v[k] as f64;
        lane[q] = offset * offset + f[v[k]];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn brute_force(boundary: &BoundaryMask, x: usize, y: usize) -> f32 {
        boundary
            .lit_pixels()
            .map(|(bx, by)| {
                let dx = bx as f32 - x as f32;
                let dy = by as f32 - y as f32;
                (dx * dx + dy * dy).sqrt()
            })
            .fold(f32::INFINITY, f32::min)
    }

    #[test]
    fn matches_brute_force_on_scattered_boundary() {
        let boundary = BoundaryMask::from_fn(23, 17, |x, y| (x * 13 + y * 7) % 29 == 0);
        let field = compute_distance(&boundary);

        for y in 0..17 {
            for x in 0..23 {
                let expected = brute_force(&boundary, x, y);
                assert_abs_diff_eq!(field.get(x, y).unwrap(), expected, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn boundary_pixels_are_zero_and_field_non_negative() {
        let boundary = BoundaryMask::from_fn(12, 9, |x, y| x == 3 || y == 7);
        let field = compute_distance(&boundary);

        for (x, y) in boundary.lit_pixels() {
            assert_eq!(field.get(x, y), Some(0.0));
        }
        assert!(field.as_array().iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn single_pixel_gives_euclidean_cone() {
        let boundary = BoundaryMask::from_fn(9, 9, |x, y| x == 4 && y == 4);
        let field = compute_distance(&boundary);

        assert_abs_diff_eq!(field.get(7, 8).unwrap(), 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(field.get(0, 0).unwrap(), 32f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn empty_boundary_saturates_to_diagonal() {
        let boundary = BoundaryMask::zeros(3, 4);
        let field = compute_distance(&boundary);

        assert!(field.as_array().iter().all(|&d| d == 5.0));
    }
}
