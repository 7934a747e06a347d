mod arrows;
mod bands;
mod boundary;
mod distance;
mod gradient;
pub mod grid;
mod normalize;
mod render;

pub use arrows::{draw_arrows_mut, render_arrows, ArrowStyle};
pub use bands::{band_outline, band_width};
pub use boundary::{extract_boundary, BorderPolicy};
pub use distance::compute_distance;
pub use gradient::compute_gradient;
pub use grid::{
    BoundaryMask, ContourMask, GradientField, NormalizedField, RegionMask, ScalarField,
};
pub use normalize::{normalize, normalize_to};
pub use render::{cutout, render_contours, render_level_sets};
