use crate::error::{OutlineError, Result};
use ndarray::{Array2, Zip};

/// Defines a `{0, 1}` byte grid with the accessors shared by all masks.
/// Grids are indexed `[y, x]`.
macro_rules! binary_grid {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(Array2<u8>);

        impl $name {
            /// Wraps an array, mapping every non-zero cell to 1.
            pub fn from_array(mut data: Array2<u8>) -> Self {
                data.mapv_inplace(|v| u8::from(v != 0));
                Self(data)
            }

            /// Builds a grid from a per-pixel predicate `f(x, y)`.
            pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
                Self(Array2::from_shape_fn((height, width), |(y, x)| u8::from(f(x, y))))
            }

            /// An all-zero grid.
            pub fn zeros(width: usize, height: usize) -> Self {
                Self(Array2::zeros((height, width)))
            }

            pub fn width(&self) -> usize {
                self.0.ncols()
            }

            pub fn height(&self) -> usize {
                self.0.nrows()
            }

            /// `(height, width)`
            pub fn shape(&self) -> (usize, usize) {
                self.0.dim()
            }

            /// True if pixel `(x, y)` is set. Out-of-bounds reads are unset.
            pub fn get(&self, x: usize, y: usize) -> bool {
                self.0.get((y, x)).is_some_and(|&v| v != 0)
            }

            /// Number of set pixels.
            pub fn count(&self) -> usize {
                self.0.iter().filter(|&&v| v != 0).count()
            }

            /// Coordinates `(x, y)` of set pixels in row-major scan order.
            pub fn lit_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
                self.0
                    .indexed_iter()
                    .filter(|(_, &v)| v != 0)
                    .map(|((y, x), _)| (x, y))
            }

            pub fn as_array(&self) -> &Array2<u8> {
                &self.0
            }
        }
    };
}

binary_grid!(
    /// Binary foreground mask handed over by the segmentation collaborator.
    RegionMask
);

binary_grid!(
    /// One-pixel-thick foreground/background interface.
    BoundaryMask
);

binary_grid!(
    /// Pixels lying on level-set band boundaries.
    ContourMask
);

impl RegionMask {
    /// Builds a mask from a row-major byte buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let data = Array2::from_shape_vec((height, width), data).map_err(|_| {
            OutlineError::upstream(format!(
                "mask buffer holds {len} bytes, expected {width}x{height}"
            ))
        })?;
        Ok(Self::from_array(data))
    }

    /// Rejects masks the core must not run on.
    ///
    /// `frame` is the `(width, height)` of the camera frame the mask was
    /// segmented from.
    pub fn check_frame(&self, frame: (u32, u32)) -> Result<()> {
        if self.width() == 0 || self.height() == 0 {
            return Err(OutlineError::upstream("segmentation returned an empty mask"));
        }
        let (width, height) = (frame.0 as usize, frame.1 as usize);
        if (self.width(), self.height()) != (width, height) {
            return Err(OutlineError::upstream(format!(
                "mask is {}x{} but frame is {width}x{height}",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

/// Per-pixel distance to the nearest boundary pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField(Array2<f32>);

impl ScalarField {
    pub fn from_array(data: Array2<f32>) -> Self {
        Self(data)
    }

    pub fn width(&self) -> usize {
        self.0.ncols()
    }

    pub fn height(&self) -> usize {
        self.0.nrows()
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        self.0.dim()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.0.get((y, x)).copied()
    }

    /// `(min, max)` over all pixels, `None` for an empty field.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.0.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.0
    }
}

/// A scalar field rescaled to `0..=255` for the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedField(Array2<u8>);

impl NormalizedField {
    pub fn from_array(data: Array2<u8>) -> Self {
        Self(data)
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        self.0.dim()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.0.get((y, x)).copied()
    }

    pub fn as_array(&self) -> &Array2<u8> {
        &self.0
    }
}

/// Per-pixel `(dx, dy)` of a scalar field.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    dx: Array2<f32>,
    dy: Array2<f32>,
}

impl GradientField {
    /// Pairs two derivative grids of identical shape.
    pub fn new(dx: Array2<f32>, dy: Array2<f32>) -> Result<Self> {
        if dx.dim() != dy.dim() {
            return Err(OutlineError::ShapeMismatch {
                expected: dx.dim(),
                actual: dy.dim(),
            });
        }
        Ok(Self { dx, dy })
    }

    pub fn width(&self) -> usize {
        self.dx.ncols()
    }

    pub fn height(&self) -> usize {
        self.dx.nrows()
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        self.dx.dim()
    }

    /// Gradient vector at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        Some((*self.dx.get((y, x))?, *self.dy.get((y, x))?))
    }

    pub fn dx(&self) -> &Array2<f32> {
        &self.dx
    }

    pub fn dy(&self) -> &Array2<f32> {
        &self.dy
    }

    /// Zeroes every vector where `mask` is unset.
    pub fn mask_outside(&mut self, mask: &RegionMask) -> Result<()> {
        if mask.shape() != self.shape() {
            return Err(OutlineError::ShapeMismatch {
                expected: self.shape(),
                actual: mask.shape(),
            });
        }
        Zip::from(&mut self.dx)
            .and(&mut self.dy)
            .and(mask.as_array())
            .for_each(|dx, dy, &m| {
                if m == 0 {
                    *dx = 0.0;
                    *dy = 0.0;
                }
            });
        Ok(())
    }
}
