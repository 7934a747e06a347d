use crate::error::{OutlineError, Result};
use crate::outline::{band_width, ArrowStyle, BorderPolicy};
use image::Rgb;
use std::fmt;
use std::str::FromStr;

/// Wire format of the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingMode {
    /// Length-prefixed PNG of the colored overlay.
    #[default]
    Dense,
    /// Count-prefixed list of lit pixel coordinates.
    Sparse,
}

impl FromStr for EncodingMode {
    type Err = OutlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dense" | "png" => Ok(Self::Dense),
            "sparse" | "points" => Ok(Self::Sparse),
            other => Err(OutlineError::config(format!("unknown encoding mode '{other}'"))),
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense => f.write_str("dense"),
            Self::Sparse => f.write_str("sparse"),
        }
    }
}

impl FromStr for BorderPolicy {
    type Err = OutlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "foreground" | "fg" => Ok(Self::Foreground),
            "background" | "bg" => Ok(Self::Background),
            other => Err(OutlineError::config(format!("unknown border policy '{other}'"))),
        }
    }
}

/// Channel order in which color triples are written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorOrder {
    #[default]
    Bgr,
    Rgb,
}

impl FromStr for ColorOrder {
    type Err = OutlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bgr" => Ok(Self::Bgr),
            "rgb" => Ok(Self::Rgb),
            other => Err(OutlineError::config(format!("unknown color order '{other}'"))),
        }
    }
}

/// A color triple as typed by the user, e.g. `0,0,255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTriple(pub [u8; 3]);

impl ColorTriple {
    /// Resolves the triple to RGB.
    pub fn to_rgb(self, order: ColorOrder) -> Rgb<u8> {
        let [a, b, c] = self.0;
        match order {
            ColorOrder::Rgb => Rgb([a, b, c]),
            ColorOrder::Bgr => Rgb([c, b, a]),
        }
    }
}

impl FromStr for ColorTriple {
    type Err = OutlineError;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| OutlineError::config(format!("invalid color '{s}': {e}")))?;
        match parts.as_slice() {
            &[a, b, c] => Ok(Self([a, b, c])),
            _ => Err(OutlineError::config(format!(
                "color '{s}' must have three components"
            ))),
        }
    }
}

/// Parameters of the outline pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineConfig {
    /// Side of the square erosion element; odd.
    pub kernel_size: usize,
    /// Number of level-set bands, `1..=255`.
    pub layer_count: u32,
    /// Color of contour pixels on the outer boundary.
    pub outline_color: Rgb<u8>,
    /// Color of inner rings; `None` reuses `outline_color`.
    pub sub_outline_color: Option<Rgb<u8>>,
    /// Keep contour marks and gradients outside the region mask.
    pub include_outside: bool,
    pub border_policy: BorderPolicy,
    pub encoding: EncodingMode,
    /// Compute the gradient field for every frame.
    pub compute_gradient: bool,
    pub arrows: ArrowStyle,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            layer_count: 15,
            outline_color: Rgb([255, 0, 0]),
            sub_outline_color: None,
            include_outside: false,
            border_policy: BorderPolicy::default(),
            encoding: EncodingMode::default(),
            compute_gradient: false,
            arrows: ArrowStyle::default(),
        }
    }
}

impl OutlineConfig {
    /// Checks every value the pipeline would otherwise trip over per frame.
    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(OutlineError::config(format!(
                "kernel size must be odd and >= 1, got {}",
                self.kernel_size
            )));
        }
        band_width(self.layer_count)?;
        if self.arrows.step == 0 {
            return Err(OutlineError::config("arrow step must be >= 1"));
        }
        if !self.arrows.scale.is_finite() || !self.arrows.tip_length.is_finite() {
            return Err(OutlineError::config("arrow scale and tip length must be finite"));
        }
        Ok(())
    }

    /// Color used for the inner rings.
    pub fn ring_color(&self) -> Rgb<u8> {
        self.sub_outline_color.unwrap_or(self.outline_color)
    }
}
