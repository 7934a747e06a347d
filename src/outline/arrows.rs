use super::grid::GradientField;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::f32::consts::FRAC_PI_4;

/// Appearance of gradient arrows.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowStyle {
    /// Grid spacing in pixels.
    pub step: usize,
    /// Multiplier applied to the raw gradient vector.
    pub scale: f32,
    pub color: Rgb<u8>,
    /// Stroke width in pixels.
    pub thickness: u32,
    /// Tip stroke length relative to the arrow length.
    pub tip_length: f32,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            step: 12,
            scale: 0.05,
            color: Rgb([255, 0, 0]),
            thickness: 1,
            tip_length: 0.2,
        }
    }
}

/// Draws the arrows on a black canvas the size of the gradient field.
pub fn render_arrows(gradient: &GradientField, style: &ArrowStyle) -> RgbImage {
    let mut canvas = RgbImage::new(gradient.width() as u32, gradient.height() as u32);
    draw_arrows_mut(&mut canvas, gradient, style);
    canvas
}

/// Draws one arrow per grid point onto `canvas`.
pub fn draw_arrows_mut(canvas: &mut RgbImage, gradient: &GradientField, style: &ArrowStyle) {
    let _span = tracing::debug_span!("draw_arrows", step = style.step).entered();
    let step = style.step.max(1);

    for y in (0..gradient.height()).step_by(step) {
        for x in (0..gradient.width()).step_by(step) {
            let Some((gx, gy)) = gradient.get(x, y) else {
                continue;
            };
            let start = (x as f32, y as f32);
            let end = (
                (x as f32 + style.scale * gx).trunc(),
                (y as f32 + style.scale * gy).trunc(),
            );
            draw_arrow(canvas, start, end, style);
        }
    }
}

fn draw_arrow(canvas: &mut RgbImage, start: (f32, f32), end: (f32, f32), style: &ArrowStyle) {
    let (vx, vy) = (end.0 - start.0, end.1 - start.1);
    let length = vx.hypot(vy);
    if length < 1.0 {
        return;
    }

    thick_segment(canvas, start, end, style);

    // Tip strokes leave the end point at +-45 degrees from the reversed shaft.
    let tip = style.tip_length * length;
    let back = (start.1 - end.1).atan2(start.0 - end.0);
    for angle in [back + FRAC_PI_4, back - FRAC_PI_4] {
        let barb = (
            (end.0 + tip * angle.cos()).round(),
            (end.1 + tip * angle.sin()).round(),
        );
        thick_segment(canvas, end, barb, style);
    }
}

/// Approximates a wide stroke with parallel one-pixel segments.
fn thick_segment(canvas: &mut RgbImage, a: (f32, f32), b: (f32, f32), style: &ArrowStyle) {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let length = vx.hypot(vy);
    let (nx, ny) = if length > 0.0 {
        (-vy / length, vx / length)
    } else {
        (0.0, 0.0)
    };

    let thickness = style.thickness.max(1) as i32;
    let first = -(thickness - 1) / 2;
    for offset in first..first + thickness {
        let o = offset as f32;
        draw_line_segment_mut(
            canvas,
            (a.0 + nx * o, a.1 + ny * o),
            (b.0 + nx * o, b.1 + ny * o),
            style.color,
        );
    }
}
