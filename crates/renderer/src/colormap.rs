//! Color scales and value-to-pixel mapping.

use tracing::debug;

use crate::{RenderError, RenderResult};

/// Color value in RGBA format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }
}

/// Linear color interpolation.
fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)) as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)) as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)) as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)) as u8,
    )
}

/// A piecewise-linear color scale over normalized [0, 1] values.
#[derive(Debug, Clone)]
pub struct ColorScale {
    /// (position, color) pairs, positions ascending, covering 0..=1.
    stops: Vec<(f32, Color)>,
}

impl ColorScale {
    pub fn new(stops: Vec<(f32, Color)>) -> Self {
        debug_assert!(stops.len() >= 2);
        debug_assert!(stops.windows(2).all(|w| w[0].0 <= w[1].0));
        Self { stops }
    }

    /// Viridis-style scale, the default for SIF products.
    pub fn viridis() -> Self {
        Self::new(vec![
            (0.0, Color::new(68, 1, 84, 255)),
            (0.14, Color::new(70, 50, 127, 255)),
            (0.29, Color::new(54, 92, 141, 255)),
            (0.43, Color::new(39, 127, 142, 255)),
            (0.57, Color::new(31, 161, 135, 255)),
            (0.71, Color::new(74, 194, 109, 255)),
            (0.86, Color::new(159, 218, 58, 255)),
            (1.0, Color::new(253, 231, 37, 255)),
        ])
    }

    /// Color for a normalized value in [0, 1].
    pub fn eval(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mut prev = self.stops[0];
        for &stop in &self.stops[1..] {
            if t <= stop.0 {
                let span = stop.0 - prev.0;
                let frac = if span > 0.0 { (t - prev.0) / span } else { 0.0 };
                return interpolate_color(prev.1, stop.1, frac);
            }
            prev = stop;
        }
        prev.1
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::viridis()
    }
}

/// Parse a scale by name (CLI surface).
impl std::str::FromStr for ColorScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viridis" => Ok(Self::viridis()),
            other => Err(format!("unknown color scale: {}", other)),
        }
    }
}

/// Mask for raw sensor rasters: everything strictly above the sentinel is
/// missing data (GOSIF water/fill codes), as is anything non-finite.
pub fn sentinel_mask(sentinel: f32) -> impl Fn(f32) -> bool {
    move |v| !v.is_finite() || v > sentinel
}

/// Mask for gridded products carrying an explicit fill value.
pub fn fill_mask(fill: f32) -> impl Fn(f32) -> bool {
    move |v| !v.is_finite() || v == fill
}

/// A rendered RGBA image plus the normalization range that produced it.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// RGBA bytes, 4 per pixel, row-major.
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Color scale bounds actually used.
    pub vmin: f32,
    pub vmax: f32,
}

/// Render masked values to a transparent-background RGBA image.
///
/// Masked values never contribute to the normalization range and come out
/// fully transparent. `vmin`/`vmax` override the bounds independently;
/// an absent side falls back to the min/max of the valid data.
pub fn render_masked<F>(
    data: &[f32],
    width: usize,
    height: usize,
    is_masked: F,
    scale: &ColorScale,
    vmin: Option<f32>,
    vmax: Option<f32>,
) -> RenderResult<RenderedImage>
where
    F: Fn(f32) -> bool,
{
    if data.len() != width * height {
        return Err(RenderError::DimensionMismatch(format!(
            "{} values for {}x{} image",
            data.len(),
            width,
            height
        )));
    }

    let (vmin, vmax) = match (vmin, vmax) {
        (Some(lo), Some(hi)) => (lo, hi),
        (lo, hi) => {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for &v in data {
                if is_masked(v) {
                    continue;
                }
                min = min.min(v);
                max = max.max(v);
            }
            if min > max {
                return Err(RenderError::NoValidData);
            }
            (lo.unwrap_or(min), hi.unwrap_or(max))
        }
    };

    let span = vmax - vmin;
    let span = if span.abs() < f32::EPSILON { 1.0 } else { span };

    let mut pixels = vec![0u8; width * height * 4];
    for (i, &v) in data.iter().enumerate() {
        let color = if is_masked(v) {
            Color::transparent()
        } else {
            scale.eval((v - vmin) / span)
        };
        let p = i * 4;
        pixels[p] = color.r;
        pixels[p + 1] = color.g;
        pixels[p + 2] = color.b;
        pixels[p + 3] = color.a;
    }

    debug!(width, height, vmin, vmax, "Rendered image");

    Ok(RenderedImage {
        pixels,
        width,
        height,
        vmin,
        vmax,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_endpoints() {
        let scale = ColorScale::viridis();
        assert_eq!(scale.eval(0.0), Color::new(68, 1, 84, 255));
        assert_eq!(scale.eval(1.0), Color::new(253, 231, 37, 255));
        // Clamped outside [0, 1]
        assert_eq!(scale.eval(-0.5), scale.eval(0.0));
        assert_eq!(scale.eval(2.0), scale.eval(1.0));
    }

    #[test]
    fn test_scale_midpoint_interpolates() {
        let scale = ColorScale::new(vec![
            (0.0, Color::new(0, 0, 0, 255)),
            (1.0, Color::new(200, 100, 50, 255)),
        ]);
        let mid = scale.eval(0.5);
        assert_eq!(mid, Color::new(100, 50, 25, 255));
    }

    #[test]
    fn test_sentinel_excluded_from_range_and_transparent() {
        // sentinel 10: values strictly greater are masked
        let data = vec![0.0, 5.0, 10.0, 10.5, 32766.0];
        let img = render_masked(&data, 5, 1, sentinel_mask(10.0), &ColorScale::viridis(), None, None)
            .unwrap();

        // Range comes from unmasked values only.
        assert_eq!(img.vmin, 0.0);
        assert_eq!(img.vmax, 10.0);

        // Masked pixels fully transparent, unmasked opaque.
        assert_eq!(img.pixels[3], 255); // 0.0
        assert_eq!(img.pixels[7], 255); // 5.0
        assert_eq!(img.pixels[11], 255); // 10.0 (== sentinel stays)
        assert_eq!(img.pixels[15], 0); // 10.5
        assert_eq!(img.pixels[19], 0); // 32766.0
    }

    #[test]
    fn test_all_masked_is_error() {
        let data = vec![f32::NAN, 99.0];
        let err = render_masked(&data, 2, 1, sentinel_mask(1.0), &ColorScale::viridis(), None, None)
            .unwrap_err();
        assert!(matches!(err, RenderError::NoValidData));
    }

    #[test]
    fn test_explicit_range_override() {
        let data = vec![0.0, 100.0];
        let img = render_masked(
            &data,
            2,
            1,
            sentinel_mask(1000.0),
            &ColorScale::viridis(),
            Some(0.0),
            Some(200.0),
        )
        .unwrap();
        assert_eq!((img.vmin, img.vmax), (0.0, 200.0));
    }

    #[test]
    fn test_constant_field_does_not_divide_by_zero() {
        let data = vec![4.2; 9];
        let img =
            render_masked(&data, 3, 3, fill_mask(-999.0), &ColorScale::viridis(), None, None).unwrap();
        // All pixels identical and opaque.
        assert!(img.pixels.chunks_exact(4).all(|p| p == &img.pixels[0..4]));
        assert_eq!(img.pixels[3], 255);
    }

    #[test]
    fn test_one_sided_range_override() {
        let data = vec![0.0, 5.0, 10.0];
        let scale = ColorScale::viridis();

        // Upper bound given, lower from the valid data.
        let img =
            render_masked(&data, 3, 1, fill_mask(-999.0), &scale, None, Some(20.0)).unwrap();
        assert_eq!((img.vmin, img.vmax), (0.0, 20.0));

        // Lower bound given, upper from the valid data.
        let img =
            render_masked(&data, 3, 1, fill_mask(-999.0), &scale, Some(-5.0), None).unwrap();
        assert_eq!((img.vmin, img.vmax), (-5.0, 10.0));
    }

    #[test]
    fn test_range_spans_grid_extremes() {
        let data = test_utils::create_test_grid(4, 3);
        let img =
            render_masked(&data, 4, 3, fill_mask(-999.0), &ColorScale::viridis(), None, None).unwrap();
        assert_eq!(img.vmin, 0.0);
        assert_eq!(img.vmax, 3002.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = render_masked(&[1.0; 5], 2, 2, fill_mask(-999.0), &ColorScale::viridis(), None, None)
            .unwrap_err();
        assert!(matches!(err, RenderError::DimensionMismatch(_)));
    }
}
