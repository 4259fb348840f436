//! Quicklook images: raw point samples and gridded means as PNG-ready
//! RGBA, for a fast visual check of a month of data.

use granule_reader::SifSample;
use sif_common::BoundingBox;
use tracing::debug;

use crate::colormap::{fill_mask, render_masked, ColorScale, RenderedImage};
use crate::{RenderError, RenderResult};

/// Pixel-bin fill marker, safely below any real SIF value.
const EMPTY: f32 = -9.0e9;

/// Render raw point samples as a scatter image over the bounding box.
///
/// Samples are binned per output pixel (mean when several land in one);
/// pixels with no sample are transparent.
pub fn scatter_samples(
    samples: &[SifSample],
    bbox: &BoundingBox,
    width: usize,
    height: usize,
    scale: &ColorScale,
) -> RenderResult<RenderedImage> {
    if width == 0 || height == 0 {
        return Err(RenderError::DimensionMismatch(format!(
            "{}x{} output image",
            width, height
        )));
    }

    let mut sums = vec![0.0f64; width * height];
    let mut counts = vec![0u32; width * height];

    let x_step = bbox.width() / width as f64;
    let y_step = bbox.height() / height as f64;

    let mut binned = 0usize;
    for s in samples {
        if !bbox.contains_point(s.lon, s.lat) {
            continue;
        }
        let col = (((s.lon - bbox.min_x) / x_step) as usize).min(width - 1);
        let row_from_south = (((s.lat - bbox.min_y) / y_step) as usize).min(height - 1);
        let row = height - 1 - row_from_south;
        let idx = row * width + col;
        sums[idx] += s.value as f64;
        counts[idx] += 1;
        binned += 1;
    }

    debug!(total = samples.len(), binned, width, height, "Binned scatter samples");

    let values: Vec<f32> = sums
        .iter()
        .zip(&counts)
        .map(|(&sum, &count)| {
            if count == 0 {
                EMPTY
            } else {
                (sum / count as f64) as f32
            }
        })
        .collect();

    render_masked(&values, width, height, fill_mask(EMPTY), scale, None, None)
}

/// Render a gridded mean (fill-valued empty cells) through the color scale.
pub fn render_grid_mean(
    means: &[f32],
    width: usize,
    height: usize,
    fill_value: f32,
    scale: &ColorScale,
) -> RenderResult<RenderedImage> {
    render_masked(means, width, height, fill_mask(fill_value), scale, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lon: f64, value: f32) -> SifSample {
        SifSample { lat, lon, value }
    }

    #[test]
    fn test_scatter_places_sample() {
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let samples = vec![sample(3.5, 0.5, 1.0)]; // northwest corner
        let img = scatter_samples(&samples, &bbox, 4, 4, &ColorScale::viridis()).unwrap();

        // Pixel (0,0) opaque, rest transparent.
        assert_eq!(img.pixels[3], 255);
        let transparent = img.pixels.chunks_exact(4).skip(1).all(|p| p[3] == 0);
        assert!(transparent);
    }

    #[test]
    fn test_scatter_averages_collisions() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let samples = vec![sample(0.5, 0.5, 1.0), sample(0.5, 0.5, 3.0), sample(0.4, 0.6, 5.0)];
        let img = scatter_samples(&samples, &bbox, 1, 1, &ColorScale::viridis()).unwrap();
        // One pixel holding the mean of all three; as the only value it
        // spans a degenerate range.
        assert_eq!((img.vmin, img.vmax), (3.0, 3.0));
    }

    #[test]
    fn test_scatter_covers_box_of_samples() {
        let bbox = BoundingBox::new(-10.0, 40.0, 10.0, 50.0);
        let samples = test_utils::create_samples_in_box(50, -10.0, 40.0, 10.0, 50.0);
        let img = scatter_samples(&samples, &bbox, 20, 10, &ColorScale::viridis()).unwrap();

        assert_eq!(img.vmin, 0.0);
        assert!((img.vmax - 0.49).abs() < 1e-6);
        let opaque = img.pixels.chunks_exact(4).filter(|p| p[3] == 255).count();
        assert!(opaque > 0 && opaque <= 50);
    }

    #[test]
    fn test_zero_output_dimension_rejected() {
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let samples = vec![sample(1.0, 1.0, 1.0)];

        let err = scatter_samples(&samples, &bbox, 0, 4, &ColorScale::viridis()).unwrap_err();
        assert!(matches!(err, RenderError::DimensionMismatch(_)));
        let err = scatter_samples(&samples, &bbox, 4, 0, &ColorScale::viridis()).unwrap_err();
        assert!(matches!(err, RenderError::DimensionMismatch(_)));
    }

    #[test]
    fn test_grid_mean_fill_transparent() {
        let means = vec![2.0, -999.0, 4.0, -999.0];
        let img = render_grid_mean(&means, 2, 2, -999.0, &ColorScale::viridis()).unwrap();

        assert_eq!((img.vmin, img.vmax), (2.0, 4.0));
        assert_eq!(img.pixels[3], 255);
        assert_eq!(img.pixels[7], 0);
        assert_eq!(img.pixels[11], 255);
        assert_eq!(img.pixels[15], 0);
    }
}
