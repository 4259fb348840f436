//! Synthetic data generators with predictable, verifiable values.

use granule_reader::SifSample;

/// Grid where each cell is `col * 1000 + row`, making index errors obvious.
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// SIF-like raster values in [0, 3) with a sentinel column.
///
/// The rightmost column holds `sentinel + 1.0` so masking tests always have
/// pixels to exclude.
pub fn create_sif_raster(width: usize, height: usize, sentinel: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            if col == width - 1 {
                data.push(sentinel + 1.0);
            } else {
                data.push(((row + col) % 30) as f32 * 0.1);
            }
        }
    }
    data
}

/// Evenly spaced soundings covering a lat/lon box.
///
/// Value of each sample is `index as f32 * 0.01`.
pub fn create_samples_in_box(
    count: usize,
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
) -> Vec<SifSample> {
    let n = count.max(1);
    (0..count)
        .map(|i| {
            let frac = i as f64 / n as f64;
            SifSample {
                lon: min_lon + frac * (max_lon - min_lon),
                lat: min_lat + frac * (max_lat - min_lat),
                value: i as f32 * 0.01,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_values() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[1], 1000.0);
        assert_eq!(grid[10], 1.0);
    }

    #[test]
    fn test_sif_raster_sentinel_column() {
        let raster = create_sif_raster(4, 3, 100.0);
        for row in 0..3 {
            assert_eq!(raster[row * 4 + 3], 101.0);
        }
        assert!(raster[0] <= 3.0);
    }

    #[test]
    fn test_samples_stay_in_box() {
        let samples = create_samples_in_box(20, -10.0, 40.0, 10.0, 50.0);
        assert_eq!(samples.len(), 20);
        for s in &samples {
            assert!(s.lon >= -10.0 && s.lon <= 10.0);
            assert!(s.lat >= 40.0 && s.lat <= 50.0);
        }
    }
}
