//! Monthly mean gridding of satellite point samples.
//!
//! Point soundings from many granules are binned onto a fixed-resolution
//! lat/lon grid over a bounding box. Each cell accumulates a running sum
//! and count; the mean is taken once all granules are in. Cells that never
//! receive a sample hold the fill value.
//!
//! Grid convention: row-major, northernmost row first, matching how the
//! rendered images are laid out.

pub mod writer;

use thiserror::Error;
use tracing::debug;

use granule_reader::SifSample;
use sif_common::BoundingBox;

pub use writer::write_netcdf;

/// Result type for gridding operations.
pub type GridResult<T> = Result<T, GridError>;

/// Error types for gridding.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid grid specification: {0}")]
    InvalidSpec(String),

    #[error("Failed to write grid: {0}")]
    WriteError(String),
}

/// Fill value written to cells with no samples.
pub const FILL_VALUE: f32 = -999.0;

/// A fixed-resolution lat/lon accumulation grid.
#[derive(Debug, Clone)]
pub struct MeanGrid {
    bbox: BoundingBox,
    /// Cell size in degrees.
    resolution: f64,
    width: usize,
    height: usize,
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl MeanGrid {
    /// Create an empty grid covering `bbox` at `resolution` degrees per cell.
    ///
    /// The cell count is rounded up so the grid always covers the full box.
    pub fn new(bbox: BoundingBox, resolution: f64) -> GridResult<Self> {
        if !(resolution > 0.0) {
            return Err(GridError::InvalidSpec(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }
        let width = (bbox.width() / resolution).ceil() as usize;
        let height = (bbox.height() / resolution).ceil() as usize;
        if width == 0 || height == 0 {
            return Err(GridError::InvalidSpec(format!(
                "degenerate grid {}x{} for bbox {:?}",
                width, height, bbox
            )));
        }

        Ok(Self {
            bbox,
            resolution,
            width,
            height,
            sums: vec![0.0; width * height],
            counts: vec![0; width * height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Grid cell for a lon/lat point, or None when outside the box.
    fn cell_index(&self, lon: f64, lat: f64) -> Option<usize> {
        if !self.bbox.contains_point(lon, lat) {
            return None;
        }
        // Points exactly on the top/right edge land in the last cell.
        let col = (((lon - self.bbox.min_x) / self.resolution) as usize).min(self.width - 1);
        let row_from_south =
            (((lat - self.bbox.min_y) / self.resolution) as usize).min(self.height - 1);
        let row = self.height - 1 - row_from_south;
        Some(row * self.width + col)
    }

    /// Accumulate one sample. Out-of-box samples are ignored.
    pub fn add_sample(&mut self, sample: &SifSample) {
        if let Some(idx) = self.cell_index(sample.lon, sample.lat) {
            self.sums[idx] += sample.value as f64;
            self.counts[idx] += 1;
        }
    }

    /// Accumulate a batch of samples, returning how many landed in the grid.
    pub fn add_samples(&mut self, samples: &[SifSample]) -> usize {
        let before: u64 = self.counts.iter().map(|&c| c as u64).sum();
        for s in samples {
            self.add_sample(s);
        }
        let after: u64 = self.counts.iter().map(|&c| c as u64).sum();
        (after - before) as usize
    }

    /// Number of cells holding at least one sample.
    pub fn occupied_cells(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Per-cell mean; empty cells hold `FILL_VALUE`.
    pub fn mean(&self) -> Vec<f32> {
        let means: Vec<f32> = self
            .sums
            .iter()
            .zip(&self.counts)
            .map(|(&sum, &count)| {
                if count == 0 {
                    FILL_VALUE
                } else {
                    (sum / count as f64) as f32
                }
            })
            .collect();

        debug!(
            width = self.width,
            height = self.height,
            occupied = self.occupied_cells(),
            "Computed grid mean"
        );

        means
    }

    /// Cell-center latitudes, north to south.
    pub fn lat_centers(&self) -> Vec<f64> {
        (0..self.height)
            .map(|row| self.bbox.max_y - (row as f64 + 0.5) * self.resolution)
            .collect()
    }

    /// Cell-center longitudes, west to east.
    pub fn lon_centers(&self) -> Vec<f64> {
        (0..self.width)
            .map(|col| self.bbox.min_x + (col as f64 + 0.5) * self.resolution)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lon: f64, value: f32) -> SifSample {
        SifSample { lat, lon, value }
    }

    #[test]
    fn test_grid_dimensions() {
        let bbox = BoundingBox::new(-10.0, 40.0, 10.0, 50.0);
        let grid = MeanGrid::new(bbox, 0.5).unwrap();
        assert_eq!(grid.width(), 40);
        assert_eq!(grid.height(), 20);

        assert!(MeanGrid::new(bbox, 0.0).is_err());
        assert!(MeanGrid::new(bbox, -1.0).is_err());
    }

    #[test]
    fn test_cell_assignment_north_first() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let mut grid = MeanGrid::new(bbox, 1.0).unwrap();

        // Northwest corner cell is index 0.
        grid.add_sample(&sample(1.5, 0.5, 7.0));
        let means = grid.mean();
        assert_eq!(means[0], 7.0);
        assert!(means[1..].iter().all(|&v| v == FILL_VALUE));
    }

    #[test]
    fn test_mean_of_multiple_samples() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let mut grid = MeanGrid::new(bbox, 1.0).unwrap();

        let added = grid.add_samples(&[
            sample(0.5, 0.5, 1.0),
            sample(0.4, 0.6, 2.0),
            sample(0.6, 0.4, 6.0),
        ]);
        assert_eq!(added, 3);
        assert_eq!(grid.mean(), vec![3.0]);
    }

    #[test]
    fn test_out_of_bbox_rejected() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let mut grid = MeanGrid::new(bbox, 1.0).unwrap();

        let added = grid.add_samples(&[sample(5.0, 5.0, 1.0), sample(-0.1, 0.5, 1.0)]);
        assert_eq!(added, 0);
        assert_eq!(grid.occupied_cells(), 0);
        assert_eq!(grid.mean(), vec![FILL_VALUE]);
    }

    #[test]
    fn test_edge_points_land_in_last_cell() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let mut grid = MeanGrid::new(bbox, 1.0).unwrap();

        // Exactly on the northeast corner.
        grid.add_sample(&sample(2.0, 2.0, 4.0));
        let means = grid.mean();
        // Top row, rightmost column.
        assert_eq!(means[1], 4.0);
    }

    #[test]
    fn test_cell_centers() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let grid = MeanGrid::new(bbox, 1.0).unwrap();
        assert_eq!(grid.lat_centers(), vec![1.5, 0.5]);
        assert_eq!(grid.lon_centers(), vec![0.5, 1.5]);
    }
}
