//! Gridding and quicklook generation for a month of downloaded granules.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use granule_reader::SifSample;
use gridder::{write_netcdf, MeanGrid, FILL_VALUE};
use renderer::{encode_png, render_grid_mean, scatter_samples, ColorScale, RenderedImage};
use sif_common::{BoundingBox, Month, SidecarMetadata};

use crate::config::DatasetConfig;

/// Paths of everything the month run produced.
pub struct MonthOutputs {
    pub grid_path: PathBuf,
    pub mean_png: PathBuf,
    pub scatter_png: PathBuf,
}

/// Grid downloaded granules into a monthly mean and write outputs.
pub fn run_month(
    granule_paths: &[PathBuf],
    dataset: &DatasetConfig,
    month: Month,
    output_dir: &Path,
    quicklook_width: usize,
) -> Result<MonthOutputs> {
    let bbox: BoundingBox = (&dataset.grid.bbox).into();
    let variable = &dataset.dataset.variable;

    let mut grid = MeanGrid::new(bbox, dataset.grid.resolution_degrees)
        .context("Invalid grid configuration")?;
    let mut all_samples: Vec<SifSample> = Vec::new();

    for path in granule_paths {
        match granule_reader::read_samples_in_bbox(path, variable, &bbox) {
            Ok(samples) => {
                grid.add_samples(&samples);
                all_samples.extend(samples);
            }
            // A malformed granule should not sink the whole month.
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable granule"),
        }
    }

    info!(
        granules = granule_paths.len(),
        samples = all_samples.len(),
        occupied_cells = grid.occupied_cells(),
        "Accumulated month"
    );

    let month_dir = output_dir.join("gridded").join(&dataset.dataset.id);
    fs::create_dir_all(&month_dir)?;

    let stem = format!("{}_{}", dataset.dataset.id, month);
    let grid_path = month_dir.join(format!("{}.nc", stem));
    write_netcdf(&grid, variable, &grid_path).context("Failed to write gridded mean")?;

    let scale = ColorScale::viridis();

    // Quicklook height follows the bbox aspect ratio.
    let quicklook_height = ((quicklook_width as f64 * bbox.height() / bbox.width()).round()
        as usize)
        .max(1);

    let mean_png = month_dir.join(format!("{}_mean.png", stem));
    let means = grid.mean();
    let mean_img = render_grid_mean(&means, grid.width(), grid.height(), FILL_VALUE, &scale)
        .context("Failed to render gridded mean")?;
    write_quicklook(&mean_img, bbox, &mean_png)?;

    let scatter_png = month_dir.join(format!("{}_samples.png", stem));
    let scatter_img = scatter_samples(
        &all_samples,
        &bbox,
        quicklook_width,
        quicklook_height,
        &scale,
    )
    .context("Failed to render sample scatter")?;
    write_quicklook(&scatter_img, bbox, &scatter_png)?;

    Ok(MonthOutputs {
        grid_path,
        mean_png,
        scatter_png,
    })
}

/// Encode a rendered image and drop its sidecar next to it.
fn write_quicklook(image: &RenderedImage, bbox: BoundingBox, path: &Path) -> Result<()> {
    let png = encode_png(&image.pixels, image.width, image.height)?;
    fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;

    let metadata = SidecarMetadata::new(
        bbox,
        image.width as u32,
        image.height as u32,
        Some("EPSG:4326".to_string()),
    );
    metadata.write(&path.with_extension("json"))?;
    Ok(())
}
