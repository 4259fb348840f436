//! The GeoTIFF → PNG + sidecar conversion step.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use geotiff_reader::GeoTiffRaster;
use renderer::{encode_png, render_masked, ColorScale};
use sif_common::SidecarMetadata;

/// Conversion knobs from the CLI.
pub struct ConvertOptions {
    /// Values strictly greater than this are missing data.
    pub sentinel: f32,
    /// Explicit lower color-scale bound; None uses the valid-data minimum.
    pub vmin: Option<f32>,
    /// Explicit upper color-scale bound; None uses the valid-data maximum.
    pub vmax: Option<f32>,
    pub scale: ColorScale,
}

/// What was written, for logging and tests.
pub struct ConvertReport {
    pub png_path: PathBuf,
    pub sidecar_path: PathBuf,
    pub vmin: f32,
    pub vmax: f32,
}

/// Convert one raster. The sidecar lands next to the PNG with a `.json`
/// extension.
pub fn convert(input: &Path, output: &Path, options: &ConvertOptions) -> Result<ConvertReport> {
    let raster = GeoTiffRaster::open(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    info!(
        width = raster.width,
        height = raster.height,
        crs = ?raster.crs,
        "Loaded raster"
    );

    // The sentinel handles GOSIF's high fill codes; a producer-declared
    // nodata value may sit anywhere in the range, so mask it separately.
    let sentinel = options.sentinel;
    let nodata = raster.nodata;
    if let Some(nd) = nodata {
        if nd <= sentinel {
            warn!(nodata = nd, "Raster declares in-range nodata, masking it too");
        }
    }
    let is_masked = move |v: f32| {
        !v.is_finite() || v > sentinel || nodata.map_or(false, |nd| v == nd)
    };

    let image = render_masked(
        &raster.data,
        raster.width as usize,
        raster.height as usize,
        is_masked,
        &options.scale,
        options.vmin,
        options.vmax,
    )
    .context("Rendering failed")?;

    let png = encode_png(&image.pixels, image.width, image.height)
        .context("PNG encoding failed")?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let sidecar_path = output.with_extension("json");
    let crs = raster
        .crs
        .map(|c| c.to_string())
        .unwrap_or_else(|| "EPSG:4326".to_string());
    let metadata = SidecarMetadata::new(raster.bounds, raster.width, raster.height, Some(crs));
    metadata.write(&sidecar_path)?;

    Ok(ConvertReport {
        png_path: output.to_path_buf(),
        sidecar_path,
        vmin: image.vmin,
        vmax: image.vmax,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Minimal TIFF fixture, via the same crate the reader uses.
    fn write_tiff(path: &Path, width: u32, height: u32, data: &[f32]) {
        use tiff::encoder::{colortype, TiffEncoder};
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).unwrap();
            encoder
                .write_image::<colortype::Gray32Float>(width, height, data)
                .unwrap();
        }
        fs::write(path, buf.into_inner()).unwrap();
    }

    #[test]
    fn test_convert_writes_png_and_sidecar() {
        let dir = test_utils::scratch_dir();
        let input = test_utils::scratch_path(&dir, "in.tif");
        let output = dir.path().join("out/in.png");

        let data = test_utils::create_sif_raster(8, 4, 100.0);
        write_tiff(&input, 8, 4, &data);

        let report = convert(
            &input,
            &output,
            &ConvertOptions {
                sentinel: 100.0,
                vmin: None,
                vmax: None,
                scale: ColorScale::viridis(),
            },
        )
        .unwrap();

        let png = fs::read(&report.png_path).unwrap();
        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

        let meta = SidecarMetadata::read(&report.sidecar_path).unwrap();
        assert_eq!(meta.width, 8);
        assert_eq!(meta.height, 4);
        assert_eq!(meta.crs_or_default(), "EPSG:4326");

        // Sentinel column was excluded from the normalization range.
        assert!(report.vmax <= 3.0);
    }

    #[test]
    fn test_lone_range_flag_respected() {
        let dir = test_utils::scratch_dir();
        let input = test_utils::scratch_path(&dir, "in.tif");
        let output = test_utils::scratch_path(&dir, "in.png");

        let data = test_utils::create_sif_raster(8, 4, 100.0);
        write_tiff(&input, 8, 4, &data);

        let report = convert(
            &input,
            &output,
            &ConvertOptions {
                sentinel: 100.0,
                vmin: None,
                vmax: Some(10.0),
                scale: ColorScale::viridis(),
            },
        )
        .unwrap();

        // Given bound applied, the other derived from the valid data.
        assert_eq!(report.vmax, 10.0);
        assert_eq!(report.vmin, 0.0);
    }

    #[test]
    fn test_convert_missing_input_fails() {
        let dir = test_utils::scratch_dir();
        let result = convert(
            &test_utils::scratch_path(&dir, "absent.tif"),
            &test_utils::scratch_path(&dir, "out.png"),
            &ConvertOptions {
                sentinel: 32765.0,
                vmin: None,
                vmax: None,
                scale: ColorScale::viridis(),
            },
        );
        assert!(result.is_err());
    }
}
