//! NetCDF reading for satellite SIF granules.
//!
//! A granule holds one time window of point soundings: a 1-D data variable
//! (e.g. `sif`) plus matching latitude/longitude coordinate variables.
//! Reading yields the valid point samples with the variable's
//! `_FillValue` rows dropped and `scale_factor`/`add_offset` applied.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use sif_common::BoundingBox;

/// Result type for granule reader operations.
pub type GranuleResult<T> = Result<T, GranuleError>;

/// Error types for granule reading.
#[derive(Error, Debug)]
pub enum GranuleError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose diagnostics to stderr even when errors
/// are handled gracefully by the Rust code (e.g. probing for optional
/// attributes). Call once early; safe to call repeatedly.
pub fn silence_hdf5_errors() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are the
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// One valid satellite sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SifSample {
    pub lat: f64,
    pub lon: f64,
    pub value: f32,
}

/// Candidate names for the latitude coordinate variable.
const LAT_NAMES: &[&str] = &["lat", "latitude", "Latitude"];
/// Candidate names for the longitude coordinate variable.
const LON_NAMES: &[&str] = &["lon", "longitude", "Longitude"];

/// Read the named variable from a granule as point samples.
///
/// Rows equal to the variable's `_FillValue` (or non-finite after
/// scaling) are dropped.
pub fn read_samples(path: &Path, var_name: &str) -> GranuleResult<Vec<SifSample>> {
    silence_hdf5_errors();

    let file = netcdf::open(path)
        .map_err(|e| GranuleError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let var = file
        .variable(var_name)
        .ok_or_else(|| GranuleError::MissingData(format!("{} variable", var_name)))?;

    let raw: Vec<f32> = var
        .get_values(..)
        .map_err(|e| GranuleError::InvalidFormat(format!("Failed to read {}: {}", var_name, e)))?;

    let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);
    let fill_value = get_f32_attr(&var, "_FillValue");

    let lats = read_coordinate(&file, LAT_NAMES)?;
    let lons = read_coordinate(&file, LON_NAMES)?;

    if lats.len() != raw.len() || lons.len() != raw.len() {
        return Err(GranuleError::InvalidFormat(format!(
            "coordinate length mismatch: {} values, {} lats, {} lons",
            raw.len(),
            lats.len(),
            lons.len()
        )));
    }

    let mut samples = Vec::with_capacity(raw.len());
    for i in 0..raw.len() {
        let v = raw[i];
        if let Some(fill) = fill_value {
            if v == fill {
                continue;
            }
        }
        let scaled = v * scale_factor + add_offset;
        if !scaled.is_finite() {
            continue;
        }
        samples.push(SifSample {
            lat: lats[i],
            lon: lons[i],
            value: scaled,
        });
    }

    debug!(
        path = %path.display(),
        total = raw.len(),
        valid = samples.len(),
        "Read granule samples"
    );

    Ok(samples)
}

/// Read samples and keep only those inside the bounding box.
pub fn read_samples_in_bbox(
    path: &Path,
    var_name: &str,
    bbox: &BoundingBox,
) -> GranuleResult<Vec<SifSample>> {
    let mut samples = read_samples(path, var_name)?;
    samples.retain(|s| bbox.contains_point(s.lon, s.lat));
    Ok(samples)
}

fn read_coordinate(file: &netcdf::File, names: &[&str]) -> GranuleResult<Vec<f64>> {
    for name in names {
        if let Some(var) = file.variable(name) {
            return var.get_values(..).map_err(|e| {
                GranuleError::InvalidFormat(format!("Failed to read {}: {}", name, e))
            });
        }
    }
    Err(GranuleError::MissingData(format!(
        "coordinate variable (tried {})",
        names.join(", ")
    )))
}

fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    let attr = var.attribute(name)?;
    match attr.value().ok()? {
        netcdf::AttributeValue::Float(v) => Some(v),
        netcdf::AttributeValue::Double(v) => Some(v as f32),
        netcdf::AttributeValue::Short(v) => Some(v as f32),
        netcdf::AttributeValue::Int(v) => Some(v as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Write a minimal sounding granule for tests.
    fn write_granule(path: &Path, values: &[f32], lats: &[f64], lons: &[f64], fill: f32) {
        let mut file = netcdf::create(path).unwrap();
        file.add_dimension("sounding", values.len()).unwrap();

        let mut var = file.add_variable::<f32>("sif", &["sounding"]).unwrap();
        // netCDF-4 rejects _FillValue set after data is written.
        var.put_attribute("_FillValue", fill).unwrap();
        var.put_values(values, ..).unwrap();

        let mut lat_var = file.add_variable::<f64>("lat", &["sounding"]).unwrap();
        lat_var.put_values(lats, ..).unwrap();

        let mut lon_var = file.add_variable::<f64>("lon", &["sounding"]).unwrap();
        lon_var.put_values(lons, ..).unwrap();
    }

    #[test]
    fn test_read_samples_drops_fill() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("granule.nc");
        write_granule(
            &path,
            &[0.5, -999.0, 1.25, -999.0],
            &[10.0, 11.0, 12.0, 13.0],
            &[20.0, 21.0, 22.0, 23.0],
            -999.0,
        );

        let samples = read_samples(&path, "sif").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], SifSample { lat: 10.0, lon: 20.0, value: 0.5 });
        assert_eq!(samples[1], SifSample { lat: 12.0, lon: 22.0, value: 1.25 });
    }

    #[test]
    fn test_read_samples_in_bbox() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("granule.nc");
        write_granule(
            &path,
            &[1.0, 2.0, 3.0],
            &[0.0, 45.0, 80.0],
            &[0.0, 45.0, 170.0],
            -999.0,
        );

        let bbox = BoundingBox::new(-10.0, -10.0, 50.0, 50.0);
        let samples = read_samples_in_bbox(&path, "sif", &bbox).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| bbox.contains_point(s.lon, s.lat)));
    }

    #[test]
    fn test_missing_variable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("granule.nc");
        write_granule(&path, &[1.0], &[0.0], &[0.0], -999.0);

        let err = read_samples(&path, "nope").unwrap_err();
        assert!(matches!(err, GranuleError::MissingData(_)));
    }
}
