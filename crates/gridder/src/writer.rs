//! NetCDF output for gridded monthly means.

use std::path::Path;

use tracing::info;

use crate::{GridError, GridResult, MeanGrid, FILL_VALUE};

/// Write the grid mean as a CF-style netCDF file.
///
/// Layout: `lat`/`lon` dimensions with cell-center coordinate variables and
/// a 2-D data variable named `var_name` carrying a `_FillValue` attribute.
pub fn write_netcdf(grid: &MeanGrid, var_name: &str, path: &Path) -> GridResult<()> {
    let means = grid.mean();
    let lats = grid.lat_centers();
    let lons = grid.lon_centers();

    // netcdf::create truncates any existing file.
    let mut file = netcdf::create(path)
        .map_err(|e| GridError::WriteError(format!("{}: {}", path.display(), e)))?;

    let wrap = |e: netcdf::Error| GridError::WriteError(e.to_string());

    file.add_attribute("title", format!("Monthly mean {}", var_name))
        .map_err(wrap)?;
    file.add_dimension("lat", grid.height()).map_err(wrap)?;
    file.add_dimension("lon", grid.width()).map_err(wrap)?;

    {
        let mut lat_var = file.add_variable::<f64>("lat", &["lat"]).map_err(wrap)?;
        lat_var.put_attribute("units", "degrees_north").map_err(wrap)?;
        lat_var.put_values(&lats, ..).map_err(wrap)?;
    }

    {
        let mut lon_var = file.add_variable::<f64>("lon", &["lon"]).map_err(wrap)?;
        lon_var.put_attribute("units", "degrees_east").map_err(wrap)?;
        lon_var.put_values(&lons, ..).map_err(wrap)?;
    }

    {
        let mut data_var = file
            .add_variable::<f32>(var_name, &["lat", "lon"])
            .map_err(wrap)?;
        data_var.put_attribute("_FillValue", FILL_VALUE).map_err(wrap)?;
        data_var
            .put_attribute("cell_size_degrees", grid.resolution())
            .map_err(wrap)?;
        data_var.put_values(&means, ..).map_err(wrap)?;
    }

    info!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        occupied = grid.occupied_cells(),
        "Wrote gridded mean"
    );

    Ok(())
}
