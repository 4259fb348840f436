//! Coordinate Reference System identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EPSG-coded coordinate reference system.
///
/// The pipeline works almost exclusively in geographic WGS84 coordinates;
/// this type exists so the sidecar metadata can carry whatever code the
/// source raster declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
}

impl Crs {
    pub fn new(epsg: u32) -> Self {
        Self { epsg }
    }

    /// WGS84 Geographic (lat/lon in degrees), the viewer's fallback.
    pub fn wgs84() -> Self {
        Self { epsg: 4326 }
    }

    /// Parse a CRS string like "EPSG:4326".
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();
        let code = normalized
            .strip_prefix("EPSG:")
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;
        let epsg = code
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;
        Ok(Self { epsg })
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS string: {0}")]
    UnsupportedCrs(String),
}
