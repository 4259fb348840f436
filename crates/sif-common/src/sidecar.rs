//! Sidecar georeferencing metadata written next to exported images.
//!
//! The viewer parses exactly the four bound keys plus `width`, `height`
//! and an optional `crs` string, so this file is a bit-exact contract:
//!
//! ```json
//! {
//!   "bounds": { "left": -180.0, "bottom": -90.0, "right": 180.0, "top": 90.0 },
//!   "width": 7200,
//!   "height": 3600,
//!   "crs": "EPSG:4326"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{SifError, SifResult};

/// Geographic bounds as serialized to the sidecar file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl From<BoundingBox> for Bounds {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            left: bbox.min_x,
            bottom: bbox.min_y,
            right: bbox.max_x,
            top: bbox.max_y,
        }
    }
}

impl From<Bounds> for BoundingBox {
    fn from(b: Bounds) -> Self {
        BoundingBox::new(b.left, b.bottom, b.right, b.top)
    }
}

/// Georeferencing metadata for an image that carries no embedded geospatial tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarMetadata {
    pub bounds: Bounds,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl SidecarMetadata {
    pub fn new(bbox: BoundingBox, width: u32, height: u32, crs: Option<String>) -> Self {
        Self {
            bounds: bbox.into(),
            width,
            height,
            crs,
        }
    }

    /// The extent the viewer places the image into.
    pub fn extent(&self) -> BoundingBox {
        self.bounds.into()
    }

    /// CRS string, falling back to the viewer default when absent.
    pub fn crs_or_default(&self) -> String {
        self.crs.clone().unwrap_or_else(|| "EPSG:4326".to_string())
    }

    /// Write as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> SifResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            SifError::WriteError(format!("{}: {}", path.display(), e))
        })
    }

    /// Read back from a JSON file.
    pub fn read(path: &Path) -> SifResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            SifError::DataReadError(format!("{}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SidecarMetadata {
        SidecarMetadata::new(
            BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            7200,
            3600,
            Some("EPSG:4326".to_string()),
        )
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["bounds"]["left"], -180.0);
        assert_eq!(json["bounds"]["bottom"], -90.0);
        assert_eq!(json["bounds"]["right"], 180.0);
        assert_eq!(json["bounds"]["top"], 90.0);
        assert_eq!(json["width"], 7200);
        assert_eq!(json["height"], 3600);
        assert_eq!(json["crs"], "EPSG:4326");
    }

    #[test]
    fn test_round_trip_reproduces_extent() {
        let meta = sample();
        let json = serde_json::to_string(&meta).unwrap();
        let back: SidecarMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.extent(), meta.extent());
    }

    #[test]
    fn test_missing_crs_falls_back() {
        let json = r#"{"bounds":{"left":0,"bottom":0,"right":1,"top":1},"width":10,"height":10}"#;
        let meta: SidecarMetadata = serde_json::from_str(json).unwrap();
        assert!(meta.crs.is_none());
        assert_eq!(meta.crs_or_default(), "EPSG:4326");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");

        let meta = sample();
        meta.write(&path).unwrap();
        let back = SidecarMetadata::read(&path).unwrap();
        assert_eq!(back, meta);
    }
}
