//! Dataset configuration loading.
//!
//! Datasets are described by YAML files in `<config-dir>/datasets/*.yaml`:
//!
//! ```yaml
//! dataset:
//!   id: tropomi-sif
//!   name: TROPOMI solar-induced fluorescence
//!   variable: sif
//! archive:
//!   catalog_url: https://archive.example/catalog
//! grid:
//!   bbox: { min_lon: -180.0, min_lat: -90.0, max_lon: 180.0, max_lat: 90.0 }
//!   resolution_degrees: 0.5
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use sif_common::BoundingBox;

/// Root configuration loaded from a dataset YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub dataset: DatasetInfo,
    pub archive: ArchiveConfig,
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// NetCDF variable holding the soundings.
    pub variable: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    pub catalog_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    pub bbox: BBoxConfig,
    pub resolution_degrees: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BBoxConfig {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl From<&BBoxConfig> for BoundingBox {
    fn from(b: &BBoxConfig) -> Self {
        BoundingBox::new(b.min_lon, b.min_lat, b.max_lon, b.max_lat)
    }
}

/// Load every dataset config under `<config_dir>/datasets/`.
pub fn load_dataset_configs(config_dir: &Path) -> Result<Vec<DatasetConfig>> {
    let datasets_dir = config_dir.join("datasets");
    if !datasets_dir.is_dir() {
        warn!(dir = %datasets_dir.display(), "No dataset config directory");
        return Ok(Vec::new());
    }

    let mut configs = Vec::new();
    for entry in std::fs::read_dir(&datasets_dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .map_or(false, |e| e == "yaml" || e == "yml");
        if !is_yaml {
            continue;
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: DatasetConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        debug!(id = %config.dataset.id, path = %path.display(), "Loaded dataset config");
        configs.push(config);
    }

    configs.sort_by(|a, b| a.dataset.id.cmp(&b.dataset.id));
    Ok(configs)
}

/// Find a dataset config by id.
pub fn find_dataset(configs: &[DatasetConfig], id: &str) -> Option<DatasetConfig> {
    configs.iter().find(|c| c.dataset.id == id).cloned()
}

/// Built-in TROPOMI SIF defaults used when no config file exists.
pub fn default_config(id: &str) -> DatasetConfig {
    DatasetConfig {
        dataset: DatasetInfo {
            id: id.to_string(),
            name: String::new(),
            variable: "sif".to_string(),
        },
        archive: ArchiveConfig {
            catalog_url: "https://archive.example/catalog".to_string(),
        },
        grid: GridConfig {
            bbox: BBoxConfig {
                min_lon: -180.0,
                min_lat: -90.0,
                max_lon: 180.0,
                max_lat: 90.0,
            },
            resolution_degrees: 0.5,
        },
    }
}
