//! Shared test utilities for the SIF pipeline workspace.
//!
//! Synthetic raster and sounding generators with predictable values, plus
//! temp-dir helpers. Add as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod generators;

pub use generators::*;

use std::path::PathBuf;

/// A scratch directory removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Path inside a scratch dir.
pub fn scratch_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
