//! Common types and utilities shared across the SIF pipeline crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod sidecar;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{SifError, SifResult};
pub use sidecar::{Bounds, SidecarMetadata};
pub use time::{DateRange, Month};
