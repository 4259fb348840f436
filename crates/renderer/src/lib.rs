//! Colormapped raster rendering for SIF products.
//!
//! Turns masked grid values into transparent-background RGBA images and
//! encodes them as PNG. The PNG encoder is implemented here over
//! flate2/crc32fast rather than pulling in a full image stack; gridded
//! products quantize to few colors, so the indexed path usually wins.

pub mod colormap;
pub mod png;
pub mod quicklook;

use thiserror::Error;

pub use colormap::{fill_mask, render_masked, sentinel_mask, Color, ColorScale, RenderedImage};
pub use png::encode_png;
pub use quicklook::{render_grid_mean, scatter_samples};

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Error types for rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Image dimensions do not match data: {0}")]
    DimensionMismatch(String),

    #[error("No valid data to normalize")]
    NoValidData,

    #[error("PNG encoding failed: {0}")]
    EncodeError(String),
}
