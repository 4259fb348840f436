//! Error types shared across the SIF pipeline.

use thiserror::Error;

/// Result type alias using SifError.
pub type SifResult<T> = Result<T, SifError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum SifError {
    // === Input errors ===
    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Data errors ===
    #[error("Data not available for date: {0}")]
    DataNotAvailable(String),

    #[error("Failed to read data: {0}")]
    DataReadError(String),

    #[error("Invalid GeoTIFF data: {0}")]
    GeoTiffError(String),

    #[error("Invalid NetCDF data: {0}")]
    NetCdfError(String),

    // === Output errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    // === Infrastructure errors ===
    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

// Conversion from common error types
impl From<std::io::Error> for SifError {
    fn from(err: std::io::Error) -> Self {
        SifError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for SifError {
    fn from(err: serde_json::Error) -> Self {
        SifError::InternalError(format!("JSON error: {}", err))
    }
}

impl From<crate::bbox::BboxParseError> for SifError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        SifError::InvalidBbox(err.to_string())
    }
}

impl From<crate::time::TimeParseError> for SifError {
    fn from(err: crate::time::TimeParseError) -> Self {
        SifError::InvalidTime(err.to_string())
    }
}
