//! Remote archive access for SIF granules.
//!
//! The archive publishes one JSON document per dataset describing its
//! available time range and granule list; granule files themselves are
//! plain HTTP objects. This crate answers "what dates exist", "which file
//! is date X", and "fetch this date range", classifying range results
//! into downloaded / no-data / failed buckets.

pub mod catalog;
pub mod download;

use thiserror::Error;

pub use catalog::{CatalogClient, DatasetDocument, GranuleEntry};
pub use download::{DownloadOutcome, Downloader};

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error types for archive access.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Invalid catalog document: {0}")]
    InvalidCatalog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download failed: {0}")]
    DownloadFailed(String),
}
