//! Granule downloads with idempotent skip and three-bucket results.
//!
//! Downloads stream to a `.partial` file and rename on completion, so a
//! dropped connection never leaves a truncated final file. A file already
//! present at the destination is reported as satisfied without touching
//! the network, which makes re-running a failed range cheap.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use sif_common::DateRange;

use crate::catalog::{DatasetDocument, GranuleEntry};
use crate::{ArchiveError, ArchiveResult};

/// Result buckets for a date-range download.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    /// Local paths of granules now present, including ones that already were.
    pub downloaded: Vec<PathBuf>,
    /// Dates the archive has no granule for.
    pub no_data: Vec<NaiveDate>,
    /// Dates whose download failed, with the error text.
    pub failed: Vec<(NaiveDate, String)>,
}

impl DownloadOutcome {
    /// True when nothing failed (missing archive dates do not count).
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn sort(&mut self) {
        self.downloaded.sort();
        self.no_data.sort();
        self.failed.sort_by_key(|(d, _)| *d);
    }
}

/// Downloads granule files into an output directory.
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(output_dir: &Path) -> ArchiveResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            client,
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetch one granule, skipping the transfer when the file exists.
    #[instrument(skip(self, granule), fields(url = %granule.url))]
    pub async fn fetch_granule(&self, granule: &GranuleEntry) -> ArchiveResult<PathBuf> {
        fs::create_dir_all(&self.output_dir).await?;

        let final_path = self.output_dir.join(granule.filename());
        if final_path.exists() {
            debug!(path = %final_path.display(), "File already present, skipping download");
            return Ok(final_path);
        }

        let temp_path = final_path.with_extension("nc.partial");

        let response = self
            .client
            .get(&granule.url)
            .send()
            .await?
            .error_for_status()?;

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp_path)
            .await?;

        let mut stream = response.bytes_stream();
        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                ArchiveError::DownloadFailed(format!("reading response: {}", e))
            })?;
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Some(expected) = granule.size {
            if bytes != expected {
                fs::remove_file(&temp_path).await.ok();
                return Err(ArchiveError::DownloadFailed(format!(
                    "size mismatch: expected {} bytes, got {}",
                    expected, bytes
                )));
            }
        }

        fs::rename(&temp_path, &final_path).await?;

        info!(path = %final_path.display(), bytes, "Download completed");
        Ok(final_path)
    }

    /// Download every date in the range, sequentially.
    pub async fn download_range(
        &self,
        doc: &DatasetDocument,
        range: &DateRange,
    ) -> DownloadOutcome {
        let mut outcome = DownloadOutcome::default();

        for date in range.dates() {
            match doc.granule_for_date(date) {
                None => outcome.no_data.push(date),
                Some(granule) => match self.fetch_granule(granule).await {
                    Ok(path) => outcome.downloaded.push(path),
                    Err(e) => {
                        warn!(date = %date, error = %e, "Granule download failed");
                        outcome.failed.push((date, e.to_string()));
                    }
                },
            }
        }

        outcome.sort();
        outcome
    }

    /// Download the range with up to `concurrency` transfers in flight.
    ///
    /// Bucket semantics are identical to the sequential variant.
    pub async fn download_range_parallel(
        &self,
        doc: &DatasetDocument,
        range: &DateRange,
        concurrency: usize,
    ) -> DownloadOutcome {
        let results: Vec<_> = futures::stream::iter(range.dates())
            .map(|date| async move {
                match doc.granule_for_date(date) {
                    None => (date, None),
                    Some(granule) => (date, Some(self.fetch_granule(granule).await)),
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut outcome = DownloadOutcome::default();
        for (date, result) in results {
            match result {
                None => outcome.no_data.push(date),
                Some(Ok(path)) => outcome.downloaded.push(path),
                Some(Err(e)) => {
                    warn!(date = %date, error = %e, "Granule download failed");
                    outcome.failed.push((date, e.to_string()));
                }
            }
        }

        outcome.sort();
        outcome
    }
}
