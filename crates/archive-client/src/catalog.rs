//! Dataset catalog lookup.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use sif_common::DateRange;

use crate::{ArchiveError, ArchiveResult};

/// One granule as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranuleEntry {
    pub date: NaiveDate,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl GranuleEntry {
    /// Local filename for this granule, from the last URL path segment.
    pub fn filename(&self) -> String {
        self.url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.nc", self.date))
    }
}

/// The JSON document the archive serves per dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granules: Vec<GranuleEntry>,
}

impl DatasetDocument {
    /// First and last available dates.
    pub fn time_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Granule covering a specific date, None when the archive has nothing.
    pub fn granule_for_date(&self, date: NaiveDate) -> Option<&GranuleEntry> {
        self.granules.iter().find(|g| g.date == date)
    }
}

/// HTTP client for the dataset catalog.
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client rooted at the catalog base URL.
    pub fn new(base_url: &str) -> ArchiveResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the dataset document for an id.
    #[instrument(skip(self))]
    pub async fn dataset(&self, dataset_id: &str) -> ArchiveResult<DatasetDocument> {
        let url = format!("{}/datasets/{}.json", self.base_url, dataset_id);
        debug!(url = %url, "Fetching dataset document");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ArchiveError::DatasetNotFound(dataset_id.to_string()));
        }
        let response = response.error_for_status()?;

        let doc: DatasetDocument = response
            .json()
            .await
            .map_err(|e| ArchiveError::InvalidCatalog(e.to_string()))?;

        if doc.start_date > doc.end_date {
            return Err(ArchiveError::InvalidCatalog(format!(
                "start_date {} after end_date {}",
                doc.start_date, doc.end_date
            )));
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn doc() -> DatasetDocument {
        serde_json::from_str(
            r#"{
                "id": "tropomi-sif",
                "title": "TROPOMI solar-induced fluorescence",
                "start_date": "2018-05-01",
                "end_date": "2018-05-03",
                "granules": [
                    {"date": "2018-05-01", "url": "https://archive.example/sif/s20180501.nc", "size": 1024},
                    {"date": "2018-05-03", "url": "https://archive.example/sif/s20180503.nc"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_document_parse_and_range() {
        let d = doc();
        assert_eq!(d.id, "tropomi-sif");
        let range = d.time_range();
        assert_eq!(range.start, date(2018, 5, 1));
        assert_eq!(range.end, date(2018, 5, 3));
    }

    #[test]
    fn test_granule_for_date() {
        let d = doc();
        assert!(d.granule_for_date(date(2018, 5, 1)).is_some());
        // Listed range but no granule: archive gap.
        assert!(d.granule_for_date(date(2018, 5, 2)).is_none());
        assert!(d.granule_for_date(date(2019, 1, 1)).is_none());
    }

    #[test]
    fn test_granule_filename() {
        let d = doc();
        let g = d.granule_for_date(date(2018, 5, 1)).unwrap();
        assert_eq!(g.filename(), "s20180501.nc");

        let bare = GranuleEntry {
            date: date(2018, 5, 2),
            url: "https://archive.example/".to_string(),
            size: None,
        };
        assert_eq!(bare.filename(), "2018-05-02.nc");
    }
}
