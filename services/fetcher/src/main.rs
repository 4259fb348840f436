//! SIF granule fetcher.
//!
//! Downloads a month of granules from the archive, grids the monthly mean
//! over the configured bounding box, and writes quicklook PNGs (raw
//! sample scatter and gridded mean) alongside the gridded netCDF. Failed
//! dates are reported for a cheap re-run: files already on disk are never
//! re-fetched.

mod config;
mod pipeline;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use archive_client::{CatalogClient, Downloader};
use sif_common::{BoundingBox, Month};

use config::{default_config, find_dataset, load_dataset_configs, BBoxConfig};
use pipeline::run_month;

#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(about = "Download, grid, and plot a month of SIF granules")]
struct Args {
    /// Dataset id (matches a config under <config-dir>/datasets/)
    #[arg(short, long, default_value = "tropomi-sif")]
    dataset: String,

    /// Month to process, as YYYY-MM
    #[arg(short, long)]
    month: String,

    /// Directory for downloaded granules and outputs
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// Concurrent downloads (1 = sequential)
    #[arg(long, default_value = "1")]
    parallel: usize,

    /// Configuration directory (contains datasets/*.yaml)
    #[arg(long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Override the catalog URL from the dataset config
    #[arg(long, env = "CATALOG_URL")]
    catalog_url: Option<String>,

    /// Override the configured grid bounding box, as "minx,miny,maxx,maxy"
    #[arg(long)]
    bbox: Option<String>,

    /// Quicklook image width in pixels (height follows the bbox aspect)
    #[arg(long, default_value = "720")]
    quicklook_width: usize,

    /// Only report what is available, without downloading
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let month = Month::parse(&args.month)?;

    let configs = load_dataset_configs(&args.config_dir)?;
    let mut dataset = find_dataset(&configs, &args.dataset).unwrap_or_else(|| {
        warn!(dataset = %args.dataset, "No config file for dataset, using defaults");
        default_config(&args.dataset)
    });
    if let Some(url) = &args.catalog_url {
        dataset.archive.catalog_url = url.clone();
    }
    if let Some(bbox) = &args.bbox {
        let b = BoundingBox::from_cli_string(bbox)?;
        dataset.grid.bbox = BBoxConfig {
            min_lon: b.min_x,
            min_lat: b.min_y,
            max_lon: b.max_x,
            max_lat: b.max_y,
        };
    }

    info!(
        dataset = %dataset.dataset.id,
        month = %month,
        catalog = %dataset.archive.catalog_url,
        "Starting fetch"
    );

    let catalog = CatalogClient::new(&dataset.archive.catalog_url)?;
    let doc = catalog.dataset(&dataset.dataset.id).await?;

    let available = doc.time_range();
    info!(start = %available.start, end = %available.end, "Dataset availability");

    let Some(range) = month.date_range().clamp_to(&available) else {
        bail!(
            "Month {} is outside the dataset's availability ({} to {})",
            month,
            available.start,
            available.end
        );
    };

    if args.dry_run {
        let listed = range.dates().filter(|d| doc.granule_for_date(*d).is_some()).count();
        info!(
            start = %range.start,
            end = %range.end,
            granules = listed,
            "Dry run: granules listed for the month"
        );
        return Ok(());
    }

    let granule_dir = args.output_dir.join("granules").join(&dataset.dataset.id);
    let downloader = Downloader::new(&granule_dir)?;

    let outcome = if args.parallel > 1 {
        downloader
            .download_range_parallel(&doc, &range, args.parallel)
            .await
    } else {
        downloader.download_range(&doc, &range).await
    };

    info!(
        downloaded = outcome.downloaded.len(),
        no_data = outcome.no_data.len(),
        failed = outcome.failed.len(),
        "Download finished"
    );
    for (date, error) in &outcome.failed {
        warn!(date = %date, error = %error, "Failed download (re-run to retry)");
    }

    if outcome.downloaded.is_empty() {
        bail!("No granules available for {}", month);
    }

    let outputs = run_month(
        &outcome.downloaded,
        &dataset,
        month,
        &args.output_dir,
        args.quicklook_width,
    )?;

    info!(
        grid = %outputs.grid_path.display(),
        mean_png = %outputs.mean_png.display(),
        scatter_png = %outputs.scatter_png.display(),
        "Month processed"
    );

    if !outcome.is_complete() {
        warn!(
            failed = outcome.failed.len(),
            "Some downloads failed; outputs cover the granules that succeeded"
        );
    }

    Ok(())
}
