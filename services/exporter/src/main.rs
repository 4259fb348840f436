//! GeoTIFF exporter.
//!
//! Converts a GOSIF-style productivity raster into a web-displayable
//! colormapped PNG with transparent missing-data pixels, plus a JSON
//! sidecar carrying the bounding box, pixel dimensions, and CRS so the
//! viewer can anchor the image on a basemap.

mod convert;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use renderer::ColorScale;

use convert::{convert, ConvertOptions};

#[derive(Parser, Debug)]
#[command(name = "exporter")]
#[command(about = "Convert a GeoTIFF raster to a colormapped PNG + JSON sidecar")]
struct Args {
    /// Input GeoTIFF file
    input: PathBuf,

    /// Output PNG path (default: input with .png extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Values strictly greater than this are treated as missing
    #[arg(long, default_value = "32765")]
    sentinel: f32,

    /// Override the lower color-scale bound (default: min of valid data)
    #[arg(long)]
    vmin: Option<f32>,

    /// Override the upper color-scale bound (default: max of valid data)
    #[arg(long)]
    vmax: Option<f32>,

    /// Color scale name
    #[arg(long, default_value = "viridis")]
    color_scale: ColorScale,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
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
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("png"));

    let options = ConvertOptions {
        sentinel: args.sentinel,
        vmin: args.vmin,
        vmax: args.vmax,
        scale: args.color_scale,
    };

    let report = convert(&args.input, &output, &options)?;

    info!(
        png = %report.png_path.display(),
        sidecar = %report.sidecar_path.display(),
        vmin = report.vmin,
        vmax = report.vmax,
        "Export complete"
    );

    Ok(())
}
