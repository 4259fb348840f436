//! Single-band GeoTIFF reading for GOSIF-style productivity rasters.
//!
//! Decodes band 1 into `f32` and pulls the georeferencing the exporter
//! needs from the GeoTIFF tags:
//!
//! - `ModelPixelScale` (33550) + `ModelTiepoint` (33922) give the affine
//!   placement for north-up rasters, which is all GOSIF ships.
//! - The GeoKey directory (34735) names the CRS; key 2048 for geographic,
//!   key 3072 for projected systems.
//! - `GDAL_NODATA` (42113) carries the producer's nodata value when set.
//!
//! Rasters without placement tags are assumed to span the full lat/lon
//! extent, matching how the GOSIF distribution files behave.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use thiserror::Error;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, warn};

use sif_common::{BoundingBox, Crs};

/// Result type for GeoTIFF reader operations.
pub type GeoTiffResult<T> = Result<T, GeoTiffError>;

/// Error types for GeoTIFF reading.
#[derive(Error, Debug)]
pub enum GeoTiffError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the tiff decoder
    #[error("TIFF decode error: {0}")]
    DecodeError(#[from] tiff::TiffError),

    /// Structurally valid TIFF that we cannot interpret
    #[error("Invalid GeoTIFF: {0}")]
    InvalidFormat(String),
}

/// GeoKey id for the geographic CRS code.
const GEO_KEY_GEOGRAPHIC_TYPE: u64 = 2048;
/// GeoKey id for the projected CRS code.
const GEO_KEY_PROJECTED_TYPE: u64 = 3072;

/// A decoded single-band raster with its georeferencing.
#[derive(Debug, Clone)]
pub struct GeoTiffRaster {
    /// Band 1 values, row-major, north row first.
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
    /// Geographic extent of the raster.
    pub bounds: BoundingBox,
    /// CRS declared by the GeoKey directory, None when absent.
    pub crs: Option<Crs>,
    /// Producer nodata value from GDAL_NODATA, None when absent.
    pub nodata: Option<f32>,
}

impl GeoTiffRaster {
    /// Open and decode band 1 of a GeoTIFF file.
    pub fn open(path: &Path) -> GeoTiffResult<Self> {
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        let (width, height) = decoder.dimensions()?;
        let data = decode_band(&mut decoder)?;

        if data.len() != (width as usize) * (height as usize) {
            return Err(GeoTiffError::InvalidFormat(format!(
                "pixel count {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }

        let bounds = read_bounds(&mut decoder, width, height)?;
        let crs = read_crs(&mut decoder);
        let nodata = read_nodata(&mut decoder);

        debug!(
            width,
            height,
            ?bounds,
            ?crs,
            ?nodata,
            "Decoded GeoTIFF"
        );

        Ok(Self {
            data,
            width,
            height,
            bounds,
            crs,
            nodata,
        })
    }
}

/// Decode the first image in the file to f32 regardless of sample type.
fn decode_band<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> GeoTiffResult<Vec<f32>> {
    let image = decoder.read_image()?;
    let data = match image {
        DecodingResult::U8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
    };
    Ok(data)
}

/// Derive the raster extent from pixel scale + tiepoint tags.
///
/// Falls back to the global extent when the tags are missing, which is how
/// the GOSIF 0.05-degree global files are distributed.
fn read_bounds<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    width: u32,
    height: u32,
) -> GeoTiffResult<BoundingBox> {
    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?;

    match (scale, tiepoint) {
        (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => {
            // Tiepoint maps raster (i, j) to model (x, y); GOSIF anchors
            // the top-left corner at (0, 0).
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            let left = x - i * scale[0];
            let top = y + j * scale[1];
            let right = left + width as f64 * scale[0];
            let bottom = top - height as f64 * scale[1];
            Ok(BoundingBox::new(left, bottom, right, top))
        }
        _ => {
            warn!("GeoTIFF has no placement tags, assuming global extent");
            Ok(BoundingBox::global())
        }
    }
}

/// Look up the CRS code from the GeoKey directory.
fn read_crs<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<Crs> {
    let directory = decoder
        .find_tag(Tag::GeoKeyDirectoryTag)
        .ok()
        .flatten()?
        .into_u64_vec()
        .ok()?;

    // Directory header is 4 shorts, then one 4-short entry per key:
    // key id, tag location, count, value offset. Inline values have
    // tag location 0.
    for entry in directory.chunks_exact(4).skip(1) {
        let (key_id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        if key_id == GEO_KEY_GEOGRAPHIC_TYPE || key_id == GEO_KEY_PROJECTED_TYPE {
            return Some(Crs::new(value as u32));
        }
    }
    None
}

/// Parse the GDAL_NODATA ASCII tag.
fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    let value = decoder.find_tag(Tag::GdalNodata).ok().flatten()?;
    let text = value.into_string().ok()?;
    text.trim().trim_end_matches('\0').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::encoder::{colortype, TiffEncoder};

    /// Encode a bare (non-geo) TIFF in memory for decode tests.
    fn encode_gray_f32(width: u32, height: u32, data: &[f32]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).unwrap();
            encoder
                .write_image::<colortype::Gray32Float>(width, height, data)
                .unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_decode_band_f32() {
        let data: Vec<f32> = (0..12).map(|i| i as f32 * 0.5).collect();
        let bytes = encode_gray_f32(4, 3, &data);

        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        let (w, h) = decoder.dimensions().unwrap();
        assert_eq!((w, h), (4, 3));

        let decoded = decode_band(&mut decoder).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_missing_geo_tags_fall_back_to_global() {
        let data = vec![0.0f32; 4];
        let bytes = encode_gray_f32(2, 2, &data);
        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        decoder.dimensions().unwrap();

        let bounds = read_bounds(&mut decoder, 2, 2).unwrap();
        assert_eq!(bounds, BoundingBox::global());
        assert!(read_crs(&mut decoder).is_none());
        assert!(read_nodata(&mut decoder).is_none());
    }

    #[test]
    fn test_open_plain_tiff_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.tif");
        let data: Vec<f32> = (0..24).map(|i| i as f32).collect();
        std::fs::write(&path, encode_gray_f32(6, 4, &data)).unwrap();

        let raster = GeoTiffRaster::open(&path).unwrap();
        assert_eq!(raster.width, 6);
        assert_eq!(raster.height, 4);
        assert_eq!(raster.data, data);
        assert_eq!(raster.bounds, BoundingBox::global());
    }
}
