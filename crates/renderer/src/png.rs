//! PNG encoding for RGBA image data.
//!
//! Two encoding modes:
//! - **Indexed (color type 3)** when the image has ≤256 unique colors,
//!   with a tRNS chunk carrying per-entry alpha. Colormapped SIF rasters
//!   almost always fit.
//! - **RGBA (color type 6)** fallback for anything else.
//!
//! `encode_png` picks automatically.

use std::collections::HashMap;
use std::io::Write;

use rayon::prelude::*;

use crate::{RenderError, RenderResult};

/// Maximum palette entries for an indexed PNG.
const MAX_PALETTE_SIZE: usize = 256;

/// Below this many pixels the parallel palette pass costs more than it saves.
const PARALLEL_THRESHOLD: usize = 4096;

/// Encode RGBA pixels as a PNG, using the indexed format when possible.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    if pixels.len() != width * height * 4 {
        return Err(RenderError::DimensionMismatch(format!(
            "{} bytes for {}x{} RGBA image",
            pixels.len(),
            width,
            height
        )));
    }

    let palette = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        build_palette_parallel(pixels)
    } else {
        build_palette(pixels)
    };

    match palette {
        Some((colors, indices)) => encode_indexed(width, height, &colors, &indices),
        None => encode_rgba(pixels, width, height),
    }
}

#[inline(always)]
fn pack_rgba(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

#[inline(always)]
fn unpack_rgba(packed: u32) -> [u8; 4] {
    packed.to_le_bytes()
}

/// Single-pass palette build. Returns None once a 257th color appears.
fn build_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut colors: Vec<[u8; 4]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let packed = pack_rgba(px);
        let idx = match lookup.get(&packed) {
            Some(&i) => i,
            None => {
                if colors.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let i = colors.len() as u8;
                colors.push([px[0], px[1], px[2], px[3]]);
                lookup.insert(packed, i);
                i
            }
        };
        indices.push(idx);
    }

    Some((colors, indices))
}

/// Parallel palette build for larger images.
///
/// First pass collects per-chunk unique colors with rayon and merges them;
/// second pass maps pixels to indices in parallel.
fn build_palette_parallel(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let num_pixels = pixels.len() / 4;
    let pixels_per_chunk = (num_pixels / rayon::current_num_threads()).max(256);
    let chunk_bytes = pixels_per_chunk * 4;

    let per_chunk: Vec<Vec<u32>> = pixels
        .par_chunks(chunk_bytes)
        .map(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                local.insert(pack_rgba(px), ());
                // No point collecting past the palette limit.
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys().collect()
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut colors: Vec<[u8; 4]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in per_chunk.into_iter().flatten() {
        if !lookup.contains_key(&packed) {
            if colors.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            lookup.insert(packed, colors.len() as u8);
            colors.push(unpack_rgba(packed));
        }
    }

    let mut indices = vec![0u8; num_pixels];
    indices
        .par_chunks_mut(pixels_per_chunk)
        .zip(pixels.par_chunks(chunk_bytes))
        .for_each(|(idx_chunk, px_chunk)| {
            for (idx, px) in idx_chunk.iter_mut().zip(px_chunk.chunks_exact(4)) {
                *idx = *lookup.get(&pack_rgba(px)).unwrap_or(&0);
            }
        });

    Some((colors, indices))
}

/// Encode an indexed PNG (color type 3).
fn encode_indexed(
    width: usize,
    height: usize,
    colors: &[[u8; 4]],
    indices: &[u8],
) -> RenderResult<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let mut plte = Vec::with_capacity(colors.len() * 3);
    for c in colors {
        plte.extend_from_slice(&c[..3]);
    }
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS only when some entry is not fully opaque.
    if colors.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = colors.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height, 1)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Encode a truecolor-with-alpha PNG (color type 6).
fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat = deflate_scanlines(pixels, width, height, 4)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

/// Prefix each scanline with filter byte 0 and zlib-compress.
fn deflate_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> RenderResult<Vec<u8>> {
    let stride = width * bytes_per_pixel;
    let mut raw = Vec::with_capacity(height * (1 + stride));
    for y in 0..height {
        raw.push(0); // filter type: none
        raw.extend_from_slice(&data[y * stride..(y + 1) * stride]);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| RenderError::EncodeError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| RenderError::EncodeError(e.to_string()))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
