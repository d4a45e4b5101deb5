//! Post-processing of the rectified card.
//!
//! Sharpening and the contrast stretch work per RGB channel and never touch
//! alpha. The adaptive threshold produces a separate black-on-white raster
//! for text extraction.

use crate::config::{ContrastAdjust, EnhanceOptions, SHARPEN_SIGMA, ThresholdOptions};
use crate::models::RgbaRaster;
use crate::utils::filter::gaussian_blur_plane;
use crate::utils::grayscale::luminance;
use rayon::prelude::*;
use tracing::debug;

const INK: [u8; 4] = [0, 0, 0, 255];
const PAPER: [u8; 4] = [255, 255, 255, 255];

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Unsharp mask: `v + intensity * (v - blur(v))` on each color channel
pub fn sharpen(raster: &RgbaRaster, intensity: f32, sigma: f32) -> RgbaRaster {
    if raster.is_empty() || intensity == 0.0 {
        return raster.clone();
    }
    let (width, height) = (raster.width(), raster.height());
    let bytes = raster.as_bytes();

    let blurred: Vec<Vec<f32>> = (0..3)
        .map(|c| {
            let plane: Vec<f32> = bytes.chunks_exact(4).map(|px| px[c] as f32).collect();
            gaussian_blur_plane(&plane, width, height, sigma)
        })
        .collect();

    let mut out = raster.clone();
    out.as_bytes_mut()
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let i = y * width + x;
                for (c, plane) in blurred.iter().enumerate() {
                    let v = px[c] as f32;
                    px[c] = clamp_u8(v + intensity * (v - plane[i]));
                }
            }
        });
    out
}

/// One channel through `(v - center) * contrast + center + brightness`
pub fn contrast_value(v: u8, adjust: &ContrastAdjust) -> u8 {
    clamp_u8((v as f32 - adjust.center) * adjust.contrast + adjust.center + adjust.brightness)
}

/// Apply a contrast and brightness stretch to the RGB channels
pub fn adjust_contrast(raster: &RgbaRaster, adjust: &ContrastAdjust) -> RgbaRaster {
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        *slot = contrast_value(v as u8, adjust);
    }

    let mut out = raster.clone();
    let row_bytes = (raster.width() * 4).max(4);
    out.as_bytes_mut().par_chunks_mut(row_bytes).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            px[0] = lut[px[0] as usize];
            px[1] = lut[px[1] as usize];
            px[2] = lut[px[2] as usize];
        }
    });
    out
}

/// Binarize for text extraction.
///
/// A pixel is ink when its luminance is more than `offset` below the
/// Gaussian-weighted local mean and, with the global gate on, also darker
/// than the mean brightness of the whole card.
pub fn adaptive_threshold(raster: &RgbaRaster, options: &ThresholdOptions) -> RgbaRaster {
    if raster.is_empty() {
        return raster.clone();
    }
    let (width, height) = (raster.width(), raster.height());
    let luma: Vec<f32> = raster
        .as_bytes()
        .chunks_exact(4)
        .map(|px| luminance(px[0], px[1], px[2]) as f32)
        .collect();
    let local = gaussian_blur_plane(&luma, width, height, options.sigma);
    let global = luma.iter().sum::<f32>() / luma.len() as f32;
    debug!(global_mean = global, "adaptive threshold");

    let mut out = RgbaRaster::new(width, height);
    out.as_bytes_mut()
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let i = y * width + x;
                let v = luma[i];
                let ink = v < local[i] - options.offset && (!options.global_gate || v < global);
                px.copy_from_slice(if ink { &INK } else { &PAPER });
            }
        });
    out
}

/// Sharpen, then stretch contrast, each only when enabled
pub fn enhance(raster: &RgbaRaster, options: &EnhanceOptions) -> RgbaRaster {
    let sharpened = match options.sharpen {
        Some(intensity) => sharpen(raster, intensity, SHARPEN_SIGMA),
        None => raster.clone(),
    };
    match &options.contrast {
        Some(adjust) => adjust_contrast(&sharpened, adjust),
        None => sharpened,
    }
}
