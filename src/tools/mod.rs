use crate::error::{Result, ScanError};
use crate::models::{Mask, RgbaRaster};
use crate::utils::grayscale::rgba_to_grayscale;
use image::GenericImageView;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

fn max_dim_from_env() -> Option<u32> {
    match env::var("CARD_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Decode an image file into an RGBA raster.
///
/// When `CARD_MAX_DIM` is set, images whose longer side exceeds it are
/// shrunk (keeping the aspect ratio) before conversion.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaRaster> {
    let path = path.as_ref();
    let img = image::open(path)
        .map_err(|e| ScanError::ImageDecode(format!("{}: {}", path.display(), e)))?;
    let rgba = match max_dim_from_env() {
        Some(max_dim) if img.dimensions().0.max(img.dimensions().1) > max_dim => img
            .resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            .to_rgba8(),
        _ => img.to_rgba8(),
    };
    Ok(RgbaRaster::from_image(rgba))
}

/// Write a raster as PNG.
pub fn save_png<P: AsRef<Path>>(raster: &RgbaRaster, path: P) -> image::ImageResult<()> {
    raster.clone().into_image().save_with_format(path, image::ImageFormat::Png)
}

/// Summary statistics for luminance values.
#[derive(Debug, Clone, Copy)]
pub struct GrayStats {
    /// Minimum luminance.
    pub min: u8,
    /// Maximum luminance.
    pub max: u8,
    /// Average luminance.
    pub avg: u8,
}

/// Summary statistics for a mask.
#[derive(Debug, Clone, Copy)]
pub struct MaskStats {
    /// Count of foreground pixels.
    pub foreground: usize,
    /// Total pixels in the mask.
    pub total: usize,
    /// Ratio of foreground pixels to total pixels.
    pub ratio: f64,
}

/// Compute min/max/avg luminance of a raster.
pub fn gray_stats(raster: &RgbaRaster) -> GrayStats {
    let gray = rgba_to_grayscale(raster);
    let bytes = gray.as_bytes();
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &v in bytes {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    let avg = if bytes.is_empty() {
        0
    } else {
        (sum / bytes.len() as u64) as u8
    };
    GrayStats { min, max, avg }
}

/// Compute foreground stats for a mask.
pub fn mask_stats(mask: &Mask) -> MaskStats {
    let foreground = mask.count();
    let total = mask.width() * mask.height();
    let ratio = if total == 0 {
        0.0
    } else {
        foreground as f64 / total as f64
    };
    MaskStats {
        foreground,
        total,
        ratio,
    }
}

/// Expand `input` to image files: a file is returned as-is, a directory is
/// walked recursively. Results are sorted.
pub fn collect_images<P: AsRef<Path>>(input: P) -> Vec<PathBuf> {
    let input = input.as_ref();
    if input.is_file() {
        return vec![input.to_path_buf()];
    }

    let mut stack = vec![input.to_path_buf()];
    let mut images = Vec::new();
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                    images.push(path);
                }
            }
        }
    }

    images.sort();
    images
}
