/// Convert RGBA rasters to single-channel buffers.
///
/// Luminance uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8,
/// which approximates 0.299*R + 0.587*G + 0.114*B. The plain channel
/// average feeds the Sobel edge mask.
use crate::models::{GrayBuffer, RgbaRaster};
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Weighted luminance, ignoring alpha
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

/// Unweighted mean of the color channels
#[inline]
pub fn channel_average(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 + g as u32 + b as u32) / 3) as u8
}

fn convert_rows(raster: &RgbaRaster, f: fn(u8, u8, u8) -> u8) -> GrayBuffer {
    let width = raster.width();
    let height = raster.height();
    let mut gray = GrayBuffer::new(width, height);
    if width == 0 || height == 0 {
        return gray;
    }
    let rgba = raster.as_bytes();

    // Process rows in parallel
    gray.as_bytes_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let row_start = y * width * 4;
            for (x, out) in row.iter_mut().enumerate() {
                let idx = row_start + x * 4;
                *out = f(rgba[idx], rgba[idx + 1], rgba[idx + 2]);
            }
        });

    gray
}

/// Convert RGBA to luminance grayscale using parallel row processing
pub fn rgba_to_grayscale(raster: &RgbaRaster) -> GrayBuffer {
    convert_rows(raster, luminance)
}

/// Convert RGBA to the plain average of R, G and B
pub fn rgba_to_gray_average(raster: &RgbaRaster) -> GrayBuffer {
    convert_rows(raster, channel_average)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_grayscale() {
        // Pure white
        let white = RgbaRaster::filled(1, 1, [255, 255, 255, 255]);
        assert!(rgba_to_grayscale(&white).get(0, 0) >= 254);

        // Pure black
        let black = RgbaRaster::filled(1, 1, [0, 0, 0, 255]);
        assert_eq!(rgba_to_grayscale(&black).get(0, 0), 0);

        // Pure red
        let red = RgbaRaster::filled(1, 1, [255, 0, 0, 255]);
        let v = rgba_to_grayscale(&red).get(0, 0);
        assert!(v > 0 && v < 255);

        // Pure green
        let green = RgbaRaster::filled(1, 1, [0, 255, 0, 0]);
        assert!(rgba_to_grayscale(&green).get(0, 0) > 100);
    }

    #[test]
    fn test_average_ignores_alpha() {
        let mut raster = RgbaRaster::new(2, 2);
        raster.put_pixel(1, 1, [30, 60, 90, 0]);
        let gray = rgba_to_gray_average(&raster);
        assert_eq!(gray.width(), 2);
        assert_eq!(gray.get(1, 1), 60);
        assert_eq!(gray.get(0, 0), 0);
    }

    #[test]
    fn test_empty_raster() {
        let gray = rgba_to_grayscale(&RgbaRaster::new(0, 5));
        assert!(gray.as_bytes().is_empty());
    }
}
