/// Edge masks: a fast Sobel magnitude threshold for the contour detector and
/// the blur, close, Canny chain for the Hough detector.
use crate::config::CannyParams;
use crate::models::mask::FOREGROUND;
use crate::models::{GrayBuffer, Mask, RgbaRaster};
use crate::utils::grayscale::{rgba_to_gray_average, rgba_to_grayscale};
use crate::vision::VisionBackend;
use rayon::prelude::*;
use tracing::debug;

/// Sobel edges over the channel-average grayscale.
///
/// Only interior pixels are evaluated; the one-pixel border is always
/// background.
pub fn sobel_edges(raster: &RgbaRaster, threshold: f32) -> Mask {
    sobel_mask(&rgba_to_gray_average(raster), threshold)
}

/// Sobel magnitude threshold on a grayscale buffer
pub fn sobel_mask(gray: &GrayBuffer, threshold: f32) -> Mask {
    let width = gray.width();
    let height = gray.height();
    let mut mask = Mask::new(width, height);
    if width < 3 || height < 3 {
        return mask;
    }
    let src = gray.as_bytes();
    let at = |x: usize, y: usize| src[y * width + x] as f32;
    let threshold_sq = threshold * threshold;

    mask.as_bytes_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            if y == 0 || y == height - 1 {
                return;
            }
            for x in 1..width - 1 {
                let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                    - at(x - 1, y - 1)
                    - 2.0 * at(x - 1, y)
                    - at(x - 1, y + 1);
                let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                    - at(x - 1, y - 1)
                    - 2.0 * at(x, y - 1)
                    - at(x + 1, y - 1);
                if gx * gx + gy * gy > threshold_sq {
                    row[x] = FOREGROUND;
                }
            }
        });

    mask
}

/// Luminance, Gaussian blur, grayscale close, then Canny
pub fn canny_edges(raster: &RgbaRaster, params: &CannyParams, backend: &dyn VisionBackend) -> Mask {
    let gray = rgba_to_grayscale(raster);
    let blurred = backend.gaussian_blur(&gray, params.blur_sigma);
    let closed = backend.morph_close(&blurred, params.close_radius);
    let edges = backend.canny(&closed, params.low, params.high);
    debug!(
        backend = backend.name(),
        edge_pixels = edges.count(),
        "canny edge mask"
    );
    edges
}
