//! Separable filters on single-channel planes.
//!
//! Gaussian blur feeds the unsharp mask, the adaptive threshold and the
//! software vision backend. The running max/min filters implement the
//! grayscale morphological close for every backend.

use crate::models::GrayBuffer;
use rayon::prelude::*;

/// Normalized 1D Gaussian kernel with radius `ceil(3 * sigma)`
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil() as i32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Blur a float plane; borders are handled by clamping coordinates
pub fn gaussian_blur_plane(plane: &[f32], width: usize, height: usize, sigma: f32) -> Vec<f32> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let kernel = gaussian_kernel(sigma);
    if kernel.len() == 1 {
        return plane.to_vec();
    }
    let radius = (kernel.len() / 2) as isize;
    let max_x = width as isize - 1;
    let max_y = height as isize - 1;

    // Horizontal pass
    let mut horizontal = vec![0.0f32; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let src = &plane[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - radius).clamp(0, max_x) as usize;
                    acc += src[sx] * weight;
                }
                *out = acc;
            }
        });

    // Vertical pass
    let mut out = vec![0.0f32; width * height];
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, value) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - radius).clamp(0, max_y) as usize;
                acc += horizontal[sy * width + x] * weight;
            }
            *value = acc;
        }
    });

    out
}

/// Gaussian blur of an 8-bit buffer
pub fn gaussian_blur(gray: &GrayBuffer, sigma: f32) -> GrayBuffer {
    let plane: Vec<f32> = gray.as_bytes().iter().map(|&v| v as f32).collect();
    let blurred = gaussian_blur_plane(&plane, gray.width(), gray.height(), sigma);
    let data = blurred
        .into_iter()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    GrayBuffer::from_raw(data, gray.width(), gray.height())
        .unwrap_or_else(|| GrayBuffer::new(gray.width(), gray.height()))
}

#[derive(Clone, Copy)]
enum Extremum {
    Max,
    Min,
}

impl Extremum {
    #[inline]
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Max => a.max(b),
            Extremum::Min => a.min(b),
        }
    }
}

/// Square-window max or min filter, separable into row and column passes
fn rank_filter(gray: &GrayBuffer, radius: usize, op: Extremum) -> GrayBuffer {
    let width = gray.width();
    let height = gray.height();
    if width == 0 || height == 0 || radius == 0 {
        return gray.clone();
    }
    let src = gray.as_bytes();

    let mut horizontal = vec![0u8; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let line = &src[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(width - 1);
                *out = line[lo..=hi].iter().copied().reduce(|a, b| op.pick(a, b)).unwrap_or(0);
            }
        });

    let mut out = GrayBuffer::new(width, height);
    out.as_bytes_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            for (x, value) in row.iter_mut().enumerate() {
                let mut acc = horizontal[lo * width + x];
                for sy in lo + 1..=hi {
                    acc = op.pick(acc, horizontal[sy * width + x]);
                }
                *value = acc;
            }
        });
    out
}

/// Grayscale dilation with a `(2r+1)` square window
pub fn dilate(gray: &GrayBuffer, radius: usize) -> GrayBuffer {
    rank_filter(gray, radius, Extremum::Max)
}

/// Grayscale erosion with a `(2r+1)` square window
pub fn erode(gray: &GrayBuffer, radius: usize) -> GrayBuffer {
    rank_filter(gray, radius, Extremum::Min)
}

/// Morphological close: dilate then erode. Fills gaps narrower than the window.
pub fn grayscale_close(gray: &GrayBuffer, radius: usize) -> GrayBuffer {
    erode(&dilate(gray, radius), radius)
}
