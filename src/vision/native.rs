//! `imageproc`-backed vision operations.
//!
//! Buffers are converted into owned `GrayImage` values for the duration of
//! each call. `imageproc`'s morphology is binary-only, so the grayscale close
//! shares the separable min/max filter with the software backend.
//!
//! `detect_lines` does not expose accumulator values, so each returned line
//! is scored by the edge pixels lying within a pixel of it.

use super::{HoughLine, VisionBackend};
use crate::models::{GrayBuffer, Mask};
use crate::utils::filter::grayscale_close;
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use rayon::prelude::*;

/// Edge pixels closer than this to a line count as its votes
const SUPPORT_DISTANCE: f32 = 1.0;

/// Backend delegating to `imageproc`
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

fn to_image(width: usize, height: usize, data: &[u8]) -> Option<GrayImage> {
    GrayImage::from_raw(width as u32, height as u32, data.to_vec())
}

fn foreground_points(mask: &Mask) -> Vec<(f32, f32)> {
    let width = mask.width();
    mask.as_bytes()
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0)
        .map(|(i, _)| ((i % width) as f32, (i / width) as f32))
        .collect()
}

fn line_support(points: &[(f32, f32)], line: &PolarLine) -> u32 {
    let (sin, cos) = (line.angle_in_degrees as f32).to_radians().sin_cos();
    points
        .iter()
        .filter(|&&(x, y)| (x * cos + y * sin - line.r).abs() <= SUPPORT_DISTANCE)
        .count() as u32
}

fn from_image(image: GrayImage) -> GrayBuffer {
    let (w, h) = (image.width() as usize, image.height() as usize);
    GrayBuffer::from_raw(image.into_raw(), w, h).unwrap_or_else(|| GrayBuffer::new(w, h))
}

impl VisionBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "imageproc"
    }

    fn gaussian_blur(&self, gray: &GrayBuffer, sigma: f32) -> GrayBuffer {
        if sigma <= 0.0 {
            return gray.clone();
        }
        match to_image(gray.width(), gray.height(), gray.as_bytes()) {
            Some(image) if gray.width() > 0 && gray.height() > 0 => {
                from_image(gaussian_blur_f32(&image, sigma))
            }
            _ => gray.clone(),
        }
    }

    fn morph_close(&self, gray: &GrayBuffer, radius: u8) -> GrayBuffer {
        grayscale_close(gray, radius as usize)
    }

    fn canny(&self, gray: &GrayBuffer, low: f32, high: f32) -> Mask {
        let (w, h) = (gray.width(), gray.height());
        match to_image(w, h, gray.as_bytes()) {
            Some(image) if w > 0 && h > 0 => {
                let edges = canny(&image, low, high);
                Mask::from_nonzero(edges.as_raw(), w, h)
            }
            _ => Mask::new(w, h),
        }
    }

    fn hough_lines(
        &self,
        edges: &Mask,
        vote_threshold: u32,
        suppression_radius: u32,
    ) -> Vec<HoughLine> {
        let Some(image) = to_image(edges.width(), edges.height(), edges.as_bytes()) else {
            return Vec::new();
        };
        if edges.width() == 0 || edges.height() == 0 {
            return Vec::new();
        }
        let options = LineDetectionOptions {
            vote_threshold,
            suppression_radius,
        };
        let points = foreground_points(edges);
        detect_lines(&image, options)
            .par_iter()
            .map(|line| {
                HoughLine::new(line.r, line.angle_in_degrees as f32, line_support(&points, line))
            })
            .collect()
    }
}
