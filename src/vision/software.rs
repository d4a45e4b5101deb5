//! Pure Rust vision backend.

use super::{HoughLine, VisionBackend};
use crate::models::mask::FOREGROUND;
use crate::models::{GrayBuffer, Mask};
use crate::utils::filter::{gaussian_blur, grayscale_close};
use rayon::prelude::*;

/// Smoothing applied inside Canny before gradients, as `imageproc` does
const CANNY_SIGMA: f32 = 1.4;

/// Backend with no dependencies beyond this crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBackend;

impl VisionBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn gaussian_blur(&self, gray: &GrayBuffer, sigma: f32) -> GrayBuffer {
        gaussian_blur(gray, sigma)
    }

    fn morph_close(&self, gray: &GrayBuffer, radius: u8) -> GrayBuffer {
        grayscale_close(gray, radius as usize)
    }

    fn canny(&self, gray: &GrayBuffer, low: f32, high: f32) -> Mask {
        canny(gray, low, high)
    }

    fn hough_lines(
        &self,
        edges: &Mask,
        vote_threshold: u32,
        suppression_radius: u32,
    ) -> Vec<HoughLine> {
        hough_lines(edges, vote_threshold, suppression_radius)
    }
}

/// Canny edge detection: blur, Sobel gradients, non-maximum suppression
/// along the quantized gradient direction, then hysteresis.
pub fn canny(gray: &GrayBuffer, low: f32, high: f32) -> Mask {
    let width = gray.width();
    let height = gray.height();
    let mut edges = Mask::new(width, height);
    if width < 3 || height < 3 {
        return edges;
    }

    let blurred = gaussian_blur(gray, CANNY_SIGMA);
    let src = blurred.as_bytes();
    let at = |x: usize, y: usize| src[y * width + x] as f32;

    // Gradient magnitude and quantized direction (0: E-W, 1: NE-SW, 2: N-S, 3: NW-SE)
    let mut magnitude = vec![0.0f32; width * height];
    let mut direction = vec![0u8; width * height];
    magnitude
        .par_chunks_mut(width)
        .zip(direction.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (mag_row, dir_row))| {
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
                mag_row[x] = (gx * gx + gy * gy).sqrt();

                let mut angle = gy.atan2(gx).to_degrees();
                if angle < 0.0 {
                    angle += 180.0;
                }
                dir_row[x] = if !(22.5..157.5).contains(&angle) {
                    0
                } else if angle < 67.5 {
                    1
                } else if angle < 112.5 {
                    2
                } else {
                    3
                };
            }
        });

    // Non-maximum suppression
    let mut thin = vec![0.0f32; width * height];
    thin.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        if y == 0 || y == height - 1 {
            return;
        }
        for x in 1..width - 1 {
            let idx = y * width + x;
            let m = magnitude[idx];
            if m < low {
                continue;
            }
            let (a, b) = match direction[idx] {
                0 => (idx - 1, idx + 1),
                // Gradient pointing down-right in y-down coordinates
                1 => (idx - width - 1, idx + width + 1),
                2 => (idx - width, idx + width),
                _ => (idx - width + 1, idx + width - 1),
            };
            if m >= magnitude[a] && m >= magnitude[b] {
                row[x] = m;
            }
        }
    });

    // Hysteresis: grow strong edges through connected weak ones
    let mut stack: Vec<usize> = Vec::new();
    for (idx, &m) in thin.iter().enumerate() {
        if m >= high && edges.as_bytes()[idx] == 0 {
            edges.as_bytes_mut()[idx] = FOREGROUND;
            stack.push(idx);
            while let Some(cur) = stack.pop() {
                let cx = cur % width;
                let cy = cur / width;
                for ny in cy.saturating_sub(1)..=(cy + 1).min(height - 1) {
                    for nx in cx.saturating_sub(1)..=(cx + 1).min(width - 1) {
                        let n = ny * width + nx;
                        if thin[n] >= low && edges.as_bytes()[n] == 0 {
                            edges.as_bytes_mut()[n] = FOREGROUND;
                            stack.push(n);
                        }
                    }
                }
            }
        }
    }

    edges
}

/// Standard Hough transform over 180 one-degree angle bins and integer
/// rho bins in `[-rmax, rmax]`. Results are sorted by votes, strongest first.
pub fn hough_lines(edges: &Mask, vote_threshold: u32, suppression_radius: u32) -> Vec<HoughLine> {
    let width = edges.width();
    let height = edges.height();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let points: Vec<(f32, f32)> = edges
        .as_bytes()
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v != 0)
        .map(|(i, _)| ((i % width) as f32, (i / width) as f32))
        .collect();
    if points.is_empty() {
        return Vec::new();
    }

    let rmax = ((width * width + height * height) as f32).sqrt().ceil() as usize;
    let bins = 2 * rmax + 1;
    const ANGLES: usize = 180;

    // One accumulator row per angle, filled independently
    let mut acc = vec![0u32; ANGLES * bins];
    acc.par_chunks_mut(bins).enumerate().for_each(|(deg, row)| {
        let (sin, cos) = (deg as f32).to_radians().sin_cos();
        for &(x, y) in &points {
            let r = (x * cos + y * sin).round() as isize + rmax as isize;
            if r >= 0 && (r as usize) < bins {
                row[r as usize] += 1;
            }
        }
    });

    let radius = suppression_radius as isize;
    let mut lines = Vec::new();
    for deg in 0..ANGLES {
        for r in 0..bins {
            let votes = acc[deg * bins + r];
            if votes < vote_threshold || votes == 0 {
                continue;
            }
            if is_local_max(&acc, bins, deg, r, radius) {
                lines.push(HoughLine::new(r as f32 - rmax as f32, deg as f32, votes));
            }
        }
    }

    lines.sort_by(|a, b| b.votes.cmp(&a.votes));
    lines
}

/// Strict maximum in the window; plateaus keep only their first cell
fn is_local_max(acc: &[u32], bins: usize, deg: usize, r: usize, radius: isize) -> bool {
    let value = acc[deg * bins + r];
    let here = deg * bins + r;
    for dd in -radius..=radius {
        let nd = deg as isize + dd;
        if nd < 0 || nd >= 180 {
            continue;
        }
        for dr in -radius..=radius {
            let nr = r as isize + dr;
            if nr < 0 || nr >= bins as isize {
                continue;
            }
            let idx = nd as usize * bins + nr as usize;
            if idx == here {
                continue;
            }
            let other = acc[idx];
            if other > value || (other == value && idx < here) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_image() -> GrayBuffer {
        let mut gray = GrayBuffer::new(60, 60);
        for y in 15..45 {
            for x in 15..45 {
                gray.set(x, y, 220);
            }
        }
        gray
    }

    #[test]
    fn test_canny_finds_square_outline() {
        let edges = canny(&square_image(), 50.0, 150.0);
        assert!(edges.count() > 0);
        // Flat regions have no edges
        assert!(!edges.get(30, 30));
        assert!(!edges.get(2, 2));
        // Something fires near every side
        assert!((12..18).any(|x| edges.get(x, 30)));
        assert!((42..48).any(|x| edges.get(x, 30)));
        assert!((12..18).any(|y| edges.get(30, y)));
        assert!((42..48).any(|y| edges.get(30, y)));
    }

    #[test]
    fn test_canny_flat_image_is_empty() {
        let gray = GrayBuffer::from_raw(vec![128; 400], 20, 20).unwrap();
        assert_eq!(canny(&gray, 50.0, 150.0).count(), 0);
    }

    #[test]
    fn test_hough_horizontal_and_vertical_lines() {
        let mut edges = Mask::new(100, 80);
        for x in 0..100 {
            edges.set(x, 20, true);
        }
        for y in 0..80 {
            edges.set(70, y, true);
        }
        let lines = hough_lines(&edges, 50, 8);
        assert!(lines.len() >= 2);

        // Horizontal line y = 20 has normal angle 90
        assert!(lines
            .iter()
            .any(|l| l.theta_deg == 90.0 && (l.rho - 20.0).abs() <= 1.0));
        // Vertical line x = 70 has normal angle 0
        assert!(lines
            .iter()
            .any(|l| l.theta_deg == 0.0 && (l.rho - 70.0).abs() <= 1.0));
        // Sorted strongest first
        assert!(lines.windows(2).all(|w| w[0].votes >= w[1].votes));
    }

    #[test]
    fn test_hough_threshold_filters() {
        let mut edges = Mask::new(50, 50);
        for x in 0..30 {
            edges.set(x, 10, true);
        }
        assert!(hough_lines(&edges, 31, 4).is_empty());
        assert!(!hough_lines(&edges, 30, 4).is_empty());
    }

    #[test]
    fn test_backend_close_uses_radius() {
        let backend = SoftwareBackend;
        let mut gray = GrayBuffer::new(10, 3);
        for y in 0..3 {
            gray.set(3, y, 200);
            gray.set(5, y, 200);
        }
        let closed = backend.morph_close(&gray, 1);
        assert_eq!(closed.get(4, 1), 200);
    }
}
