/// Contour extraction by flood filling foreground regions of a mask
use crate::models::{Mask, Point};

/// Pixels of one 8-connected region, in visit order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    /// Member pixels as points
    pub points: Vec<Point>,
}

impl Contour {
    /// Number of traced points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point was traced
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Every `stride`-th point, always keeping at least one
    pub fn simplified(&self, stride: usize) -> Vec<Point> {
        self.points.iter().step_by(stride.max(1)).copied().collect()
    }
}

/// Trace every 8-connected foreground region with an explicit stack.
///
/// Pixels are marked visited when pushed, so each is traced at most once.
/// A region larger than `max_points` is cut off there; its untraced pixels
/// seed later contours. Contours shorter than `min_points` are dropped.
pub fn trace_contours(mask: &Mask, min_points: usize, max_points: usize) -> Vec<Contour> {
    let width = mask.width();
    let height = mask.height();
    let mut visited = vec![false; width * height];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut contours = Vec::new();

    for sy in 0..height {
        for sx in 0..width {
            let seed = sy * width + sx;
            if visited[seed] || !mask.get(sx, sy) {
                continue;
            }

            let mut points = Vec::new();
            stack.clear();
            stack.push((sx, sy));
            visited[seed] = true;

            while let Some((x, y)) = stack.pop() {
                points.push(Point::new(x as f32, y as f32));
                if points.len() >= max_points {
                    break;
                }
                for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                        let idx = ny * width + nx;
                        if !visited[idx] && mask.get(nx, ny) {
                            visited[idx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            // Pixels still queued were marked but never traced
            for (x, y) in stack.drain(..) {
                visited[y * width + x] = false;
            }

            if points.len() >= min_points {
                contours.push(Contour { points });
            }
        }
    }

    contours
}
