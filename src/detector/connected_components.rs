/// Connected components of a mask, measured for card-likeness
use crate::models::{BoundingRect, Mask};
use std::collections::VecDeque;

/// One 4-connected foreground region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectedComponent {
    /// Inclusive pixel extents as a rectangle
    pub bounding_rect: BoundingRect,
    /// Number of member pixels
    pub pixel_count: usize,
    /// `pixel_count / bounding area`
    pub density: f32,
    /// Bounding width over height
    pub aspect_ratio: f32,
}

/// Label 4-connected regions with a breadth-first fill.
///
/// Components with fewer than `min_pixels` pixels are never reported.
pub fn label_components(mask: &Mask, min_pixels: usize) -> Vec<ConnectedComponent> {
    let width = mask.width();
    let height = mask.height();
    let mut visited = vec![false; width * height];
    let mut queue = VecDeque::new();
    let mut components = Vec::new();

    for sy in 0..height {
        for sx in 0..width {
            let seed = sy * width + sx;
            if visited[seed] || !mask.get(sx, sy) {
                continue;
            }

            visited[seed] = true;
            queue.push_back((sx, sy));
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);
            let mut count = 0usize;

            while let Some((x, y)) = queue.pop_front() {
                count += 1;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);

                let mut visit = |nx: usize, ny: usize| {
                    let idx = ny * width + nx;
                    if !visited[idx] && mask.get(nx, ny) {
                        visited[idx] = true;
                        queue.push_back((nx, ny));
                    }
                };
                if x > 0 {
                    visit(x - 1, y);
                }
                if x + 1 < width {
                    visit(x + 1, y);
                }
                if y > 0 {
                    visit(x, y - 1);
                }
                if y + 1 < height {
                    visit(x, y + 1);
                }
            }

            if count < min_pixels {
                continue;
            }
            let bounding_rect = BoundingRect::from_pixel_bounds((min_x, min_y, max_x, max_y));
            components.push(ConnectedComponent {
                bounding_rect,
                pixel_count: count,
                density: count as f32 / bounding_rect.area(),
                aspect_ratio: bounding_rect.aspect_ratio(),
            });
        }
    }

    components
}
