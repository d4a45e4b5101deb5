/// Binary mask with one byte per pixel (0 = background, 255 = foreground)
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

/// Foreground value stored in a mask
pub const FOREGROUND: u8 = 255;

impl Mask {
    /// Create an all-background mask
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Build from a grayscale buffer where any non-zero byte is foreground
    pub fn from_nonzero(data: &[u8], width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data: data.iter().map(|&v| if v > 0 { FOREGROUND } else { 0 }).collect(),
        }
    }

    /// Mask width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mask height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether (x, y) is foreground; out-of-range is background
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y * self.width + x] != 0
    }

    /// Set (x, y); out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[y * self.width + x] = if value { FOREGROUND } else { 0 };
    }

    /// Number of foreground pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Inclusive extents `(min_x, min_y, max_x, max_y)` of the foreground
    pub fn foreground_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..self.height {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            let Some(first) = row.iter().position(|&v| v != 0) else {
                continue;
            };
            let last = row.iter().rposition(|&v| v != 0).unwrap_or(first);
            bounds = Some(match bounds {
                None => (first, y, last, y),
                Some((x0, y0, x1, _)) => (x0.min(first), y0, x1.max(last), y),
            });
        }
        bounds
    }

    /// Mean coordinate of the foreground pixels
    pub fn foreground_centroid(&self) -> Option<(f32, f32)> {
        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;
        let mut n = 0usize;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.data[y * self.width + x] != 0 {
                    sum_x += x as f64;
                    sum_y += y as f64;
                    n += 1;
                }
            }
        }
        if n == 0 {
            return None;
        }
        Some(((sum_x / n as f64) as f32, (sum_y / n as f64) as f32))
    }

    /// Pixel-wise OR with a mask of the same size
    pub fn union(&self, other: &Mask) -> Mask {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        Mask {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| if a != 0 || b != 0 { FOREGROUND } else { 0 })
                .collect(),
        }
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes, for row-parallel writers
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        let mut mask = Mask::new(8, 8);
        assert_eq!(mask.width(), 8);
        assert_eq!(mask.height(), 8);

        mask.set(3, 4, true);
        assert!(mask.get(3, 4));
        assert!(!mask.get(3, 3));
        assert_eq!(mask.as_bytes()[4 * 8 + 3], FOREGROUND);

        mask.set(3, 4, false);
        assert!(!mask.get(3, 4));
        assert_eq!(mask.count(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut mask = Mask::new(8, 8);
        mask.set(10, 10, true); // Should not panic
        assert!(!mask.get(10, 10));
    }

    #[test]
    fn test_foreground_bounds_and_centroid() {
        let mut mask = Mask::new(10, 10);
        assert!(mask.foreground_bounds().is_none());
        assert!(mask.foreground_centroid().is_none());

        mask.set(2, 3, true);
        mask.set(6, 7, true);
        mask.set(4, 5, true);
        assert_eq!(mask.foreground_bounds(), Some((2, 3, 6, 7)));
        assert_eq!(mask.foreground_centroid(), Some((4.0, 5.0)));
        assert_eq!(mask.count(), 3);
    }

    #[test]
    fn test_union() {
        let mut a = Mask::new(4, 4);
        let mut b = Mask::new(4, 4);
        a.set(0, 0, true);
        b.set(3, 3, true);
        let u = a.union(&b);
        assert!(u.get(0, 0) && u.get(3, 3));
        assert_eq!(u.count(), 2);
    }
}
