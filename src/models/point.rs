/// 2D point with floating point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Calculate squared distance (faster, no sqrt)
    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Multiply both coordinates by `factor`
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Clamp into `[0, max_x] x [0, max_y]`
    pub fn clamp(&self, max_x: f32, max_y: f32) -> Self {
        Self {
            x: self.x.clamp(0.0, max_x),
            y: self.y.clamp(0.0, max_y),
        }
    }
}

/// Cross product of `a - o` and `b - o`.
///
/// Positive when `o -> a -> b` turns clockwise on screen (y grows downward).
pub fn cross(o: &Point, a: &Point, b: &Point) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingRect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl BoundingRect {
    /// Create a rectangle from its top-left corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing every point, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Rectangle covering inclusive pixel extents `(min_x, min_y, max_x, max_y)`
    pub fn from_pixel_bounds(bounds: (usize, usize, usize, usize)) -> Self {
        let (min_x, min_y, max_x, max_y) = bounds;
        Self::new(
            min_x as f32,
            min_y as f32,
            (max_x - min_x + 1) as f32,
            (max_y - min_y + 1) as f32,
        )
    }

    /// Area in square pixels
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Width over height, zero for a degenerate rectangle
    pub fn aspect_ratio(&self) -> f32 {
        if self.height <= 0.0 {
            0.0
        } else {
            self.width / self.height
        }
    }

    /// Longer side over shorter side, so portrait and landscape compare equally
    pub fn normalized_aspect(&self) -> f32 {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        if short <= 0.0 { 0.0 } else { long / short }
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Grow by `pad` on every side, then clamp to `[0, max_w] x [0, max_h]`
    pub fn padded(&self, pad: f32, max_w: f32, max_h: f32) -> Self {
        Self::new(self.x - pad, self.y - pad, self.width + 2.0 * pad, self.height + 2.0 * pad)
            .clamped(max_w, max_h)
    }

    /// Intersection with `[0, max_w] x [0, max_h]`
    pub fn clamped(&self, max_w: f32, max_h: f32) -> Self {
        let x0 = self.x.clamp(0.0, max_w);
        let y0 = self.y.clamp(0.0, max_h);
        let x1 = (self.x + self.width).clamp(0.0, max_w);
        let y1 = (self.y + self.height).clamp(0.0, max_h);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Multiply position and size by `factor`
    pub fn scale(&self, factor: f32) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Corners in `[TL, TR, BR, BL]` order
    pub fn corners(&self) -> [Point; 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(right, bottom),
            Point::new(self.x, bottom),
        ]
    }
}
