/// Geometry utilities for perspective transformations and polygon tests
use crate::error::{Result, ScanError};
use crate::models::Point;
use crate::models::point::cross;

/// Pivots or determinants below this magnitude are treated as zero
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Projective transform stored row-major as a 3x3 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    /// Identity transform
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Build from raw row-major coefficients
    pub fn from_matrix(m: [f64; 9]) -> Self {
        Self { m }
    }

    /// Solve the transform mapping 4 source points onto 4 destination points
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Result<Self> {
        // Direct linear transform with h33 fixed to 1: each correspondence
        // contributes one row for x and one for y.
        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];

        for i in 0..4 {
            let (sx, sy) = (src[i].x as f64, src[i].y as f64);
            let (dx, dy) = (dst[i].x as f64, dst[i].y as f64);

            let row = i * 2;
            a[row] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy];
            b[row] = dx;

            a[row + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -dy * sx, -dy * sy];
            b[row + 1] = dy;
        }

        let h = solve_linear_system(&a, &b)?;
        Ok(Self {
            m: [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0],
        })
    }

    /// Inverse transform via the adjugate
    pub fn inverse(&self) -> Result<Self> {
        let [a, b, c, d, e, f, g, h, i] = self.m;
        let co00 = e * i - f * h;
        let co01 = f * g - d * i;
        let co02 = d * h - e * g;
        let det = a * co00 + b * co01 + c * co02;
        if det.abs() < SINGULAR_TOLERANCE {
            return Err(ScanError::SingularMatrix { pivot: det.abs() });
        }
        let inv_det = 1.0 / det;
        Ok(Self {
            m: [
                co00 * inv_det,
                (c * h - b * i) * inv_det,
                (b * f - c * e) * inv_det,
                co01 * inv_det,
                (a * i - c * g) * inv_det,
                (c * d - a * f) * inv_det,
                co02 * inv_det,
                (b * g - a * h) * inv_det,
                (a * e - b * d) * inv_det,
            ],
        })
    }

    /// Map `(x, y)`; `None` when the point lands on the line at infinity
    #[inline]
    pub fn apply_xy(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let m = &self.m;
        let w = m[6] * x + m[7] * y + m[8];
        if w.abs() < SINGULAR_TOLERANCE {
            return None;
        }
        Some((
            (m[0] * x + m[1] * y + m[2]) / w,
            (m[3] * x + m[4] * y + m[5]) / w,
        ))
    }

    /// Transform a point using this perspective matrix
    pub fn apply(&self, p: &Point) -> Option<Point> {
        self.apply_xy(p.x as f64, p.y as f64)
            .map(|(x, y)| Point::new(x as f32, y as f32))
    }
}

/// Solve 8x8 linear system using Gaussian elimination with partial pivoting
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(a: &[[f64; 8]; 8], b: &[f64; 8]) -> Result<[f64; 8]> {
    let mut a = *a;
    let mut b = *b;
    let n = 8;

    // Forward elimination
    for i in 0..n {
        let mut max_val = a[i][i].abs();
        let mut max_row = i;
        for k in (i + 1)..n {
            if a[k][i].abs() > max_val {
                max_val = a[k][i].abs();
                max_row = k;
            }
        }

        if max_val < SINGULAR_TOLERANCE {
            return Err(ScanError::SingularMatrix { pivot: max_val });
        }

        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    // Back substitution
    let mut x = [0.0f64; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }

    Ok(x)
}

/// Shoelace area of a simple polygon (either winding)
pub fn polygon_area(points: &[Point]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice += points[i].x as f64 * points[j].y as f64 - points[j].x as f64 * points[i].y as f64;
    }
    (twice.abs() * 0.5) as f32
}

/// True when the four corners form a strictly convex quadrilateral in
/// either winding order. Bow-ties and degenerate quads return false.
pub fn is_convex(corners: &[Point; 4]) -> bool {
    let mut sign = 0i8;
    for i in 0..4 {
        let c = cross(&corners[i], &corners[(i + 1) % 4], &corners[(i + 2) % 4]);
        if c.abs() <= f32::EPSILON {
            return false;
        }
        let s = if c > 0.0 { 1 } else { -1 };
        if sign == 0 {
            sign = s;
        } else if s != sign {
            return false;
        }
    }
    true
}

/// Calculate angle in radians between three points (p1-p2-p3)
pub fn angle(p1: &Point, p2: &Point, p3: &Point) -> f32 {
    let v1 = Point::new(p1.x - p2.x, p1.y - p2.y);
    let v2 = Point::new(p3.x - p2.x, p3.y - p2.y);

    let dot = v1.x * v2.x + v1.y * v2.y;
    let cross = v1.x * v2.y - v1.y * v2.x;

    cross.atan2(dot).abs()
}
