//! Quadrilateral search over Hough lines.
//!
//! Lines are pulled from the Canny edge map with a falling vote threshold,
//! split into near-horizontal and near-vertical families, and near
//! duplicates are merged. Pairwise intersections form a graph in which two
//! corners are adjacent when they lie on a common line; every simple
//! 4-cycle whose edges run along four different lines is a candidate card.

use crate::config::{DetectorConfig, HoughParams};
use crate::detector::corners::robust_sort_corners;
use crate::detector::quad::aspect_score;
use crate::error::{Result, ScanError};
use crate::models::detection::quad_aspect_ratio;
use crate::models::{Mask, Point, QuadCandidate};
use crate::utils::geometry::{angle, is_convex, polygon_area};
use crate::vision::{HoughLine, VisionBackend};
use tracing::debug;

/// Normal angles within this many degrees of 90 are horizontal lines,
/// within this many degrees of 0 or 180 vertical ones
const CLASS_TOLERANCE_DEG: f32 = 30.0;

/// Line family by orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Normal near 90 degrees
    Horizontal,
    /// Normal near 0 or 180 degrees
    Vertical,
}

/// A merged line cluster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedLine {
    /// Weighted mean distance from the origin
    pub rho: f32,
    /// Weighted mean normal angle in degrees
    pub theta_deg: f32,
    /// Sum of member weights
    pub weight: f32,
    /// Orientation family
    pub class: LineClass,
}

/// Intersection of two merged lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Location in image coordinates
    pub point: Point,
    /// Indices of the two lines that cross here
    pub lines: (usize, usize),
}

impl Vertex {
    /// The single line shared with `other`, if any
    fn shared_line(&self, other: &Vertex) -> Option<usize> {
        let (a, b) = self.lines;
        let (c, d) = other.lines;
        if a == c || a == d {
            Some(a)
        } else if b == c || b == d {
            Some(b)
        } else {
            None
        }
    }
}

/// Run the threshold cascade until the line count is usable
pub fn select_lines(
    backend: &dyn VisionBackend,
    edges: &Mask,
    params: &HoughParams,
) -> Result<Vec<HoughLine>> {
    for &threshold in &params.thresholds {
        let mut lines = backend.hough_lines(edges, threshold, params.suppression_radius);
        if lines.len() > params.max_lines {
            // Strongest first; lines without vote counts sort last
            lines.sort_by(|a, b| b.votes.cmp(&a.votes));
            lines.truncate(params.max_lines);
            debug!(threshold, kept = lines.len(), "hough lines capped");
            return Ok(lines);
        }
        if lines.len() >= params.min_lines {
            debug!(threshold, lines = lines.len(), "hough threshold selected");
            return Ok(lines);
        }
    }
    Err(ScanError::NoQuadrilateral)
}

/// Family of a line and its angle normalized so vertical normals near 0 and
/// near 180 degrees become comparable. Diagonal lines yield `None`.
pub fn classify_line(line: &HoughLine) -> Option<(LineClass, f32, f32)> {
    let theta = line.theta_deg.rem_euclid(180.0);
    if (theta - 90.0).abs() <= CLASS_TOLERANCE_DEG {
        Some((LineClass::Horizontal, line.rho, theta))
    } else if theta <= CLASS_TOLERANCE_DEG {
        Some((LineClass::Vertical, line.rho, theta))
    } else if theta >= 180.0 - CLASS_TOLERANCE_DEG {
        // Same line as normal angle theta - 180 with negated distance
        Some((LineClass::Vertical, -line.rho, theta - 180.0))
    } else {
        None
    }
}

/// Cluster nearly identical lines of the same family
pub fn merge_lines(lines: &[HoughLine], params: &HoughParams) -> Vec<MergedLine> {
    let mut merged: Vec<MergedLine> = Vec::new();
    for line in lines {
        let Some((class, rho, theta)) = classify_line(line) else {
            continue;
        };
        let weight = line.votes.map_or(1.0, |v| v as f32);

        let existing = merged.iter_mut().find(|m| {
            m.class == class
                && (m.theta_deg - theta).abs() < params.merge_angle_deg
                && (m.rho - rho).abs() < params.merge_rho
        });
        match existing {
            Some(m) => {
                let total = m.weight + weight;
                m.rho = (m.rho * m.weight + rho * weight) / total;
                m.theta_deg = (m.theta_deg * m.weight + theta * weight) / total;
                m.weight = total;
            }
            None => merged.push(MergedLine {
                rho,
                theta_deg: theta,
                weight,
                class,
            }),
        }
    }
    merged
}

/// Crossing point of two lines in normal form, `None` when parallel
pub fn intersect(a: &MergedLine, b: &MergedLine) -> Option<Point> {
    let (sin_a, cos_a) = (a.theta_deg as f64).to_radians().sin_cos();
    let (sin_b, cos_b) = (b.theta_deg as f64).to_radians().sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }
    let (r_a, r_b) = (a.rho as f64, b.rho as f64);
    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;
    Some(Point::new(x as f32, y as f32))
}

/// Smallest angle between two line directions, in `[0, 90]`
fn angle_between(a: &MergedLine, b: &MergedLine) -> f32 {
    let d = (a.theta_deg - b.theta_deg).rem_euclid(180.0);
    d.min(180.0 - d)
}

/// Well-separated intersections that fall inside the image
pub fn find_vertices(
    lines: &[MergedLine],
    width: usize,
    height: usize,
    params: &HoughParams,
) -> Vec<Vertex> {
    let (max_x, max_y) = (width as f32, height as f32);
    let min_dist_sq = params.min_corner_distance * params.min_corner_distance;
    let mut vertices: Vec<Vertex> = Vec::new();

    for i in 0..lines.len() {
        for j in i + 1..lines.len() {
            if angle_between(&lines[i], &lines[j]) < params.min_cross_angle_deg {
                continue;
            }
            let Some(p) = intersect(&lines[i], &lines[j]) else {
                continue;
            };
            if !(0.0..=max_x).contains(&p.x) || !(0.0..=max_y).contains(&p.y) {
                continue;
            }
            if vertices
                .iter()
                .any(|v| v.point.distance_squared(&p) < min_dist_sq)
            {
                continue;
            }
            vertices.push(Vertex {
                point: p,
                lines: (i, j),
            });
        }
    }
    vertices
}

/// Simple 4-cycles in the shared-line graph, each reported once.
///
/// A cycle `[s, a, b, c]` is canonical when `s` is its smallest index and
/// `a < c`; its four edges must run along four distinct lines.
pub fn find_four_cycles(vertices: &[Vertex], max_cycles: usize) -> Vec<[usize; 4]> {
    let n = vertices.len();
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in i + 1..n {
            if let Some(line) = vertices[i].shared_line(&vertices[j]) {
                adjacency[i].push((j, line));
                adjacency[j].push((i, line));
            }
        }
    }

    let mut cycles = Vec::new();
    'search: for s in 0..n {
        for &(a, l1) in &adjacency[s] {
            if a <= s {
                continue;
            }
            for &(b, l2) in &adjacency[a] {
                if b <= s || b == a || l2 == l1 {
                    continue;
                }
                for &(c, l3) in &adjacency[b] {
                    if c <= a || c == b || l3 == l1 || l3 == l2 {
                        continue;
                    }
                    let closing = adjacency[c]
                        .iter()
                        .find(|&&(v, _)| v == s)
                        .map(|&(_, line)| line);
                    let Some(l4) = closing else {
                        continue;
                    };
                    if l4 == l1 || l4 == l2 || l4 == l3 {
                        continue;
                    }
                    cycles.push([s, a, b, c]);
                    if cycles.len() >= max_cycles {
                        debug!(max_cycles, "cycle enumeration capped");
                        break 'search;
                    }
                }
            }
        }
    }
    cycles
}

/// Mean over corners of how close each interior angle is to 90 degrees
pub fn corner_angle_bonus(corners: &[Point; 4]) -> f32 {
    let mut total = 0.0;
    for i in 0..4 {
        let prev = &corners[(i + 3) % 4];
        let next = &corners[(i + 1) % 4];
        let deg = angle(prev, &corners[i], next).to_degrees();
        total += (1.0 - (deg - 90.0).abs() / 45.0).max(0.0);
    }
    total / 4.0
}

/// Strategy 1 for the Hough detector: the best scoring 4-cycle.
pub fn find_hough_quad(
    edges: &Mask,
    backend: &dyn VisionBackend,
    config: &DetectorConfig,
) -> Result<QuadCandidate> {
    let params = &config.hough;
    let width = edges.width();
    let height = edges.height();
    let image_area = (width * height) as f32;

    let lines = select_lines(backend, edges, params)?;
    let merged = merge_lines(&lines, params);
    let vertices = find_vertices(&merged, width, height, params);
    let cycles = find_four_cycles(&vertices, params.max_cycles);
    debug!(
        lines = lines.len(),
        merged = merged.len(),
        vertices = vertices.len(),
        cycles = cycles.len(),
        "hough graph"
    );

    let mut best: Option<QuadCandidate> = None;
    let mut last_error = ScanError::NoQuadrilateral;
    for cycle in cycles {
        let ring = cycle.map(|i| vertices[i].point);
        if !is_convex(&ring) {
            continue;
        }
        let area = polygon_area(&ring);
        if area < params.min_area_ratio * image_area {
            last_error = ScanError::AreaTooSmall(area / image_area);
            continue;
        }

        let corners = robust_sort_corners(ring);
        let aspect_ratio = quad_aspect_ratio(&corners);
        let confidence = aspect_score(aspect_ratio) * corner_angle_bonus(&corners);
        let score = area * confidence;
        if best.is_none_or(|b| score > b.score) {
            best = Some(QuadCandidate {
                corners,
                area,
                aspect_ratio,
                confidence,
                score,
            });
        }
    }

    let best = best.ok_or(last_error)?;
    debug!(
        area = best.area,
        aspect = best.aspect_ratio,
        confidence = best.confidence,
        "best hough quadrilateral"
    );

    let (min_aspect, max_aspect) = config.aspect_band;
    if best.confidence < config.min_confidence {
        return Err(ScanError::LowConfidence {
            confidence: best.confidence,
            minimum: config.min_confidence,
        });
    }
    if !(min_aspect..=max_aspect).contains(&best.aspect_ratio) {
        return Err(ScanError::InvalidAspectRatio(best.aspect_ratio));
    }
    Ok(best)
}
