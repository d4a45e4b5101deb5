//! Quadrilateral fitting on traced contours.
//!
//! Each contour is thinned by a fixed stride, wrapped in its convex hull and
//! reduced to four corners: the hull diameter plus the farthest hull point
//! on each side of it. Candidates are validated for convexity and area and
//! ranked by area; the winner must also pass the aspect and confidence gates.

use crate::config::{CARD_ASPECT_RATIO, COVERAGE_HIGH, COVERAGE_LOW, DetectorConfig};
use crate::detector::contour::Contour;
use crate::detector::corners::robust_sort_corners;
use crate::error::{Result, ScanError};
use crate::models::detection::quad_aspect_ratio;
use crate::models::point::cross;
use crate::models::{Point, QuadCandidate};
use crate::utils::geometry::{is_convex, polygon_area};
use tracing::debug;

/// Andrew's monotone chain convex hull.
///
/// Returns the hull without repeating the first point; collinear points
/// are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    // Each chain ends with the start of the other
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Reduce a convex hull to four ordered corners.
///
/// `None` when the hull has fewer than four points or lies entirely on one
/// side of its diameter.
pub fn approximate_quad(hull: &[Point]) -> Option<[Point; 4]> {
    if hull.len() < 4 {
        return None;
    }

    let mut best = (0usize, 0usize, -1.0f32);
    for i in 0..hull.len() {
        for j in i + 1..hull.len() {
            let d = hull[i].distance_squared(&hull[j]);
            if d > best.2 {
                best = (i, j, d);
            }
        }
    }
    let (a, b) = (hull[best.0], hull[best.1]);

    let mut left: Option<(Point, f32)> = None;
    let mut right: Option<(Point, f32)> = None;
    for p in hull {
        let side = cross(&a, &b, p);
        if side > 0.0 && left.is_none_or(|(_, s)| side > s) {
            left = Some((*p, side));
        } else if side < 0.0 && right.is_none_or(|(_, s)| side < s) {
            right = Some((*p, side));
        }
    }

    let (c, _) = left?;
    let (d, _) = right?;
    Some(robust_sort_corners([a, c, b, d]))
}

/// Aspect plausibility: 1 at the card ratio, 0 at twice the deviation
pub fn aspect_score(aspect_ratio: f32) -> f32 {
    (1.0 - (aspect_ratio - CARD_ASPECT_RATIO).abs() / CARD_ASPECT_RATIO).max(0.0)
}

/// Coverage plausibility: 1 inside the expected band, falling linearly to
/// 0 at empty and at full coverage
pub fn coverage_score(coverage: f32) -> f32 {
    let score = if coverage < COVERAGE_LOW {
        coverage / COVERAGE_LOW
    } else if coverage > COVERAGE_HIGH {
        (1.0 - coverage) / (1.0 - COVERAGE_HIGH)
    } else {
        1.0
    };
    score.clamp(0.0, 1.0)
}

/// Combined confidence for a quadrilateral of the given shape and coverage
pub fn quad_confidence(aspect_ratio: f32, coverage: f32) -> f32 {
    0.6 * aspect_score(aspect_ratio) + 0.4 * coverage_score(coverage)
}

/// Validate one contour as a card candidate
fn evaluate_contour(
    contour: &Contour,
    image_area: f32,
    config: &DetectorConfig,
) -> Result<QuadCandidate> {
    let simplified = contour.simplified(config.contour_stride);
    let hull = convex_hull(&simplified);
    let corners = approximate_quad(&hull).ok_or(ScanError::NoQuadrilateral)?;

    if !is_convex(&corners) {
        return Err(ScanError::NoQuadrilateral);
    }

    let area = polygon_area(&corners);
    let coverage = area / image_area;
    if coverage < config.min_area_ratio {
        return Err(ScanError::AreaTooSmall(coverage));
    }
    if coverage > config.max_area_ratio {
        return Err(ScanError::AreaTooLarge(coverage));
    }

    let aspect_ratio = quad_aspect_ratio(&corners);
    let confidence = quad_confidence(aspect_ratio, coverage);
    Ok(QuadCandidate {
        corners,
        area,
        aspect_ratio,
        confidence,
        score: area,
    })
}

/// Strategy 1 for the contour detector: the largest valid quadrilateral.
pub fn find_best_quad(
    contours: &[Contour],
    width: usize,
    height: usize,
    config: &DetectorConfig,
) -> Result<QuadCandidate> {
    let image_area = (width * height) as f32;
    if image_area <= 0.0 {
        return Err(ScanError::NoQuadrilateral);
    }

    let mut best: Option<QuadCandidate> = None;
    let mut last_error = ScanError::NoQuadrilateral;
    for contour in contours {
        match evaluate_contour(contour, image_area, config) {
            Ok(candidate) => {
                if best.is_none_or(|b| candidate.area > b.area) {
                    best = Some(candidate);
                }
            }
            Err(e) => last_error = e,
        }
    }

    let best = best.ok_or(last_error)?;
    debug!(
        area = best.area,
        aspect = best.aspect_ratio,
        confidence = best.confidence,
        contours = contours.len(),
        "best contour quadrilateral"
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
