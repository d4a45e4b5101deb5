/// Detection value types shared by every strategy
use crate::models::{BoundingRect, Point};
use crate::utils::geometry::is_convex;

/// Four-corner candidate produced and ranked by a strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadCandidate {
    /// Corners in `[TL, TR, BR, BL]` order
    pub corners: [Point; 4],
    /// Polygon area in square pixels
    pub area: f32,
    /// Normalized (>= 1) aspect ratio
    pub aspect_ratio: f32,
    /// Acceptance confidence in `[0, 1]`
    pub confidence: f32,
    /// Strategy-specific ranking score
    pub score: f32,
}

/// Which strategy produced a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionMethod {
    /// Contour hull fit or Hough 4-cycle
    Quadrilateral,
    /// Bounding box of all edge and color pixels
    EdgeBoundary,
    /// Best scoring color component
    ConnectedComponent,
    /// Bounding box of the color mask, possibly resized to card ratio
    ColorRegion,
    /// Blind centered guess
    CenteredFallback,
}

impl DetectionMethod {
    /// Stable lowercase name for logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Quadrilateral => "quadrilateral",
            DetectionMethod::EdgeBoundary => "edge_boundary",
            DetectionMethod::ConnectedComponent => "connected_component",
            DetectionMethod::ColorRegion => "color_region",
            DetectionMethod::CenteredFallback => "centered_fallback",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal output of the detector
///
/// `success == false` is a complete, usable guess (the centered fallback),
/// not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Whether the corners come from an actual detection
    pub success: bool,
    /// Corners in `[TL, TR, BR, BL]` order
    pub corners: Option<[Point; 4]>,
    /// Axis-aligned bounds of the corners
    pub bounding_rect: BoundingRect,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Strategy that produced the corners
    pub method: DetectionMethod,
    /// Source image width
    pub image_width: usize,
    /// Source image height
    pub image_height: usize,
    /// Normalized aspect ratio of the detected region
    pub detected_aspect_ratio: f32,
}

impl DetectionResult {
    /// Result of a strategy that located the card.
    ///
    /// A non-convex corner set cannot be a successful detection and is
    /// demoted to `success == false`.
    pub fn detected(
        corners: [Point; 4],
        confidence: f32,
        method: DetectionMethod,
        image_width: usize,
        image_height: usize,
    ) -> Self {
        let success = is_convex(&corners);
        Self::build(corners, success, confidence, method, image_width, image_height)
    }

    /// Centered guess; never marked successful
    pub fn fallback(rect: BoundingRect, image_width: usize, image_height: usize) -> Self {
        Self::build(
            rect.corners(),
            false,
            0.0,
            DetectionMethod::CenteredFallback,
            image_width,
            image_height,
        )
    }

    /// Result carrying no corners at all (empty input)
    pub fn empty(image_width: usize, image_height: usize) -> Self {
        Self {
            success: false,
            corners: None,
            bounding_rect: BoundingRect::default(),
            confidence: 0.0,
            method: DetectionMethod::CenteredFallback,
            image_width,
            image_height,
            detected_aspect_ratio: 0.0,
        }
    }

    fn build(
        corners: [Point; 4],
        success: bool,
        confidence: f32,
        method: DetectionMethod,
        image_width: usize,
        image_height: usize,
    ) -> Self {
        let bounding_rect = BoundingRect::from_points(&corners).unwrap_or_default();
        Self {
            success,
            corners: Some(corners),
            bounding_rect,
            confidence: confidence.clamp(0.0, 1.0),
            method,
            image_width,
            image_height,
            detected_aspect_ratio: quad_aspect_ratio(&corners),
        }
    }

    /// Return a copy with every coordinate multiplied by `factor` and
    /// clamped to the target image size
    pub fn rescaled(&self, factor: f32, image_width: usize, image_height: usize) -> Self {
        let max_x = image_width as f32;
        let max_y = image_height as f32;
        let Some(corners) = self.corners else {
            return Self::empty(image_width, image_height);
        };
        let scaled = corners.map(|p| p.scale(factor).clamp(max_x, max_y));
        let success = self.success && is_convex(&scaled);
        Self::build(
            scaled,
            success,
            self.confidence,
            self.method,
            image_width,
            image_height,
        )
    }
}

/// Normalized aspect ratio from mean opposite edge lengths of an ordered quad
pub fn quad_aspect_ratio(corners: &[Point; 4]) -> f32 {
    let top = corners[0].distance(&corners[1]);
    let right = corners[1].distance(&corners[2]);
    let bottom = corners[2].distance(&corners[3]);
    let left = corners[3].distance(&corners[0]);
    let horizontal = (top + bottom) * 0.5;
    let vertical = (left + right) * 0.5;
    let long = horizontal.max(vertical);
    let short = horizontal.min(vertical);
    if short <= f32::EPSILON { 0.0 } else { long / short }
}
