//! Ordered detection strategies.
//!
//! Strategies are attempted in a fixed order and the first success wins:
//! quadrilateral fit, edge boundary, best color component, color region and
//! finally a centered guess that cannot fail. A rejected strategy is a
//! recoverable [`ScanError`] and only moves the cascade along.

use crate::config::{
    CARD_ASPECT_RATIO, CENTERED_FRACTION, CENTERED_PORTRAIT_FRACTION, COLOR_REGION_CONFIDENCE,
    COLOR_REGION_RESIZED_CONFIDENCE, DetectorConfig, EDGE_BOUNDARY_CONFIDENCE,
};
use crate::detector::connected_components::label_components;
use crate::detector::quad::aspect_score;
use crate::error::{Result, ScanError};
use crate::models::{BoundingRect, DetectionMethod, DetectionResult, Mask, Point, QuadCandidate};
use tracing::debug;

/// Masks and settings shared by every strategy, at working resolution
#[derive(Debug, Clone, Copy)]
pub struct CascadeInput<'a> {
    /// Working width
    pub width: usize,
    /// Working height
    pub height: usize,
    /// Edge mask (Sobel or Canny)
    pub edges: &'a Mask,
    /// Card color mask
    pub colors: &'a Mask,
    /// Thresholds
    pub config: &'a DetectorConfig,
}

impl CascadeInput<'_> {
    fn image_area(&self) -> f32 {
        (self.width * self.height) as f32
    }

    fn detected(&self, rect: BoundingRect, confidence: f32, method: DetectionMethod) -> DetectionResult {
        DetectionResult::detected(rect.corners(), confidence, method, self.width, self.height)
    }
}

fn in_band(value: f32, band: (f32, f32)) -> bool {
    (band.0..=band.1).contains(&value)
}

/// Run every strategy in order; `quadrilateral` is the detector-specific
/// first strategy.
pub fn run_cascade<F>(input: &CascadeInput<'_>, quadrilateral: F) -> DetectionResult
where
    F: FnOnce() -> Result<QuadCandidate>,
{
    if input.width == 0 || input.height == 0 {
        return DetectionResult::empty(input.width, input.height);
    }

    match quadrilateral() {
        Ok(quad) => {
            let result = DetectionResult::detected(
                quad.corners,
                quad.confidence,
                DetectionMethod::Quadrilateral,
                input.width,
                input.height,
            );
            if result.success {
                return result;
            }
            debug!(strategy = "quadrilateral", "non-convex corners");
        }
        Err(e) => debug!(strategy = "quadrilateral", error = %e, "strategy rejected"),
    }

    let fallbacks: [(&str, fn(&CascadeInput<'_>) -> Result<DetectionResult>); 3] = [
        ("edge_boundary", edge_boundary),
        ("connected_component", connected_component),
        ("color_region", color_region),
    ];
    for (name, strategy) in fallbacks {
        match strategy(input) {
            Ok(result) if result.success => return result,
            Ok(_) => debug!(strategy = name, "degenerate region"),
            Err(e) => debug!(strategy = name, error = %e, "strategy rejected"),
        }
    }

    centered_fallback(input.width, input.height, input.config.orientation_aware)
}

/// Padded bounds of every edge and color pixel
pub fn edge_boundary(input: &CascadeInput<'_>) -> Result<DetectionResult> {
    let union = input.edges.union(input.colors);
    let bounds = union.foreground_bounds().ok_or(ScanError::NoQuadrilateral)?;
    let rect = BoundingRect::from_pixel_bounds(bounds).padded(
        input.config.edge_boundary_padding,
        input.width as f32,
        input.height as f32,
    );

    let aspect = rect.normalized_aspect();
    if !in_band(aspect, input.config.loose_aspect_band) {
        return Err(ScanError::InvalidAspectRatio(aspect));
    }
    let coverage = rect.area() / input.image_area();
    if coverage > input.config.max_area_ratio {
        return Err(ScanError::AreaTooLarge(coverage));
    }
    Ok(input.detected(rect, EDGE_BOUNDARY_CONFIDENCE, DetectionMethod::EdgeBoundary))
}

/// Best scoring color component
pub fn connected_component(input: &CascadeInput<'_>) -> Result<DetectionResult> {
    let config = input.config;
    let image_area = input.image_area();
    let image_center = Point::new(input.width as f32 * 0.5, input.height as f32 * 0.5);
    let half_diagonal = image_center.distance(&Point::new(0.0, 0.0)).max(1.0);

    let candidates: Vec<_> = label_components(input.colors, config.component_min_pixels)
        .into_iter()
        .filter(|c| {
            let ratio = c.bounding_rect.area() / image_area;
            ratio >= config.component_min_area_ratio
                && ratio <= config.max_area_ratio
                && in_band(c.bounding_rect.normalized_aspect(), config.loose_aspect_band)
                && c.density >= config.component_min_density
        })
        .collect();

    let largest = candidates
        .iter()
        .map(|c| c.bounding_rect.area())
        .fold(0.0f32, f32::max);
    if largest <= 0.0 {
        return Err(ScanError::NoQuadrilateral);
    }

    let (component, score) = candidates
        .iter()
        .map(|c| {
            let rect = &c.bounding_rect;
            let aspect_match = aspect_score(rect.normalized_aspect());
            let relative_size = rect.area() / largest;
            let centeredness = 1.0 - (rect.center().distance(&image_center) / half_diagonal).min(1.0);
            let score = 0.4 * aspect_match + 0.3 * relative_size + 0.2 * c.density.min(1.0) + 0.1 * centeredness;
            (c, score)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or(ScanError::NoQuadrilateral)?;

    debug!(
        candidates = candidates.len(),
        score,
        pixels = component.pixel_count,
        "best color component"
    );
    Ok(input.detected(component.bounding_rect, score, DetectionMethod::ConnectedComponent))
}

/// Bounds of the color mask, reshaped to card proportions when implausible
pub fn color_region(input: &CascadeInput<'_>) -> Result<DetectionResult> {
    let bounds = input
        .colors
        .foreground_bounds()
        .ok_or(ScanError::NoQuadrilateral)?;
    let rect = BoundingRect::from_pixel_bounds(bounds);
    if in_band(rect.normalized_aspect(), input.config.aspect_band) {
        return Ok(input.detected(rect, COLOR_REGION_CONFIDENCE, DetectionMethod::ColorRegion));
    }

    let (cx, cy) = input
        .colors
        .foreground_centroid()
        .ok_or(ScanError::NoQuadrilateral)?;
    let (w, h) = if rect.width >= rect.height {
        (rect.width, rect.width / CARD_ASPECT_RATIO)
    } else {
        (rect.height / CARD_ASPECT_RATIO, rect.height)
    };
    let resized = BoundingRect::new(cx - w * 0.5, cy - h * 0.5, w, h)
        .clamped(input.width as f32, input.height as f32);
    if resized.area() <= 0.0 {
        return Err(ScanError::AreaTooSmall(0.0));
    }
    Ok(input.detected(
        resized,
        COLOR_REGION_RESIZED_CONFIDENCE,
        DetectionMethod::ColorRegion,
    ))
}

/// Card-shaped box in the middle of the image; never marked successful
pub fn centered_fallback(width: usize, height: usize, orientation_aware: bool) -> DetectionResult {
    if width == 0 || height == 0 {
        return DetectionResult::empty(width, height);
    }
    let (w, h) = (width as f32, height as f32);
    let card_width = if orientation_aware && h > w {
        CENTERED_PORTRAIT_FRACTION * w
    } else {
        CENTERED_FRACTION * w.min(h)
    };
    let card_height = card_width / CARD_ASPECT_RATIO;
    let rect = BoundingRect::new((w - card_width) * 0.5, (h - card_height) * 0.5, card_width, card_height);
    DetectionResult::fallback(rect, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(mask: &mut Mask, x0: usize, y0: usize, w: usize, h: usize) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.set(x, y, true);
            }
        }
    }

    fn input<'a>(edges: &'a Mask, colors: &'a Mask, config: &'a DetectorConfig) -> CascadeInput<'a> {
        CascadeInput {
            width: edges.width(),
            height: edges.height(),
            edges,
            colors,
            config,
        }
    }

    #[test]
    fn test_quadrilateral_wins_first() {
        let config = DetectorConfig::default();
        let mut colors = Mask::new(200, 150);
        fill(&mut colors, 10, 10, 30, 30);
        let edges = Mask::new(200, 150);
        let quad = QuadCandidate {
            corners: BoundingRect::new(20.0, 20.0, 158.6, 100.0).corners(),
            area: 15860.0,
            aspect_ratio: 1.586,
            confidence: 0.97,
            score: 15860.0,
        };
        let result = run_cascade(&input(&edges, &colors, &config), || Ok(quad));
        assert!(result.success);
        assert_eq!(result.method, DetectionMethod::Quadrilateral);
        assert!((result.confidence - 0.97).abs() < 1e-6);
    }

    #[test]
    fn test_empty_masks_end_in_centered_fallback() {
        let config = DetectorConfig::default();
        let edges = Mask::new(400, 300);
        let colors = Mask::new(400, 300);
        let result = run_cascade(&input(&edges, &colors, &config), || {
            Err(ScanError::NoQuadrilateral)
        });
        assert!(!result.success);
        assert_eq!(result.method, DetectionMethod::CenteredFallback);
        assert_eq!(result.confidence, 0.0);
        assert!(result.corners.is_some());
    }

    #[test]
    fn test_edge_boundary() {
        let config = DetectorConfig::default();
        let mut edges = Mask::new(400, 300);
        fill(&mut edges, 100, 100, 160, 2);
        fill(&mut edges, 100, 198, 160, 2);
        let colors = Mask::new(400, 300);
        let result = edge_boundary(&input(&edges, &colors, &config)).unwrap();
        assert_eq!(result.method, DetectionMethod::EdgeBoundary);
        assert_eq!(result.bounding_rect, BoundingRect::new(92.0, 92.0, 176.0, 116.0));
        assert_eq!(result.confidence, EDGE_BOUNDARY_CONFIDENCE);

        // A thin line fails the loose aspect band
        let mut line = Mask::new(400, 300);
        fill(&mut line, 10, 150, 380, 1);
        assert!(matches!(
            edge_boundary(&input(&line, &colors, &config)),
            Err(ScanError::InvalidAspectRatio(_))
        ));
    }

    #[test]
    fn test_edge_boundary_rejects_whole_frame() {
        let config = DetectorConfig::default();
        let mut edges = Mask::new(300, 200);
        edges.set(1, 1, true);
        edges.set(298, 198, true);
        let colors = Mask::new(300, 200);
        assert!(matches!(
            edge_boundary(&input(&edges, &colors, &config)),
            Err(ScanError::AreaTooLarge(_))
        ));
    }

    #[test]
    fn test_textured_frame_falls_through_to_component() {
        let config = DetectorConfig::default();
        // Busy background: edges everywhere in the frame
        let mut edges = Mask::new(480, 300);
        for y in 0..300 {
            for x in 0..480 {
                if (x + y) % 5 == 0 {
                    edges.set(x, y, true);
                }
            }
        }
        let mut colors = Mask::new(480, 300);
        fill(&mut colors, 140, 87, 200, 126);
        let input = input(&edges, &colors, &config);

        assert!(matches!(edge_boundary(&input), Err(ScanError::AreaTooLarge(_))));
        let result = run_cascade(&input, || Err(ScanError::NoQuadrilateral));
        assert!(result.success);
        assert_eq!(result.method, DetectionMethod::ConnectedComponent);
        assert_eq!(result.bounding_rect, BoundingRect::new(140.0, 87.0, 200.0, 126.0));
    }

    #[test]
    fn test_connected_component_prefers_card_shape() {
        let config = DetectorConfig::default();
        let edges = Mask::new(400, 300);
        let mut colors = Mask::new(400, 300);
        // Card-shaped block near the center
        fill(&mut colors, 120, 100, 160, 101);
        // Square block in a corner
        fill(&mut colors, 5, 5, 60, 60);
        let result = connected_component(&input(&edges, &colors, &config)).unwrap();
        assert_eq!(result.method, DetectionMethod::ConnectedComponent);
        assert_eq!(result.bounding_rect, BoundingRect::new(120.0, 100.0, 160.0, 101.0));
        assert!(result.confidence > 0.8);
    }

    #[test]
    fn test_color_region_resizes_to_card_ratio() {
        let config = DetectorConfig::default();
        let edges = Mask::new(400, 300);
        let mut colors = Mask::new(400, 300);
        // Square region: aspect 1.0 is outside the strict band
        fill(&mut colors, 150, 100, 100, 100);
        let result = color_region(&input(&edges, &colors, &config)).unwrap();
        assert_eq!(result.method, DetectionMethod::ColorRegion);
        assert_eq!(result.confidence, COLOR_REGION_RESIZED_CONFIDENCE);
        let rect = result.bounding_rect;
        assert!((rect.width - 100.0).abs() < 1e-3);
        assert!((rect.aspect_ratio() - CARD_ASPECT_RATIO).abs() < 1e-3);
        assert!((rect.center().x - 199.5).abs() < 1e-3);

        // A card-shaped region is accepted as is
        let mut card = Mask::new(400, 300);
        fill(&mut card, 50, 50, 159, 100);
        let result = color_region(&input(&edges, &card, &config)).unwrap();
        assert_eq!(result.confidence, COLOR_REGION_CONFIDENCE);
        assert_eq!(result.bounding_rect, BoundingRect::new(50.0, 50.0, 159.0, 100.0));
    }

    #[test]
    fn test_centered_fallback_geometry() {
        let landscape = centered_fallback(1000, 600, true);
        assert!(!landscape.success);
        assert!((landscape.bounding_rect.width - 420.0).abs() < 1e-3);
        assert!((landscape.bounding_rect.center().x - 500.0).abs() < 1e-3);

        let portrait = centered_fallback(600, 1000, true);
        assert!((portrait.bounding_rect.width - 540.0).abs() < 1e-3);
        let plain = centered_fallback(600, 1000, false);
        assert!((plain.bounding_rect.width - 420.0).abs() < 1e-3);

        assert!(centered_fallback(0, 10, true).corners.is_none());
    }
}
