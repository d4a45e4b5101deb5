//! Card detection modules
//!
//! This module contains the logic for locating an ID card in a photo:
//! - Color segmentation and edge masks
//! - Contour tracing and connected components
//! - Quadrilateral fitting (contour hulls) and Hough 4-cycles
//! - The fallback strategy cascade and corner ordering

use crate::config::{DetectorConfig, DetectorKind};
use crate::models::{DetectionResult, RgbaRaster};
use crate::vision::Vision;
use std::sync::Arc;
use tracing::info;

/// Ordered detection strategies
pub mod cascade;
/// 4-connected component labeling
pub mod connected_components;
/// 8-connected contour tracing
pub mod contour;
/// Canonical corner order
pub mod corners;
/// Sobel and Canny edge masks
pub mod edges;
/// Hough line graph and 4-cycle search
pub mod hough;
/// Convex hull and quadrilateral fitting
pub mod quad;
/// Working-resolution scaling
pub mod scale;
/// Card color segmentation
pub mod segment;

use cascade::{CascadeInput, run_cascade};
use contour::trace_contours;
use edges::{canny_edges, sobel_edges};
use scale::WorkingScale;
use segment::segment_card_colors;

/// A strategy-1 detector wrapped in the fallback cascade
pub trait CardDetector: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Locate the card. Always returns a usable result; check `success`.
    fn detect(&self, raster: &RgbaRaster) -> DetectionResult;
}

fn log_result(detector: &str, result: &DetectionResult) {
    info!(
        detector,
        method = %result.method,
        success = result.success,
        confidence = result.confidence,
        "card detection finished"
    );
}

/// Sobel edges, contour hulls and quadrilateral fitting
#[derive(Debug, Clone, Default)]
pub struct ContourDetector {
    config: DetectorConfig,
}

impl ContourDetector {
    /// Create a detector with the given thresholds
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
}

impl CardDetector for ContourDetector {
    fn name(&self) -> &'static str {
        "contour"
    }

    fn detect(&self, raster: &RgbaRaster) -> DetectionResult {
        if raster.is_empty() {
            return DetectionResult::empty(raster.width(), raster.height());
        }
        let config = &self.config;
        let scale = WorkingScale::fit_max_dim(raster.width(), raster.height(), config.working_max_dim);
        let working = scale.downscale(raster);

        let colors = segment_card_colors(&working, &config.colors);
        let edges = sobel_edges(&working, config.sobel_threshold);
        let input = CascadeInput {
            width: scale.width,
            height: scale.height,
            edges: &edges,
            colors: &colors,
            config,
        };

        let result = run_cascade(&input, || {
            let mut contours =
                trace_contours(&edges, config.contour_min_points, config.contour_max_points);
            contours.extend(trace_contours(
                &colors,
                config.contour_min_points,
                config.contour_max_points,
            ));
            quad::find_best_quad(&contours, scale.width, scale.height, config)
        });

        let result = scale.to_source(&result);
        log_result(self.name(), &result);
        result
    }
}

/// Canny edges, Hough lines and intersection 4-cycles
#[derive(Debug, Clone)]
pub struct HoughDetector {
    config: DetectorConfig,
    vision: Arc<Vision>,
}

impl HoughDetector {
    /// Create a detector using `vision` for blur, close, Canny and Hough
    pub fn new(config: DetectorConfig, vision: Arc<Vision>) -> Self {
        Self { config, vision }
    }
}

impl CardDetector for HoughDetector {
    fn name(&self) -> &'static str {
        "hough"
    }

    fn detect(&self, raster: &RgbaRaster) -> DetectionResult {
        if raster.is_empty() {
            return DetectionResult::empty(raster.width(), raster.height());
        }
        let config = &self.config;
        let backend = self.vision.backend();
        let scale = WorkingScale::fit_height(raster.width(), raster.height(), config.canny.target_height);
        let working = scale.downscale(raster);

        let colors = segment_card_colors(&working, &config.colors);
        let edges = canny_edges(&working, &config.canny, backend);
        let input = CascadeInput {
            width: scale.width,
            height: scale.height,
            edges: &edges,
            colors: &colors,
            config,
        };

        let result = run_cascade(&input, || hough::find_hough_quad(&edges, backend, config));

        let result = scale.to_source(&result);
        log_result(self.name(), &result);
        result
    }
}

/// Build the detector selected by `kind`
pub fn build_detector(
    kind: DetectorKind,
    config: DetectorConfig,
    vision: Arc<Vision>,
) -> Box<dyn CardDetector> {
    match kind {
        DetectorKind::Contour => Box::new(ContourDetector::new(config)),
        DetectorKind::Hough => Box::new(HoughDetector::new(config, vision)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectionMethod;

    fn synthetic_card() -> RgbaRaster {
        let mut raster = RgbaRaster::filled(640, 480, [25, 25, 30, 255]);
        for y in 100..340 {
            for x in 120..500 {
                raster.put_pixel(x, y, [235, 235, 235, 255]);
            }
        }
        raster
    }

    #[test]
    fn test_contour_detector_finds_card() {
        let result = ContourDetector::default().detect(&synthetic_card());
        assert!(result.success);
        assert_eq!(result.method, DetectionMethod::Quadrilateral);
        let corners = result.corners.unwrap();
        assert!(corners[0].distance(&crate::models::Point::new(120.0, 100.0)) < 6.0);
        assert!(corners[2].distance(&crate::models::Point::new(499.0, 339.0)) < 6.0);
    }

    #[test]
    fn test_build_detector_kinds() {
        let vision = Arc::new(Vision::software());
        let contour = build_detector(DetectorKind::Contour, DetectorConfig::default(), vision.clone());
        assert_eq!(contour.name(), "contour");
        let hough = build_detector(DetectorKind::Hough, DetectorConfig::default(), vision.clone());
        assert_eq!(hough.name(), "hough");
        // Building does not touch the vision backend
        assert!(!vision.is_initialized());
    }

    #[test]
    fn test_empty_raster() {
        let result = ContourDetector::default().detect(&RgbaRaster::new(0, 0));
        assert!(!result.success);
        assert!(result.corners.is_none());
    }
}
