//! End-to-end tests for detection, rectification and the overlay
//!
//! Every photo is synthetic: a bright card on a dark table, optionally
//! rotated. The software vision backend is used throughout so results do
//! not depend on the `native` feature.

use card_rectify::config::{DetectorKind, ScanConfig};
use card_rectify::models::Point;
use card_rectify::rectify::{draw_overlay, render_overlay};
use card_rectify::{
    CardDetector, CardScanner, ContourDetector, DetectionMethod, HoughDetector, RgbaRaster,
    ScanError, Vision, detect_card, detect_card_rgba,
};
use std::sync::Arc;

const TABLE: [u8; 4] = [25, 25, 30, 255];
const CARD: [u8; 4] = [235, 235, 235, 255];

fn inside(corners: &[Point; 4], x: f32, y: f32) -> bool {
    (0..4).all(|i| {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x) >= 0.0
    })
}

/// Card of `card_w` x `card_h` centered in the photo and rotated by `degrees`
fn photo(width: usize, height: usize, card_w: f32, card_h: f32, degrees: f32) -> (RgbaRaster, [Point; 4]) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)].map(|(u, v)| {
        let (dx, dy) = (u * card_w, v * card_h);
        Point::new(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    });

    let mut raster = RgbaRaster::filled(width, height, TABLE);
    for y in 0..height {
        for x in 0..width {
            if inside(&corners, x as f32 + 0.5, y as f32 + 0.5) {
                raster.put_pixel(x, y, CARD);
            }
        }
    }
    (raster, corners)
}

fn software_scanner(kind: DetectorKind) -> CardScanner {
    let config = ScanConfig {
        detector: kind,
        ..ScanConfig::default()
    };
    CardScanner::with_vision(config, Arc::new(Vision::software()))
}

fn nearest_distance(found: &[Point; 4], target: &Point) -> f32 {
    found
        .iter()
        .map(|p| p.distance(target))
        .fold(f32::INFINITY, f32::min)
}

#[test]
fn clean_card_contour_detector() {
    let (image, truth) = photo(640, 480, 380.0, 240.0, 0.0);
    let result = ContourDetector::default().detect(&image);
    assert!(result.success);
    assert_eq!(result.method, DetectionMethod::Quadrilateral);
    let corners = result.corners.unwrap();
    for t in &truth {
        assert!(nearest_distance(&corners, t) < 6.0, "corner {:?} missed: {:?}", t, corners);
    }
}

#[test]
fn clean_card_hough_detector() {
    let (image, truth) = photo(640, 480, 380.0, 240.0, 0.0);
    let vision = Arc::new(Vision::software());
    let detector = HoughDetector::new(Default::default(), vision.clone());
    let result = detector.detect(&image);
    assert!(vision.is_initialized());
    assert!(result.success);
    assert_eq!(result.method, DetectionMethod::Quadrilateral);
    let corners = result.corners.unwrap();
    for t in &truth {
        assert!(nearest_distance(&corners, t) < 8.0, "corner {:?} missed: {:?}", t, corners);
    }
}

#[test]
fn all_black_image_uses_centered_fallback() {
    let image = RgbaRaster::filled(320, 240, [0, 0, 0, 255]);
    for kind in [DetectorKind::Contour, DetectorKind::Hough] {
        let result = software_scanner(kind).detect(&image);
        assert!(!result.success);
        assert_eq!(result.method, DetectionMethod::CenteredFallback);
        assert_eq!(result.confidence, 0.0);
        let rect = result.bounding_rect;
        let center = rect.center();
        assert!((center.x - 160.0).abs() < 1.0 && (center.y - 120.0).abs() < 1.0);
    }
}

#[test]
fn raw_rgba_matches_raster() {
    let (image, _) = photo(320, 240, 190.0, 120.0, 0.0);
    let from_bytes = detect_card_rgba(image.as_bytes(), 320, 240).unwrap();
    assert_eq!(from_bytes, detect_card(&image));
}

#[test]
fn rotated_card_end_to_end() {
    let (image, _) = photo(800, 600, 460.0, 290.0, 12.0);
    let output = software_scanner(DetectorKind::Contour).scan(&image).unwrap();

    assert!(output.detection.success);
    assert!(output.warped);
    assert_eq!(output.rectified.width(), 1000);
    assert_eq!(output.rectified.height(), 631);

    // The middle of the rectified card is card, not table
    let center = output.rectified.pixel(500, 315);
    assert!(center[0] > 200, "center pixel {:?}", center);

    let binarized = output.binarized.expect("binarized variant enabled by default");
    assert_eq!((binarized.width(), binarized.height()), (1000, 631));
}

#[test]
fn portrait_card_is_rectified_landscape() {
    let (image, _) = photo(600, 800, 290.0, 460.0, 0.0);
    let config = ScanConfig {
        enhance: None,
        binarize: false,
        ..ScanConfig::default()
    };
    let output = CardScanner::with_vision(config, Arc::new(Vision::software()))
        .scan(&image)
        .unwrap();
    assert_eq!((output.rectified.width(), output.rectified.height()), (1000, 631));
    assert!(output.rectified.pixel(500, 315)[0] > 200);
}

#[test]
fn overlay_requires_matching_surface() {
    let (image, _) = photo(320, 240, 190.0, 120.0, 0.0);
    let result = detect_card(&image);

    let drawn = render_overlay(&image, &result).unwrap();
    assert_eq!((drawn.width(), drawn.height()), (320, 240));
    assert_ne!(drawn, image);

    let mut wrong = RgbaRaster::new(100, 100);
    let err = draw_overlay(&mut wrong, &result).unwrap_err();
    assert!(matches!(err, ScanError::MissingSurface(_)));

    let mut empty = RgbaRaster::new(0, 0);
    assert!(matches!(draw_overlay(&mut empty, &result), Err(ScanError::MissingSurface(_))));
}
