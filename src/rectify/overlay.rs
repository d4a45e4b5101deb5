//! Diagnostic overlay of a detection result on the source photo.

use crate::error::{Result, ScanError};
use crate::models::{DetectionResult, Point, RgbaRaster};

const FILL: [u8; 3] = [0, 200, 90];
const FILL_ALPHA: f32 = 0.25;
const OUTLINE: [u8; 4] = [0, 200, 90, 255];
const CORNER: [u8; 4] = [230, 40, 40, 255];
const FAILURE: [u8; 4] = [255, 150, 0, 255];
const LINE_WIDTH: i64 = 2;
const CORNER_RADIUS: i64 = 5;
const DASH: usize = 10;

fn blend_pixel(surface: &mut RgbaRaster, x: usize, y: usize, color: [u8; 3], alpha: f32) {
    let px = surface.pixel(x, y);
    let mix = |s: u8, c: u8| (s as f32 * (1.0 - alpha) + c as f32 * alpha).round() as u8;
    let out = [
        mix(px[0], color[0]),
        mix(px[1], color[1]),
        mix(px[2], color[2]),
        px[3].max((alpha * 255.0) as u8),
    ];
    surface.put_pixel(x, y, out);
}

fn stamp(surface: &mut RgbaRaster, cx: i64, cy: i64, radius: i64, color: [u8; 4]) {
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            if x >= 0 && y >= 0 {
                surface.put_pixel(x as usize, y as usize, color);
            }
        }
    }
}

/// Scanline fill with even-odd crossings sampled at pixel centers
fn fill_polygon(surface: &mut RgbaRaster, points: &[Point], color: [u8; 3], alpha: f32) {
    if points.len() < 3 {
        return;
    }
    let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
    let max_y = points
        .iter()
        .map(|p| p.y)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min(surface.height() as f32 - 1.0);
    if max_y < 0.0 {
        return;
    }
    let max_y = max_y as usize;
    let last_x = surface.width() as f32 - 1.0;

    let mut crossings = Vec::with_capacity(points.len());
    for y in min_y..=max_y {
        let scan = y as f32 + 0.5;
        crossings.clear();
        for (i, p1) in points.iter().enumerate() {
            let p2 = points[(i + 1) % points.len()];
            if (p1.y <= scan && p2.y > scan) || (p2.y <= scan && p1.y > scan) {
                let t = (scan - p1.y) / (p2.y - p1.y);
                crossings.push(p1.x + t * (p2.x - p1.x));
            }
        }
        crossings.sort_by(f32::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let start = pair[0].round().max(0.0);
            let end = pair[1].round().min(last_x);
            if end < start {
                continue;
            }
            for x in start as usize..=end as usize {
                blend_pixel(surface, x, y, color, alpha);
            }
        }
    }
}

/// Stamp a square brush along `a -> b`; with `dash` set, every other run
/// of that many steps is skipped
fn draw_segment(surface: &mut RgbaRaster, a: Point, b: Point, color: [u8; 4], dash: Option<usize>) {
    let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        if dash.is_some_and(|d| (i / d) % 2 == 1) {
            continue;
        }
        let t = i as f32 / steps as f32;
        let x = a.x + (b.x - a.x) * t;
        let y = a.y + (b.y - a.y) * t;
        stamp(surface, x.round() as i64, y.round() as i64, LINE_WIDTH / 2, color);
    }
}

fn draw_ring(surface: &mut RgbaRaster, ring: &[Point; 4], color: [u8; 4], dash: Option<usize>) {
    for i in 0..4 {
        draw_segment(surface, ring[i], ring[(i + 1) % 4], color, dash);
    }
}

/// Draw `result` onto `surface`, which must be the photo it was computed on.
///
/// Successful detections get a translucent filled polygon, an outline and
/// corner markers. Anything else gets a dashed bounding rectangle.
pub fn draw_overlay(surface: &mut RgbaRaster, result: &DetectionResult) -> Result<()> {
    if surface.is_empty() {
        return Err(ScanError::MissingSurface("surface has no pixels".into()));
    }
    if surface.width() != result.image_width || surface.height() != result.image_height {
        return Err(ScanError::MissingSurface(format!(
            "surface is {}x{}, detection was computed on {}x{}",
            surface.width(),
            surface.height(),
            result.image_width,
            result.image_height
        )));
    }

    match result.corners {
        Some(corners) if result.success => {
            fill_polygon(surface, &corners, FILL, FILL_ALPHA);
            draw_ring(surface, &corners, OUTLINE, None);
            for c in &corners {
                stamp(surface, c.x.round() as i64, c.y.round() as i64, CORNER_RADIUS, CORNER);
            }
        }
        _ => {
            let rect = result
                .bounding_rect
                .clamped(surface.width() as f32 - 1.0, surface.height() as f32 - 1.0);
            draw_ring(surface, &rect.corners(), FAILURE, Some(DASH));
        }
    }
    Ok(())
}

/// Copy `image` and draw the overlay on the copy
pub fn render_overlay(image: &RgbaRaster, result: &DetectionResult) -> Result<RgbaRaster> {
    let mut surface = image.clone();
    draw_overlay(&mut surface, result)?;
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingRect, DetectionMethod};

    fn photo() -> RgbaRaster {
        RgbaRaster::filled(100, 80, [10, 10, 10, 255])
    }

    #[test]
    fn test_success_overlay() {
        let rect = BoundingRect::new(20.0, 20.0, 60.0, 38.0);
        let result = DetectionResult::detected(rect.corners(), 0.9, DetectionMethod::Quadrilateral, 100, 80);
        let out = render_overlay(&photo(), &result).unwrap();

        // Interior is tinted, outside untouched
        let inside = out.pixel(50, 40);
        assert!(inside[1] > 10 && inside[0] < inside[1]);
        assert_eq!(out.pixel(5, 5), [10, 10, 10, 255]);
        assert_eq!(out.pixel(20, 20), CORNER);
    }

    #[test]
    fn test_failure_overlay_is_dashed() {
        let result = DetectionResult::fallback(BoundingRect::new(10.0, 10.0, 70.0, 50.0), 100, 80);
        let out = render_overlay(&photo(), &result).unwrap();
        // Top edge: first dash drawn, second gap skipped
        assert_eq!(out.pixel(12, 10), FAILURE);
        assert_eq!(out.pixel(25, 10), [10, 10, 10, 255]);
        // No fill
        assert_eq!(out.pixel(45, 35), [10, 10, 10, 255]);
    }

    #[test]
    fn test_missing_surface() {
        let result = DetectionResult::fallback(BoundingRect::new(0.0, 0.0, 10.0, 10.0), 100, 80);
        let mut empty = RgbaRaster::new(0, 0);
        assert!(matches!(draw_overlay(&mut empty, &result), Err(ScanError::MissingSurface(_))));

        let mut wrong = RgbaRaster::new(50, 40);
        let err = draw_overlay(&mut wrong, &result).unwrap_err();
        assert!(matches!(err, ScanError::MissingSurface(_)));
        assert!(!err.is_recoverable());
    }
}
