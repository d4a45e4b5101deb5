/// Perspective rectification of the detected card
use crate::config::CARD_ASPECT_RATIO;
use crate::detector::corners::robust_sort_corners;
use crate::error::{Result, ScanError};
use crate::models::{DetectionResult, Point, RgbaRaster};
use crate::utils::geometry::{Homography, is_convex};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Source samples may land this far outside the image and still clamp to
/// the edge pixel
const SAMPLE_MARGIN: f64 = 1.0;

/// Rectified card raster
#[derive(Debug, Clone, PartialEq)]
pub struct RectifiedCard {
    /// Output pixels
    pub raster: RgbaRaster,
    /// `false` when the axis-aligned crop fallback produced the raster
    pub warped: bool,
}

/// Rotate an ordered corner ring so the longer card edge maps to the
/// horizontal output axis
pub fn landscape_corners(corners: [Point; 4]) -> [Point; 4] {
    let horizontal = corners[0].distance(&corners[1]) + corners[2].distance(&corners[3]);
    let vertical = corners[1].distance(&corners[2]) + corners[3].distance(&corners[0]);
    if vertical > horizontal {
        let mut rotated = corners;
        rotated.rotate_left(1);
        rotated
    } else {
        corners
    }
}

/// Output size for an ordered corner ring: the configured width (or the
/// longer of the top and bottom edges) and the card-ratio height
pub fn target_size(corners: &[Point; 4], output_width: Option<u32>) -> (usize, usize) {
    let width = match output_width {
        Some(w) => w as usize,
        None => {
            let top = corners[0].distance(&corners[1]);
            let bottom = corners[3].distance(&corners[2]);
            top.max(bottom).round() as usize
        }
    }
    .max(1);
    let height = ((width as f32 / CARD_ASPECT_RATIO).round() as usize).max(1);
    (width, height)
}

/// Bilinear sample of all four channels. Exact at integer coordinates.
/// Coordinates are clamped to the raster.
pub fn bilinear_sample(src: &RgbaRaster, x: f64, y: f64) -> [u8; 4] {
    let max_x = src.width().saturating_sub(1);
    let max_y = src.height().saturating_sub(1);
    let x = x.clamp(0.0, max_x as f64);
    let y = y.clamp(0.0, max_y as f64);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = src.pixel(x0, y0);
    let p10 = src.pixel(x1, y0);
    let p01 = src.pixel(x0, y1);
    let p11 = src.pixel(x1, y1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Warp the quadrilateral `corners` (`[TL, TR, BR, BL]`) of `src` onto a
/// `width` x `height` rectangle by inverse mapping.
///
/// Destination pixels whose source falls more than a pixel outside the
/// image stay transparent black.
pub fn warp_perspective(
    src: &RgbaRaster,
    corners: &[Point; 4],
    width: usize,
    height: usize,
) -> Result<RgbaRaster> {
    if src.is_empty() || width == 0 || height == 0 {
        return Err(ScanError::WarpFailed(format!(
            "cannot warp {}x{} into {}x{}",
            src.width(),
            src.height(),
            width,
            height
        )));
    }
    if !is_convex(corners) {
        return Err(ScanError::WarpFailed("degenerate corners".into()));
    }

    let dst = [
        Point::new(0.0, 0.0),
        Point::new((width - 1) as f32, 0.0),
        Point::new((width - 1) as f32, (height - 1) as f32),
        Point::new(0.0, (height - 1) as f32),
    ];
    let forward = Homography::from_points(corners, &dst)?;
    let inverse = forward.inverse()?;

    let x_range = -SAMPLE_MARGIN..=(src.width() - 1) as f64 + SAMPLE_MARGIN;
    let y_range = -SAMPLE_MARGIN..=(src.height() - 1) as f64 + SAMPLE_MARGIN;
    let mut out = RgbaRaster::new(width, height);

    out.as_bytes_mut()
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let Some((sx, sy)) = inverse.apply_xy(x as f64, y as f64) else {
                    continue;
                };
                if !x_range.contains(&sx) || !y_range.contains(&sy) {
                    continue;
                }
                let px = bilinear_sample(src, sx, sy);
                row[x * 4..x * 4 + 4].copy_from_slice(&px);
            }
        });

    Ok(out)
}

/// Rectify the detected region of `image`.
///
/// A failed perspective warp degrades to cropping the detection's bounding
/// rectangle and resizing it to the target size.
pub fn rectify(
    image: &RgbaRaster,
    detection: &DetectionResult,
    output_width: Option<u32>,
) -> Result<RectifiedCard> {
    let corners = detection
        .corners
        .ok_or_else(|| ScanError::WarpFailed("detection has no corners".into()))?;
    let ordered = landscape_corners(robust_sort_corners(corners));
    let (width, height) = target_size(&ordered, output_width);
    debug!(width, height, "rectify target size");

    match warp_perspective(image, &ordered, width, height) {
        Ok(raster) => Ok(RectifiedCard {
            raster,
            warped: true,
        }),
        Err(e) => {
            warn!(error = %e, "perspective warp failed, cropping bounding rectangle");
            let crop = image.crop(&detection.bounding_rect);
            if crop.is_empty() {
                return Err(ScanError::WarpFailed(format!("empty crop after: {}", e)));
            }
            Ok(RectifiedCard {
                raster: crop.resize(width, height),
                warped: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingRect, DetectionMethod};

    fn gradient(width: usize, height: usize) -> RgbaRaster {
        let mut raster = RgbaRaster::new(width, height);
        for y in 0..height {
            for x in 0..width {
                raster.put_pixel(x, y, [(x * 7 % 256) as u8, (y * 11 % 256) as u8, 90, 255]);
            }
        }
        raster
    }

    #[test]
    fn test_bilinear_exact_at_integers() {
        let raster = gradient(20, 15);
        for &(x, y) in &[(0usize, 0usize), (5, 7), (19, 14), (19, 0), (0, 14)] {
            assert_eq!(bilinear_sample(&raster, x as f64, y as f64), raster.pixel(x, y));
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let mut raster = RgbaRaster::new(2, 1);
        raster.put_pixel(0, 0, [0, 100, 200, 255]);
        raster.put_pixel(1, 0, [100, 200, 0, 255]);
        assert_eq!(bilinear_sample(&raster, 0.5, 0.0), [50, 150, 100, 255]);
    }

    #[test]
    fn test_target_size() {
        let corners = BoundingRect::new(0.0, 0.0, 400.0, 250.0).corners();
        assert_eq!(target_size(&corners, Some(1000)), (1000, 631));
        assert_eq!(target_size(&corners, None), (400, 252));
    }

    #[test]
    fn test_landscape_corners_rotates_portrait() {
        let portrait = BoundingRect::new(0.0, 0.0, 100.0, 160.0).corners();
        let rotated = landscape_corners(portrait);
        assert_eq!(rotated[0], portrait[1]);
        let landscape = BoundingRect::new(0.0, 0.0, 160.0, 100.0).corners();
        assert_eq!(landscape_corners(landscape), landscape);
    }

    #[test]
    fn test_identity_warp_copies_pixels() {
        let src = gradient(32, 20);
        let corners = BoundingRect::new(0.0, 0.0, 31.0, 19.0).corners();
        let out = warp_perspective(&src, &corners, 32, 20).unwrap();
        assert_eq!(out.pixel(0, 0), src.pixel(0, 0));
        assert_eq!(out.pixel(13, 9), src.pixel(13, 9));
        assert_eq!(out.pixel(31, 19), src.pixel(31, 19));
    }

    /// Deterministic offsets in `[-1, 1)`
    fn next_offset(state: &mut u64) -> f32 {
        *state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (*state >> 40) as f32 / (1u64 << 23) as f32 - 1.0
    }

    #[test]
    fn test_warp_recovers_generated_homographies() {
        let (width, height) = (120usize, 76usize);
        let dst = [
            Point::new(0.0, 0.0),
            Point::new((width - 1) as f32, 0.0),
            Point::new((width - 1) as f32, (height - 1) as f32),
            Point::new(0.0, (height - 1) as f32),
        ];
        let base = BoundingRect::new(30.0, 30.0, 180.0, 120.0).corners();
        let mut state = 0x5eed_u64;

        for _ in 0..5 {
            let quad = base.map(|p| {
                let dx = next_offset(&mut state) * 18.0;
                let dy = next_offset(&mut state) * 18.0;
                Point::new(p.x + dx, p.y + dy)
            });
            let forward = Homography::from_points(&quad, &dst).unwrap();

            // Each source pixel inside the quad encodes its card coordinates
            let mut src = RgbaRaster::filled(240, 180, [0, 0, 0, 255]);
            for y in 0..180 {
                for x in 0..240 {
                    let (u, v) = forward.apply_xy(x as f64, y as f64).unwrap();
                    if (0.0..=(width - 1) as f64).contains(&u) && (0.0..=(height - 1) as f64).contains(&v) {
                        let r = (u * 255.0 / (width - 1) as f64).round() as u8;
                        let g = (v * 255.0 / (height - 1) as f64).round() as u8;
                        src.put_pixel(x, y, [r, g, 200, 255]);
                    }
                }
            }

            let inverse = forward.inverse().unwrap();
            for (corner, target) in quad.iter().zip(dst.iter()) {
                let back = inverse.apply(target).unwrap();
                assert!(back.distance(corner) < 0.5, "corner {:?} recovered as {:?}", corner, back);
            }

            let out = warp_perspective(&src, &quad, width, height).unwrap();
            for v in (3..height - 3).step_by(7) {
                for u in (3..width - 3).step_by(9) {
                    let px = out.pixel(u, v);
                    let du = px[0] as f32 * (width - 1) as f32 / 255.0;
                    let dv = px[1] as f32 * (height - 1) as f32 / 255.0;
                    assert!(
                        (du - u as f32).abs() < 1.0 && (dv - v as f32).abs() < 1.0,
                        "({}, {}) decoded as ({}, {}) for {:?}",
                        u,
                        v,
                        du,
                        dv,
                        quad
                    );
                    assert_eq!(px[2], 200);
                }
            }
        }
    }

    #[test]
    fn test_warp_rejects_degenerate_corners() {
        let src = gradient(32, 20);
        let c = BoundingRect::new(2.0, 2.0, 20.0, 10.0).corners();
        let bow_tie = [c[0], c[2], c[1], c[3]];
        assert!(matches!(
            warp_perspective(&src, &bow_tie, 10, 10),
            Err(ScanError::WarpFailed(_))
        ));
    }

    #[test]
    fn test_rectify_falls_back_to_crop() {
        let src = gradient(64, 48);
        // Collinear corners cannot be warped but still have a bounding box
        let rect = BoundingRect::new(10.0, 10.0, 30.0, 20.0);
        let mut detection =
            DetectionResult::detected(rect.corners(), 0.5, DetectionMethod::EdgeBoundary, 64, 48);
        detection.corners = Some([
            Point::new(10.0, 10.0),
            Point::new(25.0, 20.0),
            Point::new(40.0, 30.0),
            Point::new(10.0, 30.0),
        ]);
        let card = rectify(&src, &detection, Some(100)).unwrap();
        assert!(!card.warped);
        assert_eq!((card.raster.width(), card.raster.height()), (100, 63));
    }

    #[test]
    fn test_rectify_without_corners_fails() {
        let err = rectify(&gradient(4, 4), &DetectionResult::empty(4, 4), None).unwrap_err();
        assert!(matches!(err, ScanError::WarpFailed(_)));
    }
}
