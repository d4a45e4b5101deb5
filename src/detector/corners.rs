/// Canonical corner ordering
use crate::models::Point;
use std::cmp::Ordering;

/// Order four corners clockwise on screen starting from the one nearest
/// the image origin, i.e. `[TL, TR, BR, BL]` for an upright card.
///
/// The result does not depend on the order of the input.
pub fn robust_sort_corners(corners: [Point; 4]) -> [Point; 4] {
    let cx = corners.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = corners.iter().map(|p| p.y).sum::<f32>() / 4.0;
    let centroid = Point::new(cx, cy);

    let mut sorted = corners;
    // atan2 grows clockwise in y-down image coordinates
    sorted.sort_by(|a, b| {
        let angle_a = (a.y - cy).atan2(a.x - cx);
        let angle_b = (b.y - cy).atan2(b.x - cx);
        angle_a
            .total_cmp(&angle_b)
            .then_with(|| {
                a.distance_squared(&centroid)
                    .total_cmp(&b.distance_squared(&centroid))
            })
            .then_with(|| tie_break(a, b))
    });

    let origin = Point::new(0.0, 0.0);
    let start = (0..4)
        .min_by(|&i, &j| {
            sorted[i]
                .distance_squared(&origin)
                .total_cmp(&sorted[j].distance_squared(&origin))
                .then_with(|| tie_break(&sorted[i], &sorted[j]))
        })
        .unwrap_or(0);
    sorted.rotate_left(start);
    sorted
}

fn tie_break(a: &Point, b: &Point) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}
