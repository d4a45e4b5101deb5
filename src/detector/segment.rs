/// Color segmentation: marks pixels whose color is typical of a card surface
use crate::config::ColorThresholds;
use crate::models::mask::FOREGROUND;
use crate::models::{Mask, RgbaRaster};
use rayon::prelude::*;

/// Whether one RGB triple looks like card stock (bright, gold or blue)
#[inline]
pub fn is_card_color(r: u8, g: u8, b: u8, t: &ColorThresholds) -> bool {
    let bright = r > t.bright_floor && g > t.bright_floor && b > t.bright_floor;
    let gold = r > t.gold_red_floor && g > t.gold_green_floor && b < t.gold_blue_ceiling && r > b;
    let blue = b > t.blue_floor && b > r && b > g;
    bright || gold || blue
}

/// Classify every pixel; rows are processed in parallel
pub fn segment_card_colors(raster: &RgbaRaster, thresholds: &ColorThresholds) -> Mask {
    let width = raster.width();
    let height = raster.height();
    let mut mask = Mask::new(width, height);
    if raster.is_empty() {
        return mask;
    }
    let rgba = raster.as_bytes();

    mask.as_bytes_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let row_start = y * width * 4;
            for (x, out) in row.iter_mut().enumerate() {
                let idx = row_start + x * 4;
                if is_card_color(rgba[idx], rgba[idx + 1], rgba[idx + 2], thresholds) {
                    *out = FOREGROUND;
                }
            }
        });

    mask
}
