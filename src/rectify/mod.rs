//! Rectification stages that run after detection
//!
//! - Perspective warp to a fixed card-ratio raster
//! - Sharpening, contrast and the binarized text variant
//! - Diagnostic overlay on the source photo

/// Sharpen, contrast and adaptive threshold
pub mod enhance;
/// Detection overlay rendering
pub mod overlay;
/// Homography warp and crop fallback
pub mod warp;

pub use enhance::{adaptive_threshold, adjust_contrast, enhance, sharpen};
pub use overlay::{draw_overlay, render_overlay};
pub use warp::{RectifiedCard, rectify, warp_perspective};
