/// Working-resolution scaling
///
/// Detection runs on a downscaled copy of large photos. One `WorkingScale`
/// value records the factor, and every geometric result is mapped back to
/// source coordinates through it before leaving the detector.
use crate::models::{DetectionResult, RgbaRaster};
use std::borrow::Cow;

/// Relationship between source and working resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingScale {
    /// Source pixels per working pixel (>= 1)
    pub factor: f32,
    /// Source width
    pub source_width: usize,
    /// Source height
    pub source_height: usize,
    /// Working width
    pub width: usize,
    /// Working height
    pub height: usize,
}

impl WorkingScale {
    fn with_factor(width: usize, height: usize, factor: f32) -> Self {
        if factor <= 1.0 {
            return Self::identity(width, height);
        }
        Self {
            factor,
            source_width: width,
            source_height: height,
            width: ((width as f32 / factor).round() as usize).max(1),
            height: ((height as f32 / factor).round() as usize).max(1),
        }
    }

    /// No scaling
    pub fn identity(width: usize, height: usize) -> Self {
        Self {
            factor: 1.0,
            source_width: width,
            source_height: height,
            width,
            height,
        }
    }

    /// Shrink so the longer side is at most `max_dim`; never upscales
    pub fn fit_max_dim(width: usize, height: usize, max_dim: usize) -> Self {
        let longest = width.max(height);
        if max_dim == 0 || longest <= max_dim {
            return Self::identity(width, height);
        }
        Self::with_factor(width, height, longest as f32 / max_dim as f32)
    }

    /// Shrink to `target_height`; never upscales
    pub fn fit_height(width: usize, height: usize, target_height: usize) -> Self {
        if target_height == 0 || height <= target_height {
            return Self::identity(width, height);
        }
        Self::with_factor(width, height, height as f32 / target_height as f32)
    }

    /// Whether any resampling happens
    pub fn is_identity(&self) -> bool {
        self.factor == 1.0
    }

    /// The raster at working resolution, borrowed when no scaling is needed
    pub fn downscale<'a>(&self, raster: &'a RgbaRaster) -> Cow<'a, RgbaRaster> {
        if self.is_identity() {
            Cow::Borrowed(raster)
        } else {
            Cow::Owned(raster.resize(self.width, self.height))
        }
    }

    /// Map a working-resolution detection back to the source image
    pub fn to_source(&self, result: &DetectionResult) -> DetectionResult {
        if self.is_identity() {
            return result.clone();
        }
        result.rescaled(self.factor, self.source_width, self.source_height)
    }
}
