pub mod detection;
pub mod mask;
pub mod point;
pub mod raster;

pub use detection::{DetectionMethod, DetectionResult, QuadCandidate};
pub use mask::Mask;
pub use point::{BoundingRect, Point};
pub use raster::{GrayBuffer, RgbaRaster};
