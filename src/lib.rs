//! card_rectify - ID card boundary detection and perspective correction
//!
//! Locates a credit-card sized document in a photo, warps it to a fronto-
//! parallel raster at the ISO ID-1 aspect ratio and prepares it for text
//! extraction. Detection always produces a usable result: when no strategy
//! finds the card, a centered guess is returned with `success == false`.
//!
//! # Example
//! ```
//! use card_rectify::{CardScanner, RgbaRaster, DetectionMethod};
//!
//! let mut photo = RgbaRaster::filled(640, 480, [20, 20, 25, 255]);
//! for y in 100..340 {
//!     for x in 120..500 {
//!         photo.put_pixel(x, y, [235, 235, 235, 255]);
//!     }
//! }
//!
//! let scanner = CardScanner::new();
//! let output = scanner.scan(&photo).unwrap();
//! assert_eq!(output.detection.method, DetectionMethod::Quadrilateral);
//! assert_eq!(output.rectified.width(), 1000);
//! assert_eq!(output.rectified.height(), 631);
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Tunable constants and configuration structs
#[allow(missing_docs)]
pub mod config;
/// Card detection (segmentation, edges, quadrilaterals, cascade)
pub mod detector;
/// Error types
pub mod error;
/// Core data structures (rasters, masks, points, detection results)
pub mod models;
/// Perspective warp, enhancement and overlay
pub mod rectify;
/// Image loading and inspection helpers for the CLI, tests and benches
pub mod tools;
/// Utility functions (grayscale, filters, geometry)
pub mod utils;
/// Image-processing capability (blur, close, Canny, Hough)
pub mod vision;

pub use config::{DetectorConfig, DetectorKind, EnhanceOptions, ScanConfig};
pub use detector::{CardDetector, ContourDetector, HoughDetector, build_detector};
pub use error::{Result, ScanError};
pub use models::{BoundingRect, DetectionMethod, DetectionResult, GrayBuffer, Mask, Point, RgbaRaster};
pub use rectify::RectifiedCard;
pub use vision::{BackendKind, Vision, VisionBackend};

use std::sync::Arc;
use tracing::{debug, instrument};

/// External text-extraction collaborator fed with the processed card
pub trait TextExtractor {
    /// Read the text on `card`; failures surface as `ScanError::TextExtraction`
    fn extract(&self, card: &RgbaRaster) -> Result<String>;
}

/// Everything a full scan produces
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutput {
    /// Where the card was found, in source coordinates
    pub detection: DetectionResult,
    /// Rectified and enhanced card
    pub rectified: RgbaRaster,
    /// Black-on-white variant for text extraction, when enabled
    pub binarized: Option<RgbaRaster>,
    /// `false` when the crop fallback replaced the perspective warp
    pub warped: bool,
}

/// Detector, vision handle and post-processing settings bundled together
pub struct CardScanner {
    config: ScanConfig,
    vision: Arc<Vision>,
    detector: Box<dyn CardDetector>,
}

impl CardScanner {
    /// Scanner with default settings
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    /// Scanner with the given settings and the default vision backend
    pub fn with_config(config: ScanConfig) -> Self {
        Self::with_vision(config, Arc::new(Vision::default()))
    }

    /// Scanner sharing an existing vision handle
    pub fn with_vision(config: ScanConfig, vision: Arc<Vision>) -> Self {
        let detector = build_detector(config.detector, config.detection.clone(), vision.clone());
        Self {
            config,
            vision,
            detector,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Vision handle used by the Hough detector
    pub fn vision(&self) -> &Arc<Vision> {
        &self.vision
    }

    /// Locate the card
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &RgbaRaster) -> DetectionResult {
        self.detector.detect(image)
    }

    /// Warp the detected region to the configured output size
    #[instrument(skip_all)]
    pub fn rectify(&self, image: &RgbaRaster, detection: &DetectionResult) -> Result<RectifiedCard> {
        rectify::rectify(image, detection, self.config.output_width)
    }

    /// Detect, rectify, enhance and optionally binarize
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn scan(&self, image: &RgbaRaster) -> Result<ScanOutput> {
        if image.is_empty() {
            return Err(ScanError::ImageDecode("image has no pixels".into()));
        }
        let detection = self.detect(image);
        let card = self.rectify(image, &detection)?;

        let rectified = match &self.config.enhance {
            Some(options) => rectify::enhance(&card.raster, options),
            None => card.raster,
        };
        let binarized = self.config.binarize.then(|| {
            let threshold = self.config.enhance.map(|e| e.threshold).unwrap_or_default();
            rectify::adaptive_threshold(&rectified, &threshold)
        });
        debug!(warped = card.warped, binarized = binarized.is_some(), "scan finished");

        Ok(ScanOutput {
            detection,
            rectified,
            binarized,
            warped: card.warped,
        })
    }

    /// Full scan followed by text extraction on the binarized card (or the
    /// rectified card when binarization is off)
    #[instrument(skip_all)]
    pub fn scan_with_extractor(
        &self,
        image: &RgbaRaster,
        extractor: &dyn TextExtractor,
    ) -> Result<(ScanOutput, String)> {
        let output = self.scan(image)?;
        let source = output.binarized.as_ref().unwrap_or(&output.rectified);
        let text = extractor.extract(source)?;
        Ok((output, text))
    }
}

impl Default for CardScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CardScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardScanner")
            .field("config", &self.config)
            .field("vision", &self.vision)
            .field("detector", &self.detector.name())
            .finish()
    }
}

/// Locate a card with default settings
pub fn detect_card(image: &RgbaRaster) -> DetectionResult {
    ContourDetector::default().detect(image)
}

/// Locate a card in raw RGBA bytes
///
/// # Arguments
/// * `rgba` - Raw RGBA bytes (4 bytes per pixel)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn detect_card_rgba(rgba: &[u8], width: usize, height: usize) -> Result<DetectionResult> {
    let raster = RgbaRaster::from_raw(rgba.to_vec(), width, height)?;
    Ok(detect_card(&raster))
}

/// Full scan with default settings
pub fn scan_card(image: &RgbaRaster) -> Result<ScanOutput> {
    CardScanner::new().scan(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl TextExtractor for Echo {
        fn extract(&self, card: &RgbaRaster) -> Result<String> {
            Ok(format!("{}x{}", card.width(), card.height()))
        }
    }

    struct Broken;

    impl TextExtractor for Broken {
        fn extract(&self, _card: &RgbaRaster) -> Result<String> {
            Err(ScanError::TextExtraction("engine offline".into()))
        }
    }

    fn software_scanner(config: ScanConfig) -> CardScanner {
        CardScanner::with_vision(config, Arc::new(Vision::software()))
    }

    #[test]
    fn test_detect_card_rgba_checks_length() {
        let err = detect_card_rgba(&[0u8; 10], 2, 2).unwrap_err();
        assert!(matches!(err, ScanError::ImageDecode(_)));
    }

    #[test]
    fn test_detect_blank_image_falls_back() {
        let result = detect_card_rgba(&vec![0u8; 64 * 48 * 4], 64, 48).unwrap();
        assert!(!result.success);
        assert_eq!(result.method, DetectionMethod::CenteredFallback);
    }

    #[test]
    fn test_scan_empty_image() {
        let err = scan_card(&RgbaRaster::new(0, 0)).unwrap_err();
        assert!(matches!(err, ScanError::ImageDecode(_)));
    }

    #[test]
    fn test_scan_without_post_processing() {
        let config = ScanConfig {
            output_width: Some(200),
            enhance: None,
            binarize: false,
            ..ScanConfig::default()
        };
        let output = software_scanner(config).scan(&RgbaRaster::filled(160, 120, [0, 0, 0, 255])).unwrap();
        assert_eq!((output.rectified.width(), output.rectified.height()), (200, 126));
        assert!(output.binarized.is_none());
        assert!(output.warped);
    }

    #[test]
    fn test_scan_with_extractor() {
        let config = ScanConfig {
            output_width: Some(100),
            ..ScanConfig::default()
        };
        let scanner = software_scanner(config);
        let image = RgbaRaster::filled(80, 60, [0, 0, 0, 255]);
        let (output, text) = scanner.scan_with_extractor(&image, &Echo).unwrap();
        assert_eq!(text, "100x63");
        assert!(output.binarized.is_some());

        let err = scanner.scan_with_extractor(&image, &Broken).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
