//! Tunable constants and the configuration structs seeded from them.
//!
//! All thresholds are compile-time constants. The structs exist so a caller
//! can pick a detector or switch enhancement stages per scanner without
//! touching the numbers.

/// ISO 7810 ID-1 card aspect ratio (85.60mm x 53.98mm).
pub const CARD_ASPECT_RATIO: f32 = 1.586;

// Color segmentation
pub const BRIGHT_FLOOR: u8 = 180;
pub const GOLD_RED_FLOOR: u8 = 150;
pub const GOLD_GREEN_FLOOR: u8 = 120;
pub const GOLD_BLUE_CEILING: u8 = 110;
pub const BLUE_FLOOR: u8 = 120;

// Edge detection
pub const SOBEL_THRESHOLD: f32 = 60.0;
pub const CANNY_TARGET_HEIGHT: usize = 500;
pub const CANNY_BLUR_SIGMA: f32 = 1.4;
pub const CANNY_CLOSE_RADIUS: u8 = 2;
pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Largest side processed by the contour detector before downscaling.
pub const WORKING_MAX_DIM: usize = 800;

// Contours and components
pub const CONTOUR_MIN_POINTS: usize = 20;
pub const CONTOUR_MAX_POINTS: usize = 20_000;
pub const CONTOUR_STRIDE: usize = 3;
pub const COMPONENT_MIN_PIXELS: usize = 150;
pub const COMPONENT_MIN_DENSITY: f32 = 0.35;
pub const COMPONENT_MIN_AREA_RATIO: f32 = 0.02;

// Quadrilateral acceptance
pub const MIN_AREA_RATIO: f32 = 0.05;
pub const MAX_AREA_RATIO: f32 = 0.95;
pub const MIN_ASPECT: f32 = 1.2;
pub const MAX_ASPECT: f32 = 2.1;
pub const LOOSE_MIN_ASPECT: f32 = 1.0;
pub const LOOSE_MAX_ASPECT: f32 = 2.6;
pub const MIN_CONFIDENCE: f32 = 0.45;
pub const COVERAGE_LOW: f32 = 0.10;
pub const COVERAGE_HIGH: f32 = 0.90;

// Hough
pub const HOUGH_THRESHOLDS: [u32; 8] = [200, 160, 130, 100, 80, 60, 45, 30];
pub const HOUGH_MIN_LINES: usize = 4;
pub const HOUGH_MAX_LINES: usize = 40;
pub const HOUGH_SUPPRESSION_RADIUS: u32 = 8;
pub const HOUGH_MERGE_ANGLE_DEG: f32 = 10.0;
pub const HOUGH_MERGE_RHO: f32 = 20.0;
pub const HOUGH_MIN_CROSS_ANGLE_DEG: f32 = 20.0;
pub const HOUGH_MIN_CORNER_DISTANCE: f32 = 15.0;
pub const HOUGH_MIN_AREA_RATIO: f32 = 0.10;
pub const HOUGH_MAX_CYCLES: usize = 5_000;

// Fallback strategies
pub const EDGE_BOUNDARY_PADDING: f32 = 8.0;
pub const EDGE_BOUNDARY_CONFIDENCE: f32 = 0.5;
pub const COLOR_REGION_CONFIDENCE: f32 = 0.35;
pub const COLOR_REGION_RESIZED_CONFIDENCE: f32 = 0.25;
pub const CENTERED_FRACTION: f32 = 0.7;
pub const CENTERED_PORTRAIT_FRACTION: f32 = 0.9;

// Rectification and enhancement
pub const OUTPUT_WIDTH: u32 = 1000;
pub const SHARPEN_INTENSITY: f32 = 0.5;
pub const SHARPEN_SIGMA: f32 = 1.0;
pub const CONTRAST: f32 = 1.6;
pub const CONTRAST_CENTER: f32 = 200.0;
pub const BRIGHTNESS: f32 = 5.0;
pub const THRESHOLD_SIGMA: f32 = 8.0;
pub const THRESHOLD_OFFSET: f32 = 10.0;

/// Which strategy-1 detector the scanner uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    /// Sobel edges, contour hulls and quadrilateral fitting.
    #[default]
    Contour,
    /// Canny edges, Hough lines and intersection 4-cycles.
    Hough,
}

/// Thresholds for the card color segmenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorThresholds {
    pub bright_floor: u8,
    pub gold_red_floor: u8,
    pub gold_green_floor: u8,
    pub gold_blue_ceiling: u8,
    pub blue_floor: u8,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            bright_floor: BRIGHT_FLOOR,
            gold_red_floor: GOLD_RED_FLOOR,
            gold_green_floor: GOLD_GREEN_FLOOR,
            gold_blue_ceiling: GOLD_BLUE_CEILING,
            blue_floor: BLUE_FLOOR,
        }
    }
}

/// Parameters of the blur, close, Canny chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyParams {
    pub target_height: usize,
    pub blur_sigma: f32,
    pub close_radius: u8,
    pub low: f32,
    pub high: f32,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            target_height: CANNY_TARGET_HEIGHT,
            blur_sigma: CANNY_BLUR_SIGMA,
            close_radius: CANNY_CLOSE_RADIUS,
            low: CANNY_LOW,
            high: CANNY_HIGH,
        }
    }
}

/// Parameters of the Hough line and cycle search.
#[derive(Debug, Clone, PartialEq)]
pub struct HoughParams {
    pub thresholds: Vec<u32>,
    pub min_lines: usize,
    pub max_lines: usize,
    pub suppression_radius: u32,
    pub merge_angle_deg: f32,
    pub merge_rho: f32,
    pub min_cross_angle_deg: f32,
    pub min_corner_distance: f32,
    pub min_area_ratio: f32,
    pub max_cycles: usize,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            thresholds: HOUGH_THRESHOLDS.to_vec(),
            min_lines: HOUGH_MIN_LINES,
            max_lines: HOUGH_MAX_LINES,
            suppression_radius: HOUGH_SUPPRESSION_RADIUS,
            merge_angle_deg: HOUGH_MERGE_ANGLE_DEG,
            merge_rho: HOUGH_MERGE_RHO,
            min_cross_angle_deg: HOUGH_MIN_CROSS_ANGLE_DEG,
            min_corner_distance: HOUGH_MIN_CORNER_DISTANCE,
            min_area_ratio: HOUGH_MIN_AREA_RATIO,
            max_cycles: HOUGH_MAX_CYCLES,
        }
    }
}

/// Everything the detection cascade reads.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub colors: ColorThresholds,
    pub sobel_threshold: f32,
    pub canny: CannyParams,
    pub hough: HoughParams,
    pub working_max_dim: usize,
    pub contour_min_points: usize,
    pub contour_max_points: usize,
    pub contour_stride: usize,
    pub component_min_pixels: usize,
    pub component_min_density: f32,
    pub component_min_area_ratio: f32,
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    pub aspect_band: (f32, f32),
    pub loose_aspect_band: (f32, f32),
    pub min_confidence: f32,
    pub edge_boundary_padding: f32,
    /// Use 90% of the width for portrait photos in the centered fallback.
    pub orientation_aware: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            colors: ColorThresholds::default(),
            sobel_threshold: SOBEL_THRESHOLD,
            canny: CannyParams::default(),
            hough: HoughParams::default(),
            working_max_dim: WORKING_MAX_DIM,
            contour_min_points: CONTOUR_MIN_POINTS,
            contour_max_points: CONTOUR_MAX_POINTS,
            contour_stride: CONTOUR_STRIDE,
            component_min_pixels: COMPONENT_MIN_PIXELS,
            component_min_density: COMPONENT_MIN_DENSITY,
            component_min_area_ratio: COMPONENT_MIN_AREA_RATIO,
            min_area_ratio: MIN_AREA_RATIO,
            max_area_ratio: MAX_AREA_RATIO,
            aspect_band: (MIN_ASPECT, MAX_ASPECT),
            loose_aspect_band: (LOOSE_MIN_ASPECT, LOOSE_MAX_ASPECT),
            min_confidence: MIN_CONFIDENCE,
            edge_boundary_padding: EDGE_BOUNDARY_PADDING,
            orientation_aware: true,
        }
    }
}

/// Linear contrast and brightness adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastAdjust {
    pub contrast: f32,
    pub center: f32,
    pub brightness: f32,
}

impl ContrastAdjust {
    /// Adjustment that leaves every value unchanged.
    pub const IDENTITY: ContrastAdjust = ContrastAdjust {
        contrast: 1.0,
        center: 128.0,
        brightness: 0.0,
    };
}

impl Default for ContrastAdjust {
    fn default() -> Self {
        Self {
            contrast: CONTRAST,
            center: CONTRAST_CENTER,
            brightness: BRIGHTNESS,
        }
    }
}

/// Adaptive threshold parameters for the OCR variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdOptions {
    /// Sigma of the Gaussian used for the local mean.
    pub sigma: f32,
    /// How far below the local mean a pixel must be to count as ink.
    pub offset: f32,
    /// Also require ink to be darker than the global mean.
    pub global_gate: bool,
}

impl Default for ThresholdOptions {
    fn default() -> Self {
        Self {
            sigma: THRESHOLD_SIGMA,
            offset: THRESHOLD_OFFSET,
            global_gate: true,
        }
    }
}

/// Post-processing applied to the rectified card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceOptions {
    /// Unsharp-mask intensity, `None` disables sharpening.
    pub sharpen: Option<f32>,
    pub contrast: Option<ContrastAdjust>,
    pub threshold: ThresholdOptions,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            sharpen: Some(SHARPEN_INTENSITY),
            contrast: Some(ContrastAdjust::default()),
            threshold: ThresholdOptions::default(),
        }
    }
}

/// Top-level scanner configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub detector: DetectorKind,
    pub detection: DetectorConfig,
    /// Fixed output width; `None` keeps the measured card width.
    pub output_width: Option<u32>,
    /// `None` skips enhancement entirely.
    pub enhance: Option<EnhanceOptions>,
    /// Also produce the binarized OCR variant.
    pub binarize: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            detector: DetectorKind::default(),
            detection: DetectorConfig::default(),
            output_width: Some(OUTPUT_WIDTH),
            enhance: Some(EnhanceOptions::default()),
            binarize: true,
        }
    }
}

impl ScanConfig {
    /// Default configuration with the Hough detector selected.
    pub fn hough() -> Self {
        Self {
            detector: DetectorKind::Hough,
            ..Self::default()
        }
    }
}
