//! Computer-vision capability used by the Hough detector.
//!
//! Blur, close, Canny and Hough line extraction sit behind the
//! [`VisionBackend`] trait. [`SoftwareBackend`] is pure Rust; with the
//! `native` feature the [`NativeBackend`] delegates to `imageproc`.
//!
//! A [`Vision`] handle is passed explicitly to whoever needs it and builds
//! its backend on first use, so a scanner that never runs the Hough
//! detector never pays for initialization.

#[cfg(feature = "native")]
mod native;
mod software;

#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use software::SoftwareBackend;

use crate::models::{GrayBuffer, Mask};
use std::sync::OnceLock;
use tracing::debug;

/// Line in normal form: `x * cos(theta) + y * sin(theta) = rho`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughLine {
    /// Signed distance from the origin in pixels
    pub rho: f32,
    /// Normal angle in degrees, `[0, 180)`
    pub theta_deg: f32,
    /// Accumulator votes, when the backend reports them
    pub votes: Option<u32>,
}

impl HoughLine {
    /// Line with a known vote count
    pub fn new(rho: f32, theta_deg: f32, votes: u32) -> Self {
        Self {
            rho,
            theta_deg,
            votes: Some(votes),
        }
    }
}

/// Image operations the Canny and Hough stages are built from
pub trait VisionBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Gaussian blur with the given sigma
    fn gaussian_blur(&self, gray: &GrayBuffer, sigma: f32) -> GrayBuffer;

    /// Grayscale morphological close with a square window of `2r + 1`
    fn morph_close(&self, gray: &GrayBuffer, radius: u8) -> GrayBuffer;

    /// Canny edge map with hysteresis thresholds `low` and `high`
    fn canny(&self, gray: &GrayBuffer, low: f32, high: f32) -> Mask;

    /// Hough lines with at least `vote_threshold` votes, non-maximum
    /// suppressed within `suppression_radius` accumulator cells
    fn hough_lines(&self, edges: &Mask, vote_threshold: u32, suppression_radius: u32)
    -> Vec<HoughLine>;
}

/// Which backend a [`Vision`] handle builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Pure Rust implementation
    Software,
    /// `imageproc`-backed implementation (feature `native`)
    Native,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "native") {
            BackendKind::Native
        } else {
            BackendKind::Software
        }
    }
}

impl BackendKind {
    fn instantiate(self) -> Box<dyn VisionBackend> {
        match self {
            BackendKind::Software => Box::new(SoftwareBackend),
            #[cfg(feature = "native")]
            BackendKind::Native => Box::new(NativeBackend),
            #[cfg(not(feature = "native"))]
            BackendKind::Native => {
                tracing::warn!("native vision backend not compiled in, using software backend");
                Box::new(SoftwareBackend)
            }
        }
    }
}

/// Lazily initialized vision capability handle
pub struct Vision {
    kind: BackendKind,
    backend: OnceLock<Box<dyn VisionBackend>>,
}

impl Vision {
    /// Handle that builds a backend of `kind` on first use
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            backend: OnceLock::new(),
        }
    }

    /// Pure Rust backend
    pub fn software() -> Self {
        Self::new(BackendKind::Software)
    }

    /// `imageproc` backend, or software when the feature is disabled
    pub fn native() -> Self {
        Self::new(BackendKind::Native)
    }

    /// Handle wrapping an already constructed backend
    pub fn with_backend(backend: Box<dyn VisionBackend>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(backend);
        Self {
            kind: BackendKind::Software,
            backend: cell,
        }
    }

    /// Whether the backend has been built yet
    pub fn is_initialized(&self) -> bool {
        self.backend.get().is_some()
    }

    /// The backend, building it on first call
    pub fn backend(&self) -> &dyn VisionBackend {
        self.backend
            .get_or_init(|| {
                let backend = self.kind.instantiate();
                debug!(backend = backend.name(), "vision backend initialized");
                backend
            })
            .as_ref()
    }
}

impl Default for Vision {
    fn default() -> Self {
        Self::new(BackendKind::default())
    }
}

impl std::fmt::Debug for Vision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vision")
            .field("kind", &self.kind)
            .field("backend", &self.backend.get().map(|b| b.name()))
            .finish()
    }
}
