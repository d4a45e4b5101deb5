//! Error types for the detection and rectification pipeline.

use thiserror::Error;

/// Every failure the pipeline can report.
///
/// Geometric and detection failures are expected outcomes: the cascade
/// treats them as a signal to try the next strategy. Only input and
/// collaborator failures abort a scan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    /// The input pixels could not be decoded or have the wrong length.
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    /// No usable drawing surface for the diagnostic overlay.
    #[error("no rendering surface: {0}")]
    MissingSurface(String),

    /// No four-corner candidate survived filtering.
    #[error("no quadrilateral found")]
    NoQuadrilateral,

    /// A candidate was found but scored below the acceptance threshold.
    #[error("confidence {confidence:.3} below minimum {minimum:.3}")]
    LowConfidence {
        /// Score of the best candidate.
        confidence: f32,
        /// Threshold it had to reach.
        minimum: f32,
    },

    /// Candidate aspect ratio is outside the accepted band.
    #[error("aspect ratio {0:.3} outside accepted range")]
    InvalidAspectRatio(f32),

    /// Candidate covers too little of the image.
    #[error("area ratio {0:.3} below minimum")]
    AreaTooSmall(f32),

    /// Candidate covers too much of the image.
    #[error("area ratio {0:.3} above maximum")]
    AreaTooLarge(f32),

    /// Perspective warp could not be performed.
    #[error("perspective warp failed: {0}")]
    WarpFailed(String),

    /// The homography linear system has no unique solution.
    #[error("singular matrix (pivot magnitude {pivot:e})")]
    SingularMatrix {
        /// Magnitude of the rejected pivot or determinant.
        pivot: f64,
    },

    /// The external text-extraction collaborator failed.
    #[error("text extraction failed: {0}")]
    TextExtraction(String),
}

impl ScanError {
    /// Whether the pipeline may continue with a fallback after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ScanError::ImageDecode(_) | ScanError::MissingSurface(_) | ScanError::TextExtraction(_)
        )
    }
}

/// Alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(!ScanError::ImageDecode("bad".into()).is_recoverable());
        assert!(!ScanError::MissingSurface("none".into()).is_recoverable());
        assert!(!ScanError::TextExtraction("ocr".into()).is_recoverable());

        assert!(ScanError::NoQuadrilateral.is_recoverable());
        assert!(ScanError::AreaTooSmall(0.01).is_recoverable());
        assert!(ScanError::AreaTooLarge(0.99).is_recoverable());
        assert!(ScanError::InvalidAspectRatio(3.0).is_recoverable());
        assert!(ScanError::WarpFailed("x".into()).is_recoverable());
        assert!(ScanError::SingularMatrix { pivot: 0.0 }.is_recoverable());
        assert!(
            ScanError::LowConfidence {
                confidence: 0.1,
                minimum: 0.5
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_display() {
        let err = ScanError::LowConfidence {
            confidence: 0.25,
            minimum: 0.45,
        };
        assert_eq!(err.to_string(), "confidence 0.250 below minimum 0.450");
    }
}
