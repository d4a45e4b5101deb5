//! Utility functions for image processing
//!
//! This module provides helper functions for card detection and rectification:
//! - Grayscale conversion (RGBA to luminance or channel average)
//! - Separable filters (Gaussian blur, grayscale min/max and close)
//! - Geometry (homography solve, polygon area, convexity)

pub mod filter;
pub mod geometry;
pub mod grayscale;
