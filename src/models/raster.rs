/// Pixel buffers the pipeline reads and produces
use crate::error::{Result, ScanError};
use crate::models::BoundingRect;
use image::imageops::FilterType;
use image::RgbaImage;

/// Interleaved RGBA8 image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaRaster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbaRaster {
    /// Create a transparent black raster
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    /// Create a raster filled with one color
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap raw RGBA bytes, checking the length against the dimensions
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| ScanError::ImageDecode(format!("{}x{} overflows", width, height)))?;
        if data.len() != expected {
            return Err(ScanError::ImageDecode(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Take ownership of an `image` crate buffer
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width: width as usize,
            height: height as usize,
            data: image.into_raw(),
        }
    }

    /// Convert into an `image` crate buffer
    pub fn into_image(self) -> RgbaImage {
        // Length is checked on construction, so this cannot fail.
        RgbaImage::from_raw(self.width as u32, self.height as u32, self.data)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// True when the raster holds no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel at (x, y); out-of-range reads are transparent black
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let idx = (y * self.width + x) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Overwrite pixel at (x, y); out-of-range writes are ignored
    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * 4;
        self.data[idx..idx + 4].copy_from_slice(&rgba);
    }

    /// Axis-aligned crop; the rectangle is clamped to the raster
    pub fn crop(&self, rect: &BoundingRect) -> RgbaRaster {
        let r = rect.clamped(self.width as f32, self.height as f32);
        let x0 = r.x.floor() as usize;
        let y0 = r.y.floor() as usize;
        let x1 = ((r.x + r.width).ceil() as usize).min(self.width);
        let y1 = ((r.y + r.height).ceil() as usize).min(self.height);
        let w = x1.saturating_sub(x0);
        let h = y1.saturating_sub(y0);

        let mut out = RgbaRaster::new(w, h);
        for y in 0..h {
            let src = ((y0 + y) * self.width + x0) * 4;
            let dst = y * w * 4;
            out.data[dst..dst + w * 4].copy_from_slice(&self.data[src..src + w * 4]);
        }
        out
    }

    /// Resample to exactly `width` x `height` with a triangle filter
    pub fn resize(&self, width: usize, height: usize) -> RgbaRaster {
        if width == self.width && height == self.height {
            return self.clone();
        }
        if self.is_empty() {
            return RgbaRaster::new(width, height);
        }
        let image = self.clone().into_image();
        let resized = image::imageops::resize(&image, width as u32, height as u32, FilterType::Triangle);
        RgbaRaster::from_image(resized)
    }
}

/// Single-channel 8-bit image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct GrayBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayBuffer {
    /// Create a black buffer
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Wrap raw bytes; `None` if the length does not match
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at (x, y); out-of-range reads return 0
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[y * self.width + x]
    }

    /// Set value at (x, y); out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[y * self.width + x] = value;
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume into raw bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}
