//! Single-channel raster fields handed over by the raster source.

use crate::bounds::GeoBounds;
use crate::error::{OverlayError, OverlayResult};

/// A decoded single-channel raster: `height` rows of `width` samples,
/// row-major, north row first.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
    bounds: GeoBounds,
}

impl RasterField {
    /// Wrap decoded samples, checking the buffer matches the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        samples: Vec<f32>,
        bounds: GeoBounds,
    ) -> OverlayResult<Self> {
        if width == 0 || height == 0 {
            return Err(OverlayError::InvalidRaster(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let expected = width.checked_mul(height).ok_or_else(|| {
            OverlayError::InvalidRaster(format!("dimensions {}x{} overflow", width, height))
        })?;
        if samples.len() != expected {
            return Err(OverlayError::InvalidRaster(format!(
                "expected {} samples for {}x{}, got {}",
                expected,
                width,
                height,
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            samples,
            bounds,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// Sample at (col, row), or `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.samples.get(row * self.width + col).copied()
    }
}
