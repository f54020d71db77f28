//! Quantization of float rasters into 8-bit palette indices.

use overlay_common::RasterField;
use tracing::error;

/// A `width x height` single-channel 8-bit image, row-major, north row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl EncodedRaster {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Quantize one sample: `clamp(round((raw - min) / (max - min) * 255), 0, 255)`.
///
/// Rounding is half away from zero, NaN maps to 0.
#[inline]
pub fn quantize(raw: f32, min: f64, delta: f64) -> u8 {
    let v = ((raw as f64 - min) / delta * 255.0).round();
    // `as` saturates and maps NaN to 0, the clamp keeps the intent explicit.
    v.clamp(0.0, 255.0) as u8
}

/// Encode `raster` against the value range `[min, max]`.
///
/// `min == max` (or a non-finite range) is a configuration error: it is
/// logged and the result is an all-zero raster of the right size.
pub fn encode(raster: &RasterField, min: f64, max: f64) -> EncodedRaster {
    let width = raster.width();
    let height = raster.height();
    let delta = max - min;

    let data = if delta == 0.0 || !delta.is_finite() {
        error!(
            min_value = min,
            max_value = max,
            "max_value is equal to min_value, encoding an empty raster"
        );
        vec![0u8; width * height]
    } else {
        let samples = raster.samples();
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(quantize(samples[row * width + col], min, delta));
            }
        }
        data
    };

    EncodedRaster {
        width: width as u32,
        height: height as u32,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::GeoBounds;

    fn raster(width: usize, height: usize, samples: Vec<f32>) -> RasterField {
        let bounds = GeoBounds::from_corners([[45.0, 5.0], [35.0, 20.0]]).unwrap();
        RasterField::new(width, height, samples, bounds).unwrap()
    }

    #[test]
    fn test_two_by_two_scenario() {
        let encoded = encode(&raster(2, 2, vec![0.0, 10.0, 20.0, 30.0]), 0.0, 30.0);
        assert_eq!(encoded.as_bytes(), &[0, 85, 170, 255]);
        assert_eq!((encoded.width(), encoded.height()), (2, 2));
    }

    #[test]
    fn test_identity_range() {
        let samples: Vec<f32> = vec![0.0, 1.0, 127.4, 127.5, 200.0, 254.6, 255.0, 63.0];
        let encoded = encode(&raster(4, 2, samples), 0.0, 255.0);
        assert_eq!(encoded.as_bytes(), &[0, 1, 127, 128, 200, 255, 255, 63]);
    }

    #[test]
    fn test_clamps_instead_of_wrapping() {
        let encoded = encode(&raster(4, 1, vec![-50.0, 31.0, 1e9, -1e9]), 0.0, 30.0);
        assert_eq!(encoded.as_bytes(), &[0, 255, 255, 0]);
    }

    #[test]
    fn test_nan_encodes_to_zero() {
        let encoded = encode(&raster(2, 1, vec![f32::NAN, 30.0]), 0.0, 30.0);
        assert_eq!(encoded.as_bytes(), &[0, 255]);
    }

    #[test]
    fn test_inverted_range() {
        let encoded = encode(&raster(2, 1, vec![0.0, 30.0]), 30.0, 0.0);
        assert_eq!(encoded.as_bytes(), &[255, 0]);
    }

    #[test]
    fn test_degenerate_range_is_all_zero() {
        let encoded = encode(&raster(3, 1, vec![1.0, 2.0, 3.0]), 2.0, 2.0);
        assert_eq!(encoded.as_bytes(), &[0, 0, 0]);
    }
}
