//! Synthetic raster generators.
//!
//! These generators create predictable, verifiable weather-like fields so
//! tests can check encoded bytes and rendered pixels exactly.

use overlay_common::{GeoBounds, RasterField};

/// Creates a west-to-east ramp from `min` (first column) to `max` (last column).
pub fn create_ramp_grid(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let span = (width.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(min + (max - min) * col as f32 / span);
        }
    }
    data
}

/// Creates a cloud cover grid in percent.
///
/// Clear sky in the south, overcast in the north.
pub fn create_cloud_cover_grid(width: usize, height: usize) -> Vec<f32> {
    let span = (height.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let cover = 100.0 * (1.0 - row as f32 / span);
        data.extend(std::iter::repeat(cover).take(width));
    }
    data
}

/// Creates a wind speed grid in m/s.
///
/// Radial pattern: calm in the center, up to `max_speed` at the corners.
pub fn create_wind_speed_grid(width: usize, height: usize, max_speed: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let max_dist = ((center_x * center_x) + (center_y * center_y)).sqrt().max(f32::EPSILON);

    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - center_x;
            let dy = row as f32 - center_y;
            let dist = (dx * dx + dy * dy).sqrt();
            data.push(dist / max_dist * max_speed);
        }
    }
    data
}

/// Creates a sparse precipitation grid in mm/h, deterministic for a seed.
///
/// About one cell in four rains, at up to 6.4 mm/h.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let rate = if hash % 4 == 0 {
                (hash % 641) as f32 / 100.0
            } else {
                0.0
            };
            data.push(rate);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Wraps generated samples in a [`RasterField`].
///
/// # Panics
///
/// Panics if `samples` does not hold `width * height` values.
pub fn raster(width: usize, height: usize, samples: Vec<f32>, bounds: GeoBounds) -> RasterField {
    RasterField::new(width, height, samples, bounds).expect("generated raster is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_hits_both_ends() {
        let grid = create_ramp_grid(5, 2, 0.0, 30.0);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[4], 30.0);
        assert_eq!(grid[5], 0.0);
    }

    #[test]
    fn test_cloud_cover_north_is_overcast() {
        let grid = create_cloud_cover_grid(2, 3);
        assert_eq!(grid[0], 100.0);
        assert_eq!(grid[5], 0.0);
    }

    #[test]
    fn test_precipitation_is_deterministic_and_bounded() {
        let a = create_precipitation_grid(16, 16, 7);
        let b = create_precipitation_grid(16, 16, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (0.0..=6.4).contains(v)));
        assert!(a.iter().any(|v| *v == 0.0));
    }

    #[test]
    fn test_wind_speed_is_calm_in_center() {
        let grid = create_wind_speed_grid(4, 4, 20.0);
        assert_eq!(grid[2 * 4 + 2], 0.0);
        assert!(grid.iter().all(|v| (0.0..=20.0).contains(v)));
    }
}
