//! Spherical web-Mercator projection into the base tile pixel grid.
//!
//! At zoom 0 the whole world is one 256x256 tile: longitude -180 maps to
//! x = 0, longitude 180 to x = 256, and the equator sits at y = 128 with y
//! growing southwards. Zoom level z scales these coordinates by 2^z.
//!
//! No guard is applied near the poles: |lat| = 90 yields an infinite y.
//! Weather rasters stay well inside the populated latitude band.

use std::f64::consts::PI;

use overlay_common::LatLon;
use serde::{Deserialize, Serialize};

/// Edge length of a base tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// A position in the zoom-0 pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Project a geographic position into the zoom-0 pixel grid.
///
/// `x = (lon + 180) / 360 * 256`,
/// `y = (0.5 - ln((1 + sin φ) / (1 - sin φ)) / 4π) * 256`.
pub fn to_pixel(point: LatLon) -> PixelPoint {
    let sin_lat = (point.lat * PI / 180.0).sin();
    let x = (point.lon + 180.0) / 360.0 * TILE_SIZE;
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * TILE_SIZE;
    PixelPoint { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_origin_is_tile_center() {
        let p = to_pixel(LatLon::new(0.0, 0.0));
        assert!((p.x - 128.0).abs() < EPSILON);
        assert!((p.y - 128.0).abs() < EPSILON);
    }

    #[test]
    fn test_longitude_edges() {
        assert!(to_pixel(LatLon::new(0.0, -180.0)).x.abs() < EPSILON);
        assert!((to_pixel(LatLon::new(0.0, 180.0)).x - 256.0).abs() < EPSILON);
    }

    #[test]
    fn test_web_mercator_latitude_limit_maps_to_tile_edge() {
        // 85.0511° is where the square web-Mercator world ends.
        let max_lat = (PI.sinh()).atan().to_degrees();
        let top = to_pixel(LatLon::new(max_lat, 0.0));
        let bottom = to_pixel(LatLon::new(-max_lat, 0.0));
        assert!(top.y.abs() < 1e-6);
        assert!((bottom.y - 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_north_is_up() {
        let north = to_pixel(LatLon::new(47.0, 9.0));
        let south = to_pixel(LatLon::new(36.0, 9.0));
        assert!(north.y < south.y);
    }
}
