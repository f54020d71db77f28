//! Common test fixtures for overlay tests.

use overlay_common::{GeoBounds, GradientScale, LatLon, Rgba};

/// Common geographic extents as `[[north, west], [south, east]]`.
pub mod bounds {
    /// Italy and the surrounding seas, the extent of a typical regional model run.
    pub const ITALY: [[f64; 2]; 2] = [[47.0, 6.0], [36.0, 19.0]];

    /// A small box straddling the equator and the prime meridian.
    pub const EQUATORIAL: [[f64; 2]; 2] = [[10.0, -10.0], [-10.0, 10.0]];

    /// Crosses the antimeridian; the east edge is given past 180.
    pub const PACIFIC: [[f64; 2]; 2] = [[50.0, 160.0], [-50.0, 220.0]];
}

/// Catalog overlay ids.
pub mod overlays {
    pub const TOTAL_CLOUD: &str = "total_cloud";
    pub const TOTAL_PREC: &str = "total_prec";
    pub const RADAR: &str = "radar";
    pub const WIND_SPEED: &str = "wind_speed";
}

/// Builds [`GeoBounds`] from one of the [`bounds`] constants.
///
/// # Panics
///
/// Panics if the corners are invalid.
pub fn geo_bounds(corners: [[f64; 2]; 2]) -> GeoBounds {
    GeoBounds::from_corners(corners).expect("fixture bounds are valid")
}

/// North-west corner of one of the [`bounds`] constants.
pub fn north_west(corners: [[f64; 2]; 2]) -> LatLon {
    LatLon::new(corners[0][0], corners[0][1])
}

/// Opaque black at 0 to opaque white at 255, so palette entry `i` is gray `i`.
pub fn grayscale_scale() -> GradientScale {
    GradientScale::uniform(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)], 0.0, 255.0)
        .expect("grayscale stops are valid")
}

/// A single opaque color over `[min, max]`.
pub fn solid_scale(color: Rgba, min: f64, max: f64) -> GradientScale {
    GradientScale::uniform(&[color, color], min, max).expect("solid stops are valid")
}
