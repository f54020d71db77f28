//! Geographic points and raster extents.

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite, with latitude inside [-90, 90]. Longitude is unconstrained.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Geographic extent of a raster as two diagonally opposite corners.
///
/// `north_west` is the reference corner that maps to texture coordinate
/// (0, 0); `south_east` maps to (1, 1). Rows of the raster run from the
/// north-west corner's latitude towards the south-east corner's latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north_west: LatLon,
    pub south_east: LatLon,
}

impl GeoBounds {
    /// Create bounds from the reference corner and its diagonal opposite.
    pub fn new(north_west: LatLon, south_east: LatLon) -> OverlayResult<Self> {
        for (name, corner) in [("north_west", north_west), ("south_east", south_east)] {
            if !corner.is_valid() {
                return Err(OverlayError::InvalidBounds(format!(
                    "{} corner ({}, {}) must be finite with latitude in [-90, 90]",
                    name, corner.lat, corner.lon
                )));
            }
        }
        Ok(Self {
            north_west,
            south_east,
        })
    }

    /// Build bounds from `[[lat0, lon0], [lat1, lon1]]` corner pairs.
    pub fn from_corners(corners: [[f64; 2]; 2]) -> OverlayResult<Self> {
        let [[lat0, lon0], [lat1, lon1]] = corners;
        Self::new(LatLon::new(lat0, lon0), LatLon::new(lat1, lon1))
    }
}
