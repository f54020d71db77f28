//! Map projections used to geo-register overlay rasters.
//!
//! Only the spherical web-Mercator pixel grid of the base tile pyramid is
//! needed: overlays are placed in the same 256-pixel world space the base
//! map tiles use.

pub mod mercator;

pub use mercator::{to_pixel, PixelPoint, TILE_SIZE};
