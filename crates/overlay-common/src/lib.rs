//! Common types shared across the weather overlay crates.

pub mod bounds;
pub mod catalog;
pub mod error;
pub mod raster;
pub mod scale;
pub mod style;

pub use bounds::{GeoBounds, LatLon};
pub use catalog::{OverlayCatalog, OverlayDefinition};
pub use error::{OverlayError, OverlayResult};
pub use raster::RasterField;
pub use scale::{ColorScale, FnScale, GradientScale};
pub use style::{Color, ColorStop, GradientConfig, Interpolation, OutOfRangeBehavior, Rgba};
