//! Palette-based compositing of weather rasters over a web map.
//!
//! A single-channel float raster is quantized to 8-bit indices, colored
//! through a 256-entry palette, masked by a shared opacity lens and drawn
//! as a geo-registered quad for the current map view:
//! - Palette building and raster encoding
//! - View transform and lens mask
//! - Rendering contexts (with a CPU backend)
//! - Layer lifecycle, overlay registry and lens input

pub mod compositor;
pub mod encode;
pub mod events;
pub mod gpu;
pub mod layer;
pub mod lens;
pub mod lens_control;
pub mod palette;
pub mod registry;
pub mod software;
pub mod view;

pub use compositor::{build_quad, stack_frames, PaletteOverlayShader, Shader, Uniforms};
pub use encode::{encode, EncodedRaster};
pub use events::{EventBus, LayerEvent, ListenerId};
pub use gpu::{ContextProbe, ContextProbes, Frame, GpuContext, ResourceCounts};
pub use layer::{LayerOptions, LayerState, OverlayLayer, RedrawOutcome};
pub use lens::{mask_multiplier, LensState, SharedLens};
pub use lens_control::{LensConfig, LensController, LensInput};
pub use palette::{build_palette, Palette, PALETTE_SIZE};
pub use registry::{
    active_overlays, compose_active, dispatch, is_active_overlay, overlay_by_name,
    overlay_by_name_mut, redraw_active, OverlayEntry, OverlayRegistry, OverlayStack,
};
pub use software::{GpuLedger, GpuStats, SoftwareContext, SoftwareProbe};
pub use view::{MapViewport, StaticViewport, ViewTransform};
