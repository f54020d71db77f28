//! Turns user input into lens updates.
//!
//! The controller owns the lens anchor, a geographic point, and keeps the
//! shared [`LensState`] in window coordinates for the current view. After
//! every input it dispatches [`LayerEvent::Update`] so active layers pick up
//! the change.

use overlay_common::LatLon;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::events::LayerEvent;
use crate::lens::{LensState, SharedLens};
use crate::registry::{dispatch, OverlayRegistry};
use crate::view::MapViewport;

/// Initial lens parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// Radius in pixels.
    pub radius: f32,
    /// Alpha multiplier inside the lens.
    pub strength: f32,
    /// Radius growth per wheel step.
    pub wheel_factor: f32,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            radius: 90.0,
            strength: 0.2,
            wheel_factor: 1.05,
        }
    }
}

/// Lens-related user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LensInput {
    /// Lens checkbox toggled.
    Enable(bool),
    /// Strength slider moved; clamped to [0, 1].
    Alpha(f32),
    /// Lens dragged to a new geographic point.
    DragTo(LatLon),
    /// The map finished panning.
    MoveEnd,
    /// Mouse wheel; positive `delta_y` grows the lens.
    Wheel(f64),
    /// The map finished zooming; the radius follows the zoom change.
    ZoomEnd,
}

/// Owner and only writer of the shared lens.
#[derive(Debug)]
pub struct LensController {
    lens: SharedLens,
    anchor: LatLon,
    config: LensConfig,
    previous_zoom: f64,
}

impl LensController {
    /// Place a disabled lens at `anchor` for the viewport's current state.
    pub fn new(
        lens: SharedLens,
        anchor: LatLon,
        config: LensConfig,
        viewport: &dyn MapViewport,
    ) -> Self {
        let controller = Self {
            lens,
            anchor,
            config,
            previous_zoom: viewport.zoom(),
        };
        let (x, y) = controller.window_position(viewport);
        controller.lens.update(|s| {
            *s = LensState {
                x,
                y,
                radius: config.radius,
                strength: config.strength,
                enabled: false,
            }
        });
        controller
    }

    pub fn lens(&self) -> &SharedLens {
        &self.lens
    }

    pub fn anchor(&self) -> LatLon {
        self.anchor
    }

    /// Anchor in window coordinates: origin bottom-left, `y = (height - 1) - row`.
    fn window_position(&self, viewport: &dyn MapViewport) -> (f32, f32) {
        let p = viewport.container_point(self.anchor);
        let (_, height) = viewport.canvas_size();
        (p.x as f32, (height as f64 - 1.0 - p.y) as f32)
    }

    /// Apply `input`, then notify every active layer in `registry`.
    pub fn handle<R>(
        &mut self,
        input: LensInput,
        viewport: &dyn MapViewport,
        registry: &mut R,
    ) -> LensState
    where
        R: OverlayRegistry + ?Sized,
    {
        if let LensInput::DragTo(point) = input {
            self.anchor = point;
        }
        let zoom_change = match input {
            LensInput::ZoomEnd => {
                let zoom = viewport.zoom();
                let change = zoom - self.previous_zoom;
                self.previous_zoom = zoom;
                change
            }
            _ => 0.0,
        };
        let (x, y) = self.window_position(viewport);
        let wheel_factor = self.config.wheel_factor;

        let state = self.lens.update(|s| match input {
            LensInput::Enable(enabled) => s.enabled = enabled,
            LensInput::Alpha(alpha) => {
                if alpha.is_nan() {
                    warn!("Ignoring NaN lens alpha");
                } else {
                    s.strength = alpha.clamp(0.0, 1.0);
                }
            }
            LensInput::DragTo(_) | LensInput::MoveEnd => {
                s.x = x;
                s.y = y;
            }
            LensInput::Wheel(delta_y) => {
                s.x = x;
                s.y = y;
                if delta_y > 0.0 {
                    s.radius *= wheel_factor;
                } else {
                    s.radius /= wheel_factor;
                }
            }
            LensInput::ZoomEnd => {
                s.radius *= zoom_change.exp2() as f32;
                s.x = x;
                s.y = y;
            }
        });

        debug!(input = ?input, x = state.x, y = state.y, radius = state.radius, "Lens updated");
        dispatch(registry, &[LayerEvent::Update]);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::ContextProbes;
    use crate::registry::OverlayStack;
    use crate::view::StaticViewport;

    fn viewport(zoom: f64) -> StaticViewport {
        StaticViewport::new(200, 100, zoom, LatLon::new(0.0, 0.0))
    }

    #[test]
    fn test_defaults() {
        let c = LensConfig::default();
        assert_eq!((c.radius, c.strength, c.wheel_factor), (90.0, 0.2, 1.05));
    }

    #[test]
    fn test_initial_lens_is_disabled_at_anchor() {
        let vp = viewport(0.0);
        let c = LensController::new(SharedLens::default(), LatLon::new(0.0, 0.0), LensConfig::default(), &vp);
        let s = c.lens().snapshot();
        assert!(!s.enabled);
        assert_eq!((s.x, s.y), (0.0, 99.0));
        assert_eq!(s.radius, 90.0);
    }

    #[test]
    fn test_zoom_end_scales_radius() {
        let mut registry = OverlayStack::new(ContextProbes::new(), (200, 100));
        let mut c = LensController::new(
            SharedLens::default(),
            LatLon::new(0.0, 0.0),
            LensConfig::default(),
            &viewport(3.0),
        );
        let s = c.handle(LensInput::ZoomEnd, &viewport(5.0), &mut registry);
        assert_eq!(s.radius, 360.0);
        let s = c.handle(LensInput::ZoomEnd, &viewport(4.0), &mut registry);
        assert_eq!(s.radius, 180.0);
    }

    #[test]
    fn test_alpha_is_clamped() {
        let mut registry = OverlayStack::new(ContextProbes::new(), (200, 100));
        let vp = viewport(0.0);
        let mut c = LensController::new(SharedLens::default(), LatLon::new(0.0, 0.0), LensConfig::default(), &vp);
        assert_eq!(c.handle(LensInput::Alpha(1.7), &vp, &mut registry).strength, 1.0);
        assert_eq!(c.handle(LensInput::Alpha(-0.3), &vp, &mut registry).strength, 0.0);
        assert_eq!(c.handle(LensInput::Alpha(f32::NAN), &vp, &mut registry).strength, 0.0);
    }
}
