//! The opacity lens: a circular screen region where overlays fade.
//!
//! One lens is shared by every active overlay. It lives behind
//! [`SharedLens`], a reference-counted handle injected into each layer.
//! Writers replace the whole tuple under a write lock, so a reader never
//! sees a half-updated position/radius/strength.

use std::sync::{Arc, RwLock};

/// Lens parameters in window coordinates (origin bottom-left, pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensState {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Alpha multiplier applied inside the lens, in [0, 1].
    pub strength: f32,
    pub enabled: bool,
}

impl Default for LensState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            radius: 0.0,
            strength: 1.0,
            enabled: false,
        }
    }
}

impl LensState {
    /// The same lens with `enabled` replaced.
    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }
}

/// Alpha multiplier of the lens at window coordinate `(fx, fy)`.
///
/// Hard-edged: `strength` strictly inside the radius, 1.0 on and beyond the
/// boundary, 1.0 everywhere when the lens is disabled.
pub fn mask_multiplier(lens: &LensState, fx: f32, fy: f32) -> f32 {
    if !lens.enabled {
        return 1.0;
    }
    let dx = fx - lens.x;
    let dy = fy - lens.y;
    if (dx * dx + dy * dy).sqrt() < lens.radius {
        lens.strength
    } else {
        1.0
    }
}

/// Reference-counted lens shared by all overlay layers.
#[derive(Debug, Clone, Default)]
pub struct SharedLens {
    inner: Arc<RwLock<LensState>>,
}

impl SharedLens {
    pub fn new(state: LensState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// A consistent copy of the current lens.
    pub fn snapshot(&self) -> LensState {
        // A poisoned lock still holds a whole LensState; writers never leave it partial.
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Mutate the lens atomically with respect to readers.
    pub fn update<F>(&self, f: F) -> LensState
    where
        F: FnOnce(&mut LensState),
    {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
        *guard
    }

    /// Number of holders of this lens.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
