//! Named overlay collections.
//!
//! [`OverlayRegistry`] is the capability a map component exposes: a list of
//! named overlay layers, each flagged active when shown on the map. The free
//! functions in this module work against any registry. [`OverlayStack`] is
//! the bundled implementation, keeping its entries in stacking order.

use overlay_common::{OverlayCatalog, OverlayError, OverlayResult};
use tracing::{debug, error, info};

use crate::compositor::stack_frames;
use crate::events::LayerEvent;
use crate::gpu::{ContextProbes, Frame};
use crate::layer::{OverlayLayer, RedrawOutcome};
use crate::view::MapViewport;

/// A layer with its registry name.
#[derive(Debug)]
pub struct OverlayEntry {
    pub name: String,
    pub layer: OverlayLayer,
    /// Shown on the map.
    pub active: bool,
}

/// Overlay layers exposed by a map component, bottom to top.
pub trait OverlayRegistry {
    fn entries(&self) -> &[OverlayEntry];

    fn entries_mut(&mut self) -> &mut [OverlayEntry];
}

/// Active entries, bottom to top.
pub fn active_overlays<R>(registry: &R) -> impl Iterator<Item = &OverlayEntry>
where
    R: OverlayRegistry + ?Sized,
{
    registry.entries().iter().filter(|e| e.active)
}

/// The entry called `name`. With duplicate names the last one wins.
pub fn overlay_by_name<'a, R>(registry: &'a R, name: &str) -> Option<&'a OverlayEntry>
where
    R: OverlayRegistry + ?Sized,
{
    registry.entries().iter().rev().find(|e| e.name == name)
}

pub fn overlay_by_name_mut<'a, R>(
    registry: &'a mut R,
    name: &str,
) -> Option<&'a mut OverlayEntry>
where
    R: OverlayRegistry + ?Sized,
{
    registry.entries_mut().iter_mut().rev().find(|e| e.name == name)
}

/// Whether an overlay called `name` exists and is active.
pub fn is_active_overlay<R>(registry: &R, name: &str) -> bool
where
    R: OverlayRegistry + ?Sized,
{
    overlay_by_name(registry, name).is_some_and(|e| e.active)
}

/// Deliver each event to every active layer. Returns the number of deliveries.
pub fn dispatch<R>(registry: &mut R, events: &[LayerEvent]) -> usize
where
    R: OverlayRegistry + ?Sized,
{
    let mut delivered = 0;
    for &event in events {
        for entry in registry.entries_mut().iter_mut().filter(|e| e.active) {
            entry.layer.emit(event);
            delivered += 1;
        }
    }
    debug!(events = events.len(), delivered, "Dispatched layer events");
    delivered
}

/// Redraw every active layer. A failing layer is logged and skipped.
///
/// A layer whose context failed ([`OverlayError::is_terminal`]) is unmounted
/// and deactivated; it stays hidden until the owner activates it again.
///
/// Returns the number of layers drawn.
pub fn redraw_active<R>(registry: &mut R, viewport: &dyn MapViewport) -> usize
where
    R: OverlayRegistry + ?Sized,
{
    let mut drawn = 0;
    for entry in registry.entries_mut().iter_mut().filter(|e| e.active) {
        match entry.layer.redraw(viewport) {
            Ok(RedrawOutcome::Drawn) => drawn += 1,
            Ok(RedrawOutcome::Skipped) => {}
            Err(e) if e.is_terminal() => {
                error!(overlay = %entry.name, error = %e, "Overlay context failed, deactivating");
                entry.layer.unmount();
                entry.active = false;
            }
            Err(e) => error!(overlay = %entry.name, error = %e, "Overlay redraw failed"),
        }
    }
    drawn
}

/// Active layer surfaces stacked bottom to top.
pub fn compose_active<R>(registry: &R) -> Option<Frame>
where
    R: OverlayRegistry + ?Sized,
{
    let frames: Vec<Frame> = active_overlays(registry)
        .filter_map(|e| e.layer.read_pixels())
        .collect();
    stack_frames(&frames)
}

/// Position of `name` in `order`, -1 when absent so unlisted names stack lowest.
fn draw_rank(order: &[String], name: &str) -> i64 {
    order
        .iter()
        .position(|n| n == name)
        .map_or(-1, |i| i as i64)
}

/// Overlay layers kept in stacking order, mounted while active.
#[derive(Debug)]
pub struct OverlayStack {
    entries: Vec<OverlayEntry>,
    draw_order: Vec<String>,
    probes: ContextProbes,
    surface: (u32, u32),
}

impl OverlayRegistry for OverlayStack {
    fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    fn entries_mut(&mut self) -> &mut [OverlayEntry] {
        &mut self.entries
    }
}

impl OverlayStack {
    pub fn new(probes: ContextProbes, surface: (u32, u32)) -> Self {
        Self {
            entries: Vec::new(),
            draw_order: Vec::new(),
            probes,
            surface,
        }
    }

    /// Stack names bottom to top. Names not listed stack below all others.
    pub fn with_draw_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.draw_order = order.into_iter().map(Into::into).collect();
        self.sort();
        self
    }

    /// Use the catalog's stacking order.
    pub fn with_catalog(self, catalog: &OverlayCatalog) -> Self {
        self.with_draw_order(catalog.draw_order.iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn sort(&mut self) {
        let order = &self.draw_order;
        self.entries.sort_by_key(|e| draw_rank(order, &e.name));
    }

    /// Add `layer` as `name`, replacing an existing overlay of that name.
    ///
    /// The replaced layer is unmounted and its active flag carries over; a new
    /// name starts active. Active layers are mounted immediately.
    pub fn install(
        &mut self,
        name: impl Into<String>,
        mut layer: OverlayLayer,
    ) -> OverlayResult<()> {
        let name = name.into();
        let active = match self.remove(&name) {
            Some((_, was_active)) => was_active,
            None => true,
        };

        let mounted = if active {
            layer.mount(&self.probes, self.surface)
        } else {
            Ok(())
        };
        let active = active && mounted.is_ok();

        debug!(
            overlay = %name,
            rank = draw_rank(&self.draw_order, &name),
            active,
            "Installing overlay"
        );
        self.entries.push(OverlayEntry {
            name,
            layer,
            active,
        });
        self.sort();
        mounted
    }

    /// Show or hide an overlay, mounting or unmounting its layer.
    pub fn set_active(&mut self, name: &str, active: bool) -> OverlayResult<()> {
        let probes = &self.probes;
        let surface = self.surface;
        let entry = self
            .entries
            .iter_mut()
            .rev()
            .find(|e| e.name == name)
            .ok_or_else(|| OverlayError::OverlayNotFound(name.to_string()))?;

        if entry.active == active {
            return Ok(());
        }
        if active {
            entry.layer.mount(probes, surface)?;
        } else {
            entry.layer.unmount();
        }
        entry.active = active;
        info!(overlay = %name, active, "Overlay visibility changed");
        Ok(())
    }

    /// Take an overlay out of the stack, unmounted. Returns it with its active flag.
    pub fn remove(&mut self, name: &str) -> Option<(OverlayLayer, bool)> {
        let index = self.entries.iter().rposition(|e| e.name == name)?;
        let mut entry = self.entries.remove(index);
        entry.layer.unmount();
        Some((entry.layer, entry.active))
    }
}

impl Drop for OverlayStack {
    fn drop(&mut self) {
        for entry in &mut self.entries {
            entry.layer.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerOptions, LayerState};
    use crate::lens::SharedLens;
    use crate::software::SoftwareProbe;
    use overlay_common::{GeoBounds, RasterField};

    fn layer(name: &str) -> OverlayLayer {
        let bounds = GeoBounds::from_corners([[1.0, -1.0], [-1.0, 1.0]]).unwrap();
        let raster = RasterField::new(1, 1, vec![0.5], bounds).unwrap();
        OverlayLayer::new(name, raster, LayerOptions::default(), SharedLens::default())
    }

    fn stack() -> OverlayStack {
        OverlayStack::new(ContextProbes::new().with(SoftwareProbe::new()), (16, 16))
            .with_draw_order(["satellite", "total_cloud", "radar"])
    }

    #[test]
    fn test_entries_follow_draw_order() {
        let mut s = stack();
        s.install("radar", layer("radar")).unwrap();
        s.install("total_cloud", layer("total_cloud")).unwrap();
        s.install("custom", layer("custom")).unwrap();
        assert_eq!(s.names(), vec!["custom", "total_cloud", "radar"]);
    }

    #[test]
    fn test_install_replaces_and_keeps_active_flag() {
        let mut s = stack();
        s.install("radar", layer("radar-1")).unwrap();
        s.set_active("radar", false).unwrap();
        s.install("radar", layer("radar-2")).unwrap();

        assert_eq!(s.len(), 1);
        let entry = overlay_by_name(&s, "radar").unwrap();
        assert_eq!(entry.layer.name(), "radar-2");
        assert!(!entry.active);
        assert_eq!(entry.layer.state(), LayerState::Unmounted);
    }

    #[test]
    fn test_set_active_unknown_overlay() {
        let mut s = stack();
        assert!(matches!(
            s.set_active("missing", true),
            Err(OverlayError::OverlayNotFound(_))
        ));
    }

    #[test]
    fn test_is_active_overlay() {
        let mut s = stack();
        s.install("radar", layer("radar")).unwrap();
        assert!(is_active_overlay(&s, "radar"));
        s.set_active("radar", false).unwrap();
        assert!(!is_active_overlay(&s, "radar"));
        assert!(!is_active_overlay(&s, "missing"));
    }
}
