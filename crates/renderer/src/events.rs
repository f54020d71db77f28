//! Per-layer event subscriptions.

use std::collections::HashMap;
use std::fmt;

use overlay_common::{OverlayError, OverlayResult};

/// Events a layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerEvent {
    /// The shared lens changed; re-read it and redraw.
    Update,
}

impl LayerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LayerEvent::Update => "update",
        }
    }
}

impl fmt::Display for LayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(LayerEvent) + Send>;

/// Observer lists keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<LayerEvent, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.listeners.iter().map(|(k, v)| (k.name(), v.len())))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to `event`.
    pub fn on<F>(&mut self, event: LayerEvent, listener: F) -> ListenerId
    where
        F: FnMut(LayerEvent) + Send + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners
            .entry(event)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Unsubscribe `id` from `event`.
    ///
    /// Fails with [`OverlayError::UnknownEvent`] when nothing was ever
    /// registered for `event`. Returns whether the listener was found.
    pub fn off(&mut self, event: LayerEvent, id: ListenerId) -> OverlayResult<bool> {
        let list = self
            .listeners
            .get_mut(&event)
            .ok_or_else(|| OverlayError::UnknownEvent(event.name().to_string()))?;
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        Ok(list.len() != before)
    }

    /// Notify every listener of `event`, in subscription order. Returns how many ran.
    pub fn emit(&mut self, event: LayerEvent) -> usize {
        match self.listeners.get_mut(&event) {
            Some(list) => {
                for (_, listener) in list.iter_mut() {
                    listener(event);
                }
                list.len()
            }
            None => 0,
        }
    }

    pub fn listener_count(&self, event: LayerEvent) -> usize {
        self.listeners.get(&event).map_or(0, Vec::len)
    }

    /// Drop every subscription, including the record of known events.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_emit_reaches_subscribers_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for n in 0..3 {
            let order = order.clone();
            bus.on(LayerEvent::Update, move |_| order.lock().unwrap().push(n));
        }
        assert_eq!(bus.emit(LayerEvent::Update), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_off_unknown_event_fails() {
        let mut bus = EventBus::new();
        // An id from another bus; this one has never seen "update".
        let id = EventBus::new().on(LayerEvent::Update, |_| {});
        assert_eq!(bus.listener_count(LayerEvent::Update), 0);
        assert!(matches!(
            bus.off(LayerEvent::Update, id),
            Err(OverlayError::UnknownEvent(name)) if name == "update"
        ));
    }

    #[test]
    fn test_off_removes_only_that_listener() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();
        let h = hits.clone();
        let keep = bus.on(LayerEvent::Update, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = hits.clone();
        let drop_me = bus.on(LayerEvent::Update, move |_| {
            h.fetch_add(10, Ordering::SeqCst);
        });

        assert!(bus.off(LayerEvent::Update, drop_me).unwrap());
        assert!(!bus.off(LayerEvent::Update, drop_me).unwrap());
        bus.emit(LayerEvent::Update);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_ne!(keep, drop_me);
    }

    #[test]
    fn test_clear_forgets_events() {
        let mut bus = EventBus::new();
        let id = bus.on(LayerEvent::Update, |_| {});
        bus.clear();
        assert_eq!(bus.emit(LayerEvent::Update), 0);
        assert!(bus.off(LayerEvent::Update, id).is_err());
    }
}
