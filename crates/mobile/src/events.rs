//! Map-view capability: the event streams a map engine emits and the camera command it
//! accepts.
//!
//! Components never register callbacks. They hold a [`Subscription`] obtained from
//! [`MapView::subscribe`] and hand it back through [`MapView::unsubscribe`] on teardown,
//! so a component that is not subscribed cannot observe events.

use std::cell::RefCell;
use std::rc::Rc;

use cimes_shared::models::Coordinate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CameraChanged,
    DeviceLocation,
}

/// Camera-change payload. Either field may be missing from a given event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraChanged {
    #[serde(default)]
    pub zoom_level: Option<f64>,
    /// `[lon, lat]`
    #[serde(default)]
    pub center_coordinate: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    #[serde(default)]
    pub coords: Option<Coordinate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    Camera(CameraChanged),
    Location(LocationUpdate),
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::Camera(_) => EventKind::CameraChanged,
            MapEvent::Location(_) => EventKind::DeviceLocation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationMode {
    FlyTo,
    EaseTo,
    MoveTo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraCommand {
    pub center: Coordinate,
    pub zoom_level: f64,
    pub animation_mode: AnimationMode,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Receiving end of one event stream.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    rx: mpsc::UnboundedReceiver<MapEvent>,
}

impl Subscription {
    pub fn new(id: SubscriptionId, kind: EventKind, rx: mpsc::UnboundedReceiver<MapEvent>) -> Self {
        Subscription { id, kind, rx }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub async fn recv(&mut self) -> Option<MapEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<MapEvent> {
        self.rx.try_recv().ok()
    }
}

/// Wait for the next event on an optional subscription.
///
/// Pends forever while the slot is empty. When the map view closes the stream the slot is
/// cleared, so a dead subscription is never polled in a loop.
pub async fn next_event(slot: &mut Option<Subscription>) -> MapEvent {
    if let Some(sub) = slot.as_mut() {
        if let Some(event) = sub.recv().await {
            return event;
        }
        tracing::debug!(kind = ?sub.kind(), "Map view closed event stream");
        *slot = None;
    }
    std::future::pending().await
}

/// The opaque map engine as seen by the coordinator.
pub trait MapView {
    fn subscribe(&mut self, kind: EventKind) -> Subscription;
    fn unsubscribe(&mut self, id: SubscriptionId);
    fn move_camera(&mut self, command: CameraCommand);
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, EventKind, mpsc::UnboundedSender<MapEvent>)>,
    commands: Vec<CameraCommand>,
}

/// In-process [`MapView`] that the platform layer feeds.
///
/// Clones share state: the session owns one clone, the platform bridge keeps another to
/// push engine events with [`MapViewHub::emit`] and to collect camera commands with
/// [`MapViewHub::take_commands`]. Single-threaded by construction.
#[derive(Debug, Clone, Default)]
pub struct MapViewHub {
    inner: Rc<RefCell<HubInner>>,
}

impl MapViewHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live subscriber of its kind. Returns how many received it.
    pub fn emit(&self, event: MapEvent) -> usize {
        let mut inner = self.inner.borrow_mut();
        let kind = event.kind();
        let mut delivered = 0;
        inner.subscribers.retain(|(_, k, tx)| {
            if *k != kind {
                return true;
            }
            match tx.send(event) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    pub fn take_commands(&self) -> Vec<CameraCommand> {
        std::mem::take(&mut self.inner.borrow_mut().commands)
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

impl MapView for MapViewHub {
    fn subscribe(&mut self, kind: EventKind) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        let (tx, rx) = mpsc::unbounded_channel();
        inner.subscribers.push((id, kind, tx));
        Subscription::new(id, kind, rx)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|(sub_id, _, _)| *sub_id != id);
    }

    fn move_camera(&mut self, command: CameraCommand) {
        self.inner.borrow_mut().commands.push(command);
    }
}
