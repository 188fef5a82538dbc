use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Broadcast hub fanning room events out to its SSE subscribers.
pub struct EventHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Per-room runtime channel: the event hub plus the gate that serializes
/// read-modify-write cycles so two handlers on the same room cannot interleave.
pub struct RoomChannel {
    hub: EventHub,
    gate: Arc<Mutex<()>>,
}

impl RoomChannel {
    fn new(capacity: usize) -> Self {
        Self {
            hub: EventHub::new(capacity),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Broadcast hub for this room's SSE stream.
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Acquire the mutation gate, holding it for the caller's whole
    /// read-modify-write cycle.
    pub async fn lock_gate(&self) -> OwnedMutexGuard<()> {
        self.gate.clone().lock_owned().await
    }
}

/// Registry of live room channels keyed by room identifier. Channels are
/// created lazily and dropped when the room is torn down.
pub struct RoomChannels {
    channels: DashMap<Uuid, Arc<RoomChannel>>,
    capacity: usize,
}

impl RoomChannels {
    /// Build an empty registry; `capacity` sizes each room's broadcast buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Channel for `room_id`, created on first use.
    pub fn channel(&self, room_id: Uuid) -> Arc<RoomChannel> {
        self.channels
            .entry(room_id)
            .or_insert_with(|| Arc::new(RoomChannel::new(self.capacity)))
            .clone()
    }

    /// Drop the channel of a torn-down room, disconnecting its subscribers.
    pub fn remove(&self, room_id: Uuid) {
        self.channels.remove(&room_id);
    }
}
