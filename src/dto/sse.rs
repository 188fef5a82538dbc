use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::room::{PlayerSummary, RoomSnapshot};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Join code of the observed room.
    pub room_code: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the room state changed (phase, turn, scores).
pub struct RoomChangedEvent(pub RoomSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a player joins the room.
pub struct PlayerJoinedEvent {
    pub player: PlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a player leaves or disconnects.
pub struct PlayerLeftEvent {
    pub player_id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when the host departs and another player inherits the role.
pub struct HostMigratedEvent {
    pub host_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted just before a room is torn down.
pub struct RoomClosedEvent {
    pub code: String,
}
