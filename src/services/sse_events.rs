use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        room::{PlayerSummary, RoomSnapshot},
        sse::{
            HostMigratedEvent, PlayerJoinedEvent, PlayerLeftEvent, RoomChangedEvent,
            RoomClosedEvent, ServerEvent,
        },
    },
    state::events::RoomChannel,
};

const EVENT_ROOM_CHANGED: &str = "room.changed";
const EVENT_PLAYER_JOINED: &str = "player.joined";
const EVENT_PLAYER_LEFT: &str = "player.left";
const EVENT_HOST_MIGRATED: &str = "host.migrated";
const EVENT_ROOM_CLOSED: &str = "room.closed";

/// Broadcast the full room state after a phase, turn, or score change.
pub fn broadcast_room_changed(channel: &RoomChannel, snapshot: RoomSnapshot) {
    send_event(channel, EVENT_ROOM_CHANGED, &RoomChangedEvent(snapshot));
}

/// Broadcast that a player joined the room.
pub fn broadcast_player_joined(channel: &RoomChannel, player: PlayerSummary) {
    send_event(channel, EVENT_PLAYER_JOINED, &PlayerJoinedEvent { player });
}

/// Broadcast that a player left or disconnected.
pub fn broadcast_player_left(channel: &RoomChannel, player_id: Uuid, name: String) {
    send_event(channel, EVENT_PLAYER_LEFT, &PlayerLeftEvent { player_id, name });
}

/// Broadcast that the host role moved to another player.
pub fn broadcast_host_migrated(channel: &RoomChannel, host_id: Uuid) {
    send_event(channel, EVENT_HOST_MIGRATED, &HostMigratedEvent { host_id });
}

/// Broadcast that the room is being torn down.
pub fn broadcast_room_closed(channel: &RoomChannel, code: &str) {
    send_event(
        channel,
        EVENT_ROOM_CLOSED,
        &RoomClosedEvent {
            code: code.to_string(),
        },
    );
}

fn send_event(channel: &RoomChannel, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => channel.hub().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
