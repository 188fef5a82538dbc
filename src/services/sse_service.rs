use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::{
    dto::sse::{Handshake, ServerEvent, SystemStatus},
    error::ServiceError,
    state::SharedState,
};

const HANDSHAKE_EVENT: &str = "handshake";
const SYSTEM_STATUS_EVENT: &str = "system.status";

/// Subscribe to a room's event stream, returning the receiver together with
/// the handshake payload sent as the first event.
pub async fn subscribe_room(
    state: &SharedState,
    code: &str,
) -> Result<(broadcast::Receiver<ServerEvent>, Handshake), ServiceError> {
    let store = state.require_game_store().await?;
    let entity = store
        .find_room_by_code(code)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))?;

    let channel = state.room_channel(entity.id);
    let receiver = channel.hub().subscribe();
    let handshake = Handshake {
        room_code: entity.code,
        message: "subscribed to room events".into(),
        degraded: state.is_degraded(),
    };

    Ok((receiver, handshake))
}

/// Convert a broadcast receiver into an SSE response, sending the handshake
/// first and forwarding room events and degraded-mode transitions until the
/// client disconnects.
pub fn to_sse_stream(
    handshake: Handshake,
    mut receiver: broadcast::Receiver<ServerEvent>,
    mut degraded: watch::Receiver<bool>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let room_code = handshake.room_code.clone();

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        match ServerEvent::json(Some(HANDSHAKE_EVENT.to_string()), &handshake) {
            Ok(payload) => {
                let event = to_event(payload);
                if tx.send(Ok(event)).await.is_err() {
                    return;
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize SSE handshake"),
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
                changed = degraded.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = SystemStatus {
                        degraded: *degraded.borrow_and_update(),
                    };
                    match ServerEvent::json(Some(SYSTEM_STATUS_EVENT.to_string()), &status) {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => warn!(error = %err, "failed to serialize SSE system status"),
                    }
                }
            }
        }

        tracing::info!(room = %room_code, "room SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
