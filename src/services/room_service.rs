use std::sync::Arc;

use rand::Rng;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, models::RoomStatus},
    dto::{
        room::{
            CreateRoomRequest, JoinRoomRequest, LeaveRoomRequest, RoomListItem,
            RoomMembershipResponse, RoomSnapshot, StartGameRequest,
        },
        validation::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH, validate_room_code},
    },
    error::ServiceError,
    services::sse_events,
    state::{RoomSession, SharedState, events::RoomChannel, round::GameRound},
};

/// How many join codes are tried before giving up on room creation.
const CODE_GENERATION_ATTEMPTS: usize = 5;

/// Open a new room with the requesting player as host.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomMembershipResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let code = allocate_code(&store).await?;
    let session = RoomSession::create(code, request.host_name);
    store.save_room(session.clone().into(), None).await?;

    Ok(RoomMembershipResponse {
        player_id: session.host_id,
        room: RoomSnapshot::from(&session),
    })
}

/// Join an existing room by its code. Only lobbies accept new players.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    request: JoinRoomRequest,
) -> Result<RoomMembershipResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = load_for_update(state, &store, code).await?;

    if session.status != RoomStatus::Lobby {
        return Err(ServiceError::InvalidState(
            "the game has already started".into(),
        ));
    }
    if session.has_player_named(&request.name) {
        return Err(ServiceError::InvalidInput(format!(
            "a player named `{}` is already in the room",
            request.name
        )));
    }

    let player_id = session.add_player(request.name);
    persist_update(&store, &mut session).await?;

    let snapshot = RoomSnapshot::from(&session);
    if let Some(player) = snapshot.players.iter().find(|p| p.id == player_id) {
        sse_events::broadcast_player_joined(&channel, player.clone());
    }
    sse_events::broadcast_room_changed(&channel, snapshot.clone());

    Ok(RoomMembershipResponse {
        player_id,
        room: snapshot,
    })
}

/// Remove a player from a room, repairing the round and migrating the host as
/// needed. A host departure before the game starts, or the last player
/// leaving, tears the room down.
pub async fn leave_room(
    state: &SharedState,
    code: &str,
    request: LeaveRoomRequest,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = load_for_update(state, &store, code).await?;

    let departed = request.player_id;
    let departed_name = session
        .roster
        .get(&departed)
        .map(|player| player.name.clone())
        .ok_or_else(|| {
            ServiceError::NotFound(format!("player `{departed}` is not in room `{code}`"))
        })?;
    let was_host = departed == session.host_id;

    let Some(departed_index) = session.remove_player(departed) else {
        return Err(ServiceError::NotFound(format!(
            "player `{departed}` is not in room `{code}`"
        )));
    };

    sse_events::broadcast_player_left(&channel, departed, departed_name);

    let teardown = session.roster.is_empty() || (was_host && session.status == RoomStatus::Lobby);
    if teardown {
        sse_events::broadcast_room_closed(&channel, &session.code);
        store.delete_room(session.id).await?;
        state.drop_room_channel(session.id);
        return Ok(());
    }

    if was_host {
        if let Some(next_host) = session.earliest_joined() {
            session.host_id = next_host;
            sse_events::broadcast_host_migrated(&channel, next_host);
        }
    }

    if let Some(round) = session.round.as_mut() {
        round.handle_departure(&session.roster, departed, departed_index);
    }

    persist_update(&store, &mut session).await?;
    sse_events::broadcast_room_changed(&channel, RoomSnapshot::from(&session));
    Ok(())
}

/// Start the game: the host attaches a board and the first round begins with
/// the earliest-joined player selecting.
pub async fn start_game(
    state: &SharedState,
    code: &str,
    request: StartGameRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = load_for_update(state, &store, code).await?;

    if request.player_id != session.host_id {
        return Err(ServiceError::Unauthorized(
            "only the host can start the game".into(),
        ));
    }
    if session.status != RoomStatus::Lobby {
        return Err(ServiceError::InvalidState(
            "the game has already started".into(),
        ));
    }
    let Some(first_turn) = session.earliest_joined() else {
        return Err(ServiceError::InvalidState("the room is empty".into()));
    };

    session.round = Some(GameRound::new(
        request.board.into(),
        first_turn,
        state.config().wager_floor,
    ));
    session.status = RoomStatus::Playing;
    persist_update(&store, &mut session).await?;

    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

/// Fetch the public view of a room.
pub async fn get_room(state: &SharedState, code: &str) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    ensure_code_shape(code)?;
    let entity = store
        .find_room_by_code(code)
        .await?
        .ok_or_else(|| room_not_found(code))?;
    let session = RoomSession::from(entity);
    Ok(RoomSnapshot::from(&session))
}

/// List all rooms known to the storage backend.
pub async fn list_rooms(state: &SharedState) -> Result<Vec<RoomListItem>, ServiceError> {
    let store = state.require_game_store().await?;
    let rooms = store.list_rooms().await?;
    Ok(rooms.into_iter().map(Into::into).collect())
}

/// Tear a room down. Once the game has finished any player still in the room
/// may clean it up; before that only the host may close it.
pub async fn close_room(
    state: &SharedState,
    code: &str,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        session,
        channel,
        _gate,
    } = load_for_update(state, &store, code).await?;

    if !session.roster.contains_key(&player_id) {
        return Err(ServiceError::NotFound(format!(
            "player `{player_id}` is not in room `{code}`"
        )));
    }
    if session.status != RoomStatus::Finished && player_id != session.host_id {
        return Err(ServiceError::Unauthorized(
            "only the host can close a room before the game finishes".into(),
        ));
    }

    sse_events::broadcast_room_closed(&channel, &session.code);
    store.delete_room(session.id).await?;
    state.drop_room_channel(session.id);
    Ok(())
}

/// Pick an unused join code, trying a handful of candidates before giving up.
async fn allocate_code(store: &Arc<dyn GameStore>) -> Result<String, ServiceError> {
    for _ in 0..CODE_GENERATION_ATTEMPTS {
        let candidate = generate_code();
        if store.find_room_by_code(&candidate).await?.is_none() {
            return Ok(candidate);
        }
    }

    Err(ServiceError::InvalidState(
        "could not allocate a unique room code".into(),
    ))
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[index] as char
        })
        .collect()
}

/// A session checked out for mutation: the hydrated state, the room's event
/// channel, and the held gate that serializes writers on this instance. The
/// version compare-and-swap remains the backstop against racing writers on
/// other instances.
pub(crate) struct CheckedOutRoom {
    pub session: RoomSession,
    pub channel: Arc<RoomChannel>,
    pub _gate: OwnedMutexGuard<()>,
}

/// Resolve a room by code and lock its mutation gate, re-reading the record
/// under the gate so the session reflects the latest committed write.
pub(crate) async fn load_for_update(
    state: &SharedState,
    store: &Arc<dyn GameStore>,
    code: &str,
) -> Result<CheckedOutRoom, ServiceError> {
    ensure_code_shape(code)?;
    let entity = store
        .find_room_by_code(code)
        .await?
        .ok_or_else(|| room_not_found(code))?;
    let channel = state.room_channel(entity.id);

    let gate = channel.lock_gate().await;
    let entity = store
        .find_room(entity.id)
        .await?
        .ok_or_else(|| room_not_found(code))?;

    Ok(CheckedOutRoom {
        session: RoomSession::from(entity),
        channel,
        _gate: gate,
    })
}

/// Persist a mutated session, stating the version it was read at so a
/// concurrent write is detected instead of overwritten.
pub(crate) async fn persist_update(
    store: &Arc<dyn GameStore>,
    session: &mut RoomSession,
) -> Result<(), ServiceError> {
    let expected = session.version;
    session.touch();
    store
        .save_room(session.clone().into(), Some(expected))
        .await?;
    Ok(())
}

fn room_not_found(code: &str) -> ServiceError {
    ServiceError::NotFound(format!("room `{code}` not found"))
}

/// Reject malformed join codes before any storage round-trip.
fn ensure_code_shape(code: &str) -> Result<(), ServiceError> {
    validate_room_code(code)
        .map_err(|_| ServiceError::InvalidInput(format!("`{code}` is not a valid room code")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::memory::MemoryGameStore,
        dto::{
            game::{
                AnswerRequest, ContinueRequest, FinalAnswerRequest, FinalRevealRequest,
                SelectClueRequest, WagerRequest,
            },
            room::{BoardInput, CLUE_VALUES, CategoryInput, ClueInput, FinalClueInput,
                RoomStatusDto},
        },
        services::game_service,
        state::AppState,
    };

    async fn state_with_memory_store() -> SharedState {
        let state = AppState::new(AppConfig {
            wager_floor: 1_000,
            judge_url: None,
        });
        state
            .install_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state
    }

    fn board_input() -> BoardInput {
        BoardInput {
            categories: (0..5)
                .map(|c| CategoryInput {
                    title: format!("category {c}"),
                    clues: CLUE_VALUES
                        .iter()
                        .map(|&value| ClueInput {
                            id: format!("c{c}-{value}"),
                            question: "q".into(),
                            answer: "a".into(),
                            value,
                            source_snippet: None,
                        })
                        .collect(),
                })
                .collect(),
            final_clue: FinalClueInput {
                category: "final".into(),
                question: "fq".into(),
                answer: "fa".into(),
            },
        }
    }

    #[tokio::test]
    async fn room_lifecycle_from_lobby_to_playing() {
        let state = state_with_memory_store().await;
        let created = create_room(
            &state,
            CreateRoomRequest {
                host_name: "host".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code.clone();

        let joined = join_room(
            &state,
            &code,
            JoinRoomRequest {
                name: "guest".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(joined.room.players.len(), 2);

        let err = join_room(
            &state,
            &code,
            JoinRoomRequest {
                name: "guest".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = start_game(
            &state,
            &code,
            StartGameRequest {
                player_id: joined.player_id,
                board: board_input(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let snapshot = start_game(
            &state,
            &code,
            StartGameRequest {
                player_id: created.player_id,
                board: board_input(),
            },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.status, RoomStatusDto::Playing);
        assert_eq!(
            snapshot.round.unwrap().turn_player_id,
            Some(created.player_id)
        );

        let err = join_room(&state, &code, JoinRoomRequest { name: "late".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn answers_are_judged_scored_and_persisted() {
        let state = state_with_memory_store().await;
        let created = create_room(
            &state,
            CreateRoomRequest {
                host_name: "host".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code.clone();
        start_game(
            &state,
            &code,
            StartGameRequest {
                player_id: created.player_id,
                board: board_input(),
            },
        )
        .await
        .unwrap();

        game_service::select_clue(
            &state,
            &code,
            SelectClueRequest {
                player_id: created.player_id,
                clue_id: "c0-200".into(),
            },
        )
        .await
        .unwrap();
        let snapshot = game_service::submit_answer(
            &state,
            &code,
            AnswerRequest {
                player_id: created.player_id,
                answer: "a".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(snapshot.players[0].score, 200);

        let reread = get_room(&state, &code).await.unwrap();
        assert_eq!(reread.players[0].score, 200);
        assert!(reread.round.unwrap().last_result.unwrap().is_correct);
    }

    #[tokio::test]
    async fn finished_rooms_can_be_closed_by_any_player() {
        let state = state_with_memory_store().await;
        let created = create_room(
            &state,
            CreateRoomRequest {
                host_name: "host".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code.clone();
        let host = created.player_id;
        let guest = join_room(
            &state,
            &code,
            JoinRoomRequest {
                name: "guest".into(),
            },
        )
        .await
        .unwrap()
        .player_id;
        start_game(
            &state,
            &code,
            StartGameRequest {
                player_id: host,
                board: board_input(),
            },
        )
        .await
        .unwrap();

        let err = close_room(&state, &code, guest).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err = close_room(&state, &code, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // The host answers every clue correctly and so keeps the turn until
        // the board is cleared and the final round begins.
        for c in 0..5 {
            for value in CLUE_VALUES {
                game_service::select_clue(
                    &state,
                    &code,
                    SelectClueRequest {
                        player_id: host,
                        clue_id: format!("c{c}-{value}"),
                    },
                )
                .await
                .unwrap();
                game_service::submit_answer(
                    &state,
                    &code,
                    AnswerRequest {
                        player_id: host,
                        answer: "a".into(),
                    },
                )
                .await
                .unwrap();
                if !(c == 4 && value == 1000) {
                    game_service::continue_round(
                        &state,
                        &code,
                        ContinueRequest { player_id: host },
                    )
                    .await
                    .unwrap();
                }
            }
        }

        for player_id in [host, guest] {
            game_service::place_wager(&state, &code, WagerRequest { player_id, amount: 0 })
                .await
                .unwrap();
        }
        for player_id in [host, guest] {
            game_service::submit_final_answer(
                &state,
                &code,
                FinalAnswerRequest {
                    player_id,
                    answer: "fa".into(),
                },
            )
            .await
            .unwrap();
        }
        let snapshot =
            game_service::reveal_final(&state, &code, FinalRevealRequest { player_id: guest })
                .await
                .unwrap();
        assert_eq!(snapshot.status, RoomStatusDto::Finished);

        close_room(&state, &code, guest).await.unwrap();
        let err = get_room(&state, &code).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn host_departure_in_lobby_tears_the_room_down() {
        let state = state_with_memory_store().await;
        let created = create_room(
            &state,
            CreateRoomRequest {
                host_name: "host".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code.clone();
        join_room(
            &state,
            &code,
            JoinRoomRequest {
                name: "guest".into(),
            },
        )
        .await
        .unwrap();

        leave_room(
            &state,
            &code,
            LeaveRoomRequest {
                player_id: created.player_id,
            },
        )
        .await
        .unwrap();

        let err = get_room(&state, &code).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn host_departure_mid_game_migrates_to_earliest_joined() {
        let state = state_with_memory_store().await;
        let created = create_room(
            &state,
            CreateRoomRequest {
                host_name: "host".into(),
            },
        )
        .await
        .unwrap();
        let code = created.room.code.clone();
        let guest = join_room(
            &state,
            &code,
            JoinRoomRequest {
                name: "guest".into(),
            },
        )
        .await
        .unwrap();
        start_game(
            &state,
            &code,
            StartGameRequest {
                player_id: created.player_id,
                board: board_input(),
            },
        )
        .await
        .unwrap();

        leave_room(
            &state,
            &code,
            LeaveRoomRequest {
                player_id: created.player_id,
            },
        )
        .await
        .unwrap();

        let snapshot = get_room(&state, &code).await.unwrap();
        assert_eq!(snapshot.host_id, guest.player_id);
        assert_eq!(
            snapshot.round.unwrap().turn_player_id,
            Some(guest.player_id)
        );
    }
}
