//! Round operations: every handler checks out the room under its mutation
//! gate, applies one state-machine action, persists with the version
//! compare-and-swap, and broadcasts the new state to the room's subscribers.

use crate::{
    dao::models::RoomStatus,
    dto::{
        game::{
            AnswerRequest, ContinueRequest, FinalAnswerRequest, FinalRevealRequest,
            SelectClueRequest, SkipClueRequest, WagerRequest,
        },
        room::RoomSnapshot,
    },
    error::ServiceError,
    services::{
        judge,
        room_service::{self, CheckedOutRoom},
        sse_events,
    },
    state::{RoomSession, SharedState},
};

/// The turn player picks a clue to reveal.
pub async fn select_clue(
    state: &SharedState,
    code: &str,
    request: SelectClueRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = room_service::load_for_update(state, &store, code).await?;

    ensure_playing(&session)?;
    let round = session
        .round
        .as_mut()
        .ok_or_else(no_round_in_progress)?;
    round.select_clue(request.player_id, &request.clue_id)?;

    room_service::persist_update(&store, &mut session).await?;
    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

/// The turn player answers the selected clue. The answer is judged against
/// the clue's canonical answer before the round resolves it.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    request: AnswerRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = room_service::load_for_update(state, &store, code).await?;

    ensure_playing(&session)?;
    let round = session
        .round
        .as_mut()
        .ok_or_else(no_round_in_progress)?;

    // Judged up front; the round itself only sees the verdict. Outside the
    // answering phase there is no selected clue and resolve_answer rejects
    // the action before the verdict matters.
    let is_correct = match round
        .selected_clue
        .as_deref()
        .and_then(|id| round.board.clue(id))
    {
        Some(clue) => {
            judge::judge_answer(state.config(), &clue.question, &clue.answer, &request.answer)
                .await
        }
        None => false,
    };

    round.resolve_answer(
        &mut session.roster,
        request.player_id,
        request.answer,
        is_correct,
    )?;

    room_service::persist_update(&store, &mut session).await?;
    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

/// The turn player skips the selected clue.
pub async fn skip_clue(
    state: &SharedState,
    code: &str,
    request: SkipClueRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = room_service::load_for_update(state, &store, code).await?;

    ensure_playing(&session)?;
    let round = session
        .round
        .as_mut()
        .ok_or_else(no_round_in_progress)?;
    round.skip_clue(request.player_id)?;

    room_service::persist_update(&store, &mut session).await?;
    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

/// The turn player acknowledges the reveal and the next selection begins.
pub async fn continue_round(
    state: &SharedState,
    code: &str,
    request: ContinueRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = room_service::load_for_update(state, &store, code).await?;

    ensure_playing(&session)?;
    let round = session
        .round
        .as_mut()
        .ok_or_else(no_round_in_progress)?;
    round.advance(&session.roster, request.player_id)?;

    room_service::persist_update(&store, &mut session).await?;
    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

/// A player places their final-round wager.
pub async fn place_wager(
    state: &SharedState,
    code: &str,
    request: WagerRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = room_service::load_for_update(state, &store, code).await?;

    ensure_playing(&session)?;
    let round = session
        .round
        .as_mut()
        .ok_or_else(no_round_in_progress)?;
    round.place_wager(&session.roster, request.player_id, request.amount)?;

    room_service::persist_update(&store, &mut session).await?;
    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

/// A player answers the final clue; the verdict is recorded on their wager.
pub async fn submit_final_answer(
    state: &SharedState,
    code: &str,
    request: FinalAnswerRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = room_service::load_for_update(state, &store, code).await?;

    ensure_playing(&session)?;
    let round = session
        .round
        .as_mut()
        .ok_or_else(no_round_in_progress)?;

    let final_clue = &round.board.final_clue;
    let is_correct = judge::judge_answer(
        state.config(),
        &final_clue.question,
        &final_clue.answer,
        &request.answer,
    )
    .await;

    round.submit_final_answer(
        &session.roster,
        request.player_id,
        request.answer,
        is_correct,
    )?;

    room_service::persist_update(&store, &mut session).await?;
    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

/// Any player triggers the final reveal, settling all wagers and finishing
/// the game.
pub async fn reveal_final(
    state: &SharedState,
    code: &str,
    request: FinalRevealRequest,
) -> Result<RoomSnapshot, ServiceError> {
    let store = state.require_game_store().await?;
    let CheckedOutRoom {
        mut session,
        channel,
        _gate,
    } = room_service::load_for_update(state, &store, code).await?;

    ensure_playing(&session)?;
    let round = session
        .round
        .as_mut()
        .ok_or_else(no_round_in_progress)?;
    round.reveal_final(&mut session.roster, request.player_id)?;
    session.status = RoomStatus::Finished;

    room_service::persist_update(&store, &mut session).await?;
    let snapshot = RoomSnapshot::from(&session);
    sse_events::broadcast_room_changed(&channel, snapshot.clone());
    Ok(snapshot)
}

fn ensure_playing(session: &RoomSession) -> Result<(), ServiceError> {
    match session.status {
        RoomStatus::Playing => Ok(()),
        RoomStatus::Lobby => Err(ServiceError::InvalidState(
            "the game has not started yet".into(),
        )),
        RoomStatus::Finished => Err(ServiceError::InvalidState(
            "the game is already over".into(),
        )),
    }
}

fn no_round_in_progress() -> ServiceError {
    ServiceError::InvalidState("no round in progress".into())
}
