use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::{
        game::{
            AnswerRequest, ContinueRequest, FinalAnswerRequest, FinalRevealRequest,
            SelectClueRequest, SkipClueRequest, WagerRequest,
        },
        room::RoomSnapshot,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes handling round actions on a running game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/select", post(select_clue))
        .route("/rooms/{code}/answer", post(submit_answer))
        .route("/rooms/{code}/skip", post(skip_clue))
        .route("/rooms/{code}/continue", post(continue_round))
        .route("/rooms/{code}/wager", post(place_wager))
        .route("/rooms/{code}/final-answer", post(submit_final_answer))
        .route("/rooms/{code}/final-reveal", post(reveal_final))
}

/// The turn player picks a clue to reveal.
#[utoipa::path(
    post,
    path = "/rooms/{code}/select",
    tag = "game",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = SelectClueRequest,
    responses(
        (status = 200, description = "Clue selected", body = RoomSnapshot),
        (status = 401, description = "Not the turn player"),
        (status = 409, description = "Not selectable in the current phase")
    )
)]
pub async fn select_clue(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<SelectClueRequest>>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = game_service::select_clue(&state, &code, payload).await?;
    Ok(Json(snapshot))
}

/// The turn player answers the selected clue.
#[utoipa::path(
    post,
    path = "/rooms/{code}/answer",
    tag = "game",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer resolved", body = RoomSnapshot),
        (status = 401, description = "Not the turn player"),
        (status = 409, description = "No clue under adjudication")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = game_service::submit_answer(&state, &code, payload).await?;
    Ok(Json(snapshot))
}

/// The turn player skips the selected clue.
#[utoipa::path(
    post,
    path = "/rooms/{code}/skip",
    tag = "game",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = SkipClueRequest,
    responses(
        (status = 200, description = "Clue skipped", body = RoomSnapshot),
        (status = 401, description = "Not the turn player")
    )
)]
pub async fn skip_clue(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<SkipClueRequest>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = game_service::skip_clue(&state, &code, payload).await?;
    Ok(Json(snapshot))
}

/// The turn player acknowledges the reveal and returns to selection.
#[utoipa::path(
    post,
    path = "/rooms/{code}/continue",
    tag = "game",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = ContinueRequest,
    responses(
        (status = 200, description = "Next selection started", body = RoomSnapshot),
        (status = 401, description = "Not the turn player")
    )
)]
pub async fn continue_round(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<ContinueRequest>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = game_service::continue_round(&state, &code, payload).await?;
    Ok(Json(snapshot))
}

/// Place a final-round wager.
#[utoipa::path(
    post,
    path = "/rooms/{code}/wager",
    tag = "game",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = WagerRequest,
    responses(
        (status = 200, description = "Wager recorded", body = RoomSnapshot),
        (status = 400, description = "Wager out of bounds"),
        (status = 409, description = "Wager already placed")
    )
)]
pub async fn place_wager(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<WagerRequest>>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = game_service::place_wager(&state, &code, payload).await?;
    Ok(Json(snapshot))
}

/// Answer the final clue.
#[utoipa::path(
    post,
    path = "/rooms/{code}/final-answer",
    tag = "game",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = FinalAnswerRequest,
    responses(
        (status = 200, description = "Final answer recorded", body = RoomSnapshot),
        (status = 409, description = "No wager on record or already answered")
    )
)]
pub async fn submit_final_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<FinalAnswerRequest>>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = game_service::submit_final_answer(&state, &code, payload).await?;
    Ok(Json(snapshot))
}

/// Trigger the final reveal, settling all wagers.
#[utoipa::path(
    post,
    path = "/rooms/{code}/final-reveal",
    tag = "game",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = FinalRevealRequest,
    responses(
        (status = 200, description = "Scores settled, game over", body = RoomSnapshot),
        (status = 409, description = "Final outcomes are not ready to reveal")
    )
)]
pub async fn reveal_final(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<FinalRevealRequest>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = game_service::reveal_final(&state, &code, payload).await?;
    Ok(Json(snapshot))
}
