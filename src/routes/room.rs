use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    dto::room::{
        CreateRoomRequest, JoinRoomRequest, LeaveRoomRequest, RoomListItem,
        RoomMembershipResponse, RoomSnapshot, StartGameRequest,
    },
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes handling the room lifecycle: creation, membership, and teardown.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/{code}", get(get_room).delete(close_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/leave", post(leave_room))
        .route("/rooms/{code}/start", post(start_game))
}

/// Open a new room and seat the requesting player as host.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "room",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomMembershipResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoomRequest>>,
) -> Result<Json<RoomMembershipResponse>, AppError> {
    let response = room_service::create_room(&state, payload).await?;
    Ok(Json(response))
}

/// List all rooms known to the backend.
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "room",
    responses(
        (status = 200, description = "Known rooms", body = [RoomListItem])
    )
)]
pub async fn list_rooms(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoomListItem>>, AppError> {
    let rooms = room_service::list_rooms(&state).await?;
    Ok(Json(rooms))
}

/// Fetch the public view of a room.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "room",
    params(("code" = String, Path, description = "Join code of the room")),
    responses(
        (status = 200, description = "Room state", body = RoomSnapshot),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = room_service::get_room(&state, &code).await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize, IntoParams)]
/// Query identifying the player requesting the room teardown.
pub struct CloseRoomQuery {
    /// Identifier of the requesting player; any member once the game has
    /// finished, the host otherwise.
    pub player_id: Uuid,
}

/// Tear a room down. Any player may clean up a finished room; before that
/// only the host may close it.
#[utoipa::path(
    delete,
    path = "/rooms/{code}",
    tag = "room",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        CloseRoomQuery
    ),
    responses(
        (status = 204, description = "Room closed"),
        (status = 401, description = "Requester may not close the room yet"),
        (status = 404, description = "Room or player not found")
    )
)]
pub async fn close_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<CloseRoomQuery>,
) -> Result<StatusCode, AppError> {
    room_service::close_room(&state, &code, query.player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Join an existing lobby.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "room",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined the room", body = RoomMembershipResponse),
        (status = 404, description = "Room not found"),
        (status = 409, description = "The game has already started")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRoomRequest>>,
) -> Result<Json<RoomMembershipResponse>, AppError> {
    let response = room_service::join_room(&state, &code, payload).await?;
    Ok(Json(response))
}

/// Leave a room, repairing the round and migrating the host as needed.
#[utoipa::path(
    post,
    path = "/rooms/{code}/leave",
    tag = "room",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = LeaveRoomRequest,
    responses(
        (status = 204, description = "Left the room"),
        (status = 404, description = "Room or player not found")
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<LeaveRoomRequest>,
) -> Result<StatusCode, AppError> {
    room_service::leave_room(&state, &code, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start the game with a generated board. Host only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/start",
    tag = "room",
    params(("code" = String, Path, description = "Join code of the room")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Game started", body = RoomSnapshot),
        (status = 401, description = "Requester is not the host"),
        (status = 409, description = "The game has already started")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<StartGameRequest>>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = room_service::start_game(&state, &code, payload).await?;
    Ok(Json(snapshot))
}
