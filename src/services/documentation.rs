use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Room Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::room_stream,
        crate::routes::room::create_room,
        crate::routes::room::list_rooms,
        crate::routes::room::get_room,
        crate::routes::room::close_room,
        crate::routes::room::join_room,
        crate::routes::room::leave_room,
        crate::routes::room::start_game,
        crate::routes::game::select_clue,
        crate::routes::game::submit_answer,
        crate::routes::game::skip_clue,
        crate::routes::game::continue_round,
        crate::routes::game::place_wager,
        crate::routes::game::submit_final_answer,
        crate::routes::game::reveal_final,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::RoundPhaseDto,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::LeaveRoomRequest,
            crate::dto::room::StartGameRequest,
            crate::dto::room::BoardInput,
            crate::dto::room::CategoryInput,
            crate::dto::room::ClueInput,
            crate::dto::room::FinalClueInput,
            crate::dto::room::RoomStatusDto,
            crate::dto::room::PlayerSummary,
            crate::dto::room::ClueSnapshot,
            crate::dto::room::CategorySnapshot,
            crate::dto::room::FinalClueSnapshot,
            crate::dto::room::FinalWagerSnapshot,
            crate::dto::room::ClueOutcomeSnapshot,
            crate::dto::room::RoundSnapshot,
            crate::dto::room::RoomSnapshot,
            crate::dto::room::RoomMembershipResponse,
            crate::dto::room::RoomListItem,
            crate::dto::game::SelectClueRequest,
            crate::dto::game::AnswerRequest,
            crate::dto::game::SkipClueRequest,
            crate::dto::game::ContinueRequest,
            crate::dto::game::WagerRequest,
            crate::dto::game::FinalAnswerRequest,
            crate::dto::game::FinalRevealRequest,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::PlayerJoinedEvent,
            crate::dto::sse::PlayerLeftEvent,
            crate::dto::sse::HostMigratedEvent,
            crate::dto::sse::RoomClosedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Room lifecycle and membership operations"),
        (name = "game", description = "Round actions inside a running game"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
