/// OpenAPI documentation generation.
pub mod documentation;
/// Round operations on a running game.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Answer judgement logic.
pub mod judge;
/// Room lifecycle: creation, membership, and teardown.
pub mod room_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
