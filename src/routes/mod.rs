use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod room;
pub mod sse;

/// Assemble the full route tree and bind the shared state.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(health::router())
        .merge(room::router())
        .merge(game::router())
        .merge(sse::router())
        .merge(docs::router(state.clone()))
        .with_state(state)
}
