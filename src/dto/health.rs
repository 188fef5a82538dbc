use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status, "ok" or "degraded".
    pub status: String,
    /// Whether the storage backend is currently reachable.
    pub storage_connected: bool,
}

impl HealthResponse {
    /// Health response for a fully operational backend.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            storage_connected: true,
        }
    }

    /// Health response while running without a storage connection.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            storage_connected: false,
        }
    }
}
