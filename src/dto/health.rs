//! Liveness payload of the party service.

use serde::Serialize;
use utoipa::ToSchema;

const STATUS_OK: &str = "ok";
const STATUS_DEGRADED: &str = "degraded";

/// Body of `GET /healthcheck`. The route itself always answers 200.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"ok"` while parties are served, `"degraded"` while the party store is unreachable
    /// and party operations answer 503.
    pub status: String,
}

impl HealthResponse {
    /// Party store reachable.
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK.into(),
        }
    }

    /// No party store is connected, or its last health check failed.
    pub fn degraded() -> Self {
        Self {
            status: STATUS_DEGRADED.into(),
        }
    }

    /// Payload for the shared degraded flag.
    pub fn from_degraded_flag(degraded: bool) -> Self {
        if degraded { Self::degraded() } else { Self::ok() }
    }
}
