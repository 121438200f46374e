use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the party store is usable, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_party_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                return HealthResponse::degraded();
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::from_degraded_flag(state.is_degraded())
}
