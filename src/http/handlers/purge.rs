use crate::domain::payment::err;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Clears both upstream processors (when enabled) and then local storage.
/// Stops at the first failing step.
pub async fn purge_payments(State(state): State<AppState>) -> impl IntoResponse {
    if state.purge_processors {
        for client in [&state.default_client, &state.fallback_client] {
            if let Err(e) = client.purge_payments().await {
                let processor = client.processing_type();
                tracing::error!(%processor, "processor purge failed: {}", e);
                return (
                    StatusCode::BAD_GATEWAY,
                    Json(err("PURGE_FAILED", &format!("failed to purge {} processor: {}", processor, e))),
                )
                    .into_response();
            }
        }
    }

    if let Err(e) = state.store.purge_payments().await {
        tracing::error!("storage purge failed: {}", e);
        return (
            StatusCode::BAD_GATEWAY,
            Json(err("PURGE_FAILED", &format!("failed to purge storage: {}", e))),
        )
            .into_response();
    }

    tracing::info!("payments purged");
    (StatusCode::OK, Json(serde_json::json!({"message": "payments purged"}))).into_response()
}
