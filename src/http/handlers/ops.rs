use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let coordination_ok = state.coordination.ping().await.is_ok();
    let decision = state.monitor.current_decision();

    let status = if coordination_ok {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": coordination_ok,
            "coordination": coordination_ok,
            "routing_decision": decision,
            "instance_id": state.monitor.instance_id(),
        })),
    )
        .into_response()
}

pub async fn liveness() -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(serde_json::json!({"alive": true}))).into_response()
}
