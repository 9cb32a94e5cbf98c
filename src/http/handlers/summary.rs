use crate::domain::payment::err;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Unparsable bounds are treated as absent rather than rejected.
pub fn parse_bound(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
}

pub async fn payments_summary(State(state): State<AppState>, Query(q): Query<SummaryQuery>) -> impl IntoResponse {
    let from = parse_bound(q.from.as_deref());
    let to = parse_bound(q.to.as_deref());

    match state.store.payments_summary(from, to).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!("payments summary failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(err("SUMMARY_FAILED", "could not compute payments summary")),
            )
                .into_response()
        }
    }
}
