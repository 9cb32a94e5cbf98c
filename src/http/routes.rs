use crate::http::handlers::{ops, payments, purge, summary};
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(payments::create_payment))
        .route("/payments-summary", get(summary::payments_summary))
        .route("/purge-payments", post(purge::purge_payments))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .with_state(state)
}
