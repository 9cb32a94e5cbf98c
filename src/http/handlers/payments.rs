use crate::domain::payment::{err, validate_request, CreatePaymentRequest, Payment};
use crate::worker::intake::AdmissionError;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

pub async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(err("INVALID_BODY", &rejection.body_text())),
            )
                .into_response()
        }
    };

    if let Err(e) = validate_request(&req) {
        return (StatusCode::BAD_REQUEST, Json(e)).into_response();
    }

    let payment = Payment::received(req, Utc::now());
    let correlation_id = payment.correlation_id.clone();
    match state.intake.try_admit(payment) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::warn!(%correlation_id, "payment not admitted: {}", e);
            let code = match e {
                AdmissionError::Full => "QUEUE_FULL",
                AdmissionError::Closed => "SHUTTING_DOWN",
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(err(code, &e.to_string()))).into_response()
        }
    }
}
