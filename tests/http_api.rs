mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{harness, Harness};
use payments_router::domain::health::HealthCheck;
use payments_router::domain::summary::PaymentsSummary;
use payments_router::http::routes::router;
use payments_router::processors::mock::MockBehavior;
use payments_router::worker::intake::{intake_channel, IntakeWorkerPool};
use payments_router::worker::retry::retry_channel;
use payments_router::AppState;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct App {
    router: Router,
    shutdown: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

fn app(h: &Harness, workers: usize, capacity: usize, purge_processors: bool) -> App {
    let (retry_queue, _retry_rx) = retry_channel(100);
    let (intake, intake_rx) = intake_channel(capacity);
    let pool = IntakeWorkerPool {
        gateway: h.gateway.clone(),
        store: h.store.clone(),
        retry_queue,
        workers,
    };
    let shutdown = CancellationToken::new();
    let workers = pool.start(intake_rx, shutdown.clone());

    let state = AppState {
        intake,
        store: h.store.clone(),
        coordination: h.coordination.clone(),
        default_client: h.default.clone(),
        fallback_client: h.fallback.clone(),
        monitor: h.monitor.clone(),
        purge_processors,
    };
    App {
        router: router(state),
        shutdown,
        workers,
    }
}

async fn post_payment(router: &Router, id: &str, amount: f64) -> StatusCode {
    let body = serde_json::json!({"correlationId": id, "amount": amount}).to_string();
    let resp = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    resp.status()
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn wait_for<F: Fn() -> bool>(cond: F) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn accepted_payment_shows_up_in_the_summary() {
    let h = harness(Some(HealthCheck::healthy(50)), Some(HealthCheck::failing()));
    h.monitor.tick().await;
    let app = app(&h, 2, 10, true);

    assert_eq!(post_payment(&app.router, "abc-1", 100.00).await, StatusCode::ACCEPTED);
    wait_for(|| h.store.len() == 1).await;

    let (status, body) = get_json(&app.router, "/payments-summary").await;
    assert_eq!(status, StatusCode::OK);
    let summary: PaymentsSummary = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(summary.default.total_requests, 1);
    assert_eq!(summary.default.total_amount, 100.0);
    assert_eq!(summary.fallback.total_requests, 0);
    assert_eq!(summary.fallback.total_amount, 0.0);
    assert!(body["default"].get("totalRequests").is_some());

    app.shutdown.cancel();
}

#[tokio::test]
async fn summary_window_and_garbage_bounds() {
    let h = harness(Some(HealthCheck::healthy(50)), Some(HealthCheck::failing()));
    h.monitor.tick().await;
    let app = app(&h, 1, 10, true);

    assert_eq!(post_payment(&app.router, "w-1", 12.34).await, StatusCode::ACCEPTED);
    wait_for(|| h.store.len() == 1).await;

    let (_, body) = get_json(&app.router, "/payments-summary?from=2000-01-01T00:00:00Z&to=2000-01-02T00:00:00Z").await;
    assert_eq!(body["default"]["totalRequests"], 0);

    let (status, body) = get_json(&app.router, "/payments-summary?from=not-a-date&to=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default"]["totalRequests"], 1);
    assert_eq!(body["default"]["totalAmount"], 12.34);

    app.shutdown.cancel();
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let h = harness(Some(HealthCheck::healthy(50)), None);
    let app = app(&h, 1, 10, true);

    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments")
                .header("content-type", "application/json")
                .body(Body::from("{\"amount\": 1}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(post_payment(&app.router, "neg", -5.0).await, StatusCode::BAD_REQUEST);
    assert_eq!(post_payment(&app.router, "", 5.0).await, StatusCode::BAD_REQUEST);
    assert_eq!(post_payment(&app.router, "huge", 6.0e16).await, StatusCode::BAD_REQUEST);

    app.shutdown.cancel();
}

#[tokio::test]
async fn requests_beyond_queue_and_workers_get_503() {
    let h = harness(Some(HealthCheck::healthy(50)), Some(HealthCheck::failing()));
    h.monitor.tick().await;
    h.default.set_behavior(MockBehavior::Hold);
    let app = app(&h, 2, 3, true);

    assert_eq!(post_payment(&app.router, "q-1", 1.0).await, StatusCode::ACCEPTED);
    assert_eq!(post_payment(&app.router, "q-2", 1.0).await, StatusCode::ACCEPTED);
    wait_for(|| h.default.in_flight() == 2).await;

    for id in ["q-3", "q-4", "q-5"] {
        assert_eq!(post_payment(&app.router, id, 1.0).await, StatusCode::ACCEPTED);
    }
    assert_eq!(post_payment(&app.router, "q-6", 1.0).await, StatusCode::SERVICE_UNAVAILABLE);

    h.default.release_held();
    wait_for(|| h.store.len() == 5).await;
    assert!(h.store.get("q-6").is_none());

    app.shutdown.cancel();
    for w in app.workers {
        w.await.unwrap();
    }
}

#[tokio::test]
async fn answered_payments_survive_shutdown() {
    let h = harness(Some(HealthCheck::healthy(50)), Some(HealthCheck::failing()));
    h.monitor.tick().await;
    h.default.set_behavior(MockBehavior::Hold);
    let app = app(&h, 1, 10, true);

    assert_eq!(post_payment(&app.router, "in-flight", 1.0).await, StatusCode::ACCEPTED);
    wait_for(|| h.default.in_flight() == 1).await;
    assert_eq!(post_payment(&app.router, "queued", 2.0).await, StatusCode::ACCEPTED);

    app.shutdown.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(post_payment(&app.router, "late", 3.0).await, StatusCode::SERVICE_UNAVAILABLE);

    h.default.release_held();
    for w in app.workers {
        w.await.unwrap();
    }
    assert!(h.store.get("in-flight").is_some());
    assert!(h.store.get("queued").is_some());
    assert!(h.store.get("late").is_none());
}

#[tokio::test]
async fn purge_clears_processors_then_storage() {
    let h = harness(Some(HealthCheck::healthy(50)), Some(HealthCheck::failing()));
    h.monitor.tick().await;
    let app = app(&h, 1, 10, true);

    assert_eq!(post_payment(&app.router, "x-1", 2.0).await, StatusCode::ACCEPTED);
    wait_for(|| h.store.len() == 1).await;

    let resp = app
        .router
        .clone()
        .oneshot(Request::builder().method("POST").uri("/purge-payments").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(h.store.is_empty());
    assert_eq!(h.default.purges(), 1);
    assert_eq!(h.fallback.purges(), 1);

    app.shutdown.cancel();
}

#[tokio::test]
async fn purge_can_skip_processors() {
    let h = harness(Some(HealthCheck::healthy(50)), None);
    let app = app(&h, 1, 10, false);

    let resp = app
        .router
        .clone()
        .oneshot(Request::builder().method("POST").uri("/purge-payments").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.default.purges(), 0);

    app.shutdown.cancel();
}

#[tokio::test]
async fn ops_endpoints_report_state() {
    let h = harness(Some(HealthCheck::healthy(50)), Some(HealthCheck::failing()));
    h.monitor.tick().await;
    let app = app(&h, 1, 10, true);

    let (status, body) = get_json(&app.router, "/ops/liveness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive"], true);

    let (status, body) = get_json(&app.router, "/ops/readiness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["routing_decision"], "USE_DEFAULT");

    app.shutdown.cancel();
}
