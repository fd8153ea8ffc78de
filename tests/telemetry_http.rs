// tests/telemetry_http.rs
// Installs the global recorder, so this file holds a single test.
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use freelance_watch::telemetry::Metrics;
use tower::ServiceExt; // for `oneshot`

#[tokio::test]
async fn health_and_metrics_endpoints() {
    let telemetry = Metrics::init().expect("recorder");

    let resp = telemetry
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");

    metrics::counter!("watch_cycles_total").increment(1);
    metrics::counter!("watch_poll_ticks_total").increment(1);

    let resp = telemetry
        .router()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("watch_cycles_total"), "{text}");
    assert!(
        text.contains("# HELP watch_poll_ticks_total Scheduled poll ticks"),
        "{text}"
    );
}
