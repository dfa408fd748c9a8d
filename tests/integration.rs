use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ride_tracker::api::rest::router;
use ride_tracker::models::point::GeoPoint;
use ride_tracker::state::AppState;
use ride_tracker::tracking::source::SimulatedLocationSource;
use ride_tracker::tracking::{GeoTrackingService, TrackerConfig, DEFAULT_PICKUP};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> axum::Router {
    let driver_area = GeoPoint {
        lat: 25.0697,
        lng: 121.5522,
    };
    let source = Arc::new(SimulatedLocationSource::seeded(driver_area, 42));
    let tracker = GeoTrackingService::new(source, TrackerConfig::default(), DEFAULT_PICKUP);
    router(Arc::new(AppState::new(tracker, 1024)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
    assert_eq!(body["watchers"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("active_trackings"));
}

#[tokio::test]
async fn start_tracking_returns_seeded_session() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/tracking",
            json!({ "order_id": "order-1", "driver_id": "driver-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["order_id"], "order-1");
    assert_eq!(body["driver_id"], "driver-1");
    assert_eq!(body["status"], "driver_arriving");
    assert!(body["eta_minutes"].as_u64().unwrap() >= 1);

    // Songshan Airport to Taipei Main Station is roughly 4.3 km.
    let distance = body["distance_km"].as_f64().unwrap();
    assert!((distance - 4.3).abs() < 0.5);

    let route = body["route"].as_array().unwrap();
    assert_eq!(route.len(), 3);
    assert_eq!(route[0]["lat"], body["current_position"]["location"]["lat"]);
    assert_eq!(route[2]["lat"], json!(25.0478));
    assert_eq!(route[2]["lng"], json!(121.517));
}

#[tokio::test]
async fn start_tracking_empty_order_id_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/tracking",
            json!({ "order_id": "  ", "driver_id": "driver-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_session_returns_404() {
    let app = setup();
    let response = app
        .oneshot(get_request("/tracking/no-such-order"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn started_session_is_retrievable() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tracking",
            json!({ "order_id": "order-2", "driver_id": "driver-2" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.oneshot(get_request("/tracking/order-2")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["order_id"], "order-2");
    assert_eq!(body["driver_id"], "driver-2");
}

#[tokio::test]
async fn stop_tracking_is_idempotent() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tracking",
            json!({ "order_id": "order-3", "driver_id": "driver-3" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(delete_request("/tracking/order-3"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert!(body["message"].as_str().unwrap().contains("order-3"));

    // Stopping again, and stopping an order never tracked, both succeed.
    let res = app
        .clone()
        .oneshot(delete_request("/tracking/order-3"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(delete_request("/tracking/never-tracked"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn known_status_code_updates_session_and_message() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tracking",
            json!({ "order_id": "order-4", "driver_id": "driver-4" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/tracking/order-4/status",
            json!({ "status": "driver_arrived" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Driver has arrived at the pickup point");

    let res = app.oneshot(get_request("/tracking/order-4")).await.unwrap();
    let body = body_json(res).await;
    assert_eq!(body["status"], "driver_arrived");
}

#[tokio::test]
async fn unknown_status_code_falls_back_to_generic_message() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "PATCH",
            "/tracking/order-5/status",
            json!({ "status": "foo" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Status updated");
}

#[tokio::test]
async fn driver_position_stays_in_simulated_ranges() {
    let app = setup();
    let response = app
        .oneshot(get_request("/drivers/driver-7/position"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let lat = body["location"]["lat"].as_f64().unwrap();
    let lng = body["location"]["lng"].as_f64().unwrap();
    assert!((lat - 25.0697).abs() <= 0.0005);
    assert!((lng - 121.5522).abs() <= 0.0005);

    let heading = body["heading"].as_f64().unwrap();
    assert!((0.0..360.0).contains(&heading));

    let speed = body["speed_kmh"].as_f64().unwrap();
    assert!((25.0..=45.0).contains(&speed));

    let accuracy = body["accuracy_m"].as_f64().unwrap();
    assert!((3.0..=8.0).contains(&accuracy));
}

#[tokio::test]
async fn route_endpoint_returns_three_point_polyline() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/routes",
            json!({
                "start": { "lat": 25.0697, "lng": 121.5522 },
                "end": { "lat": 25.0478, "lng": 121.517 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["lat"], json!(25.0697));
    assert_eq!(points[0]["lng"], json!(121.5522));
    assert_eq!(points[2]["lat"], json!(25.0478));
    assert_eq!(points[2]["lng"], json!(121.517));
}

#[tokio::test]
async fn route_with_invalid_coordinates_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/routes",
            json!({
                "start": { "lat": 95.0, "lng": 0.0 },
                "end": { "lat": 25.0478, "lng": 121.517 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eta_endpoint_applies_traffic_friction() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/eta",
            json!({
                "position": {
                    "location": { "lat": 25.0697, "lng": 121.5522 },
                    "heading": 180.0,
                    "speed_kmh": 30.0,
                    "accuracy_m": 5.0,
                    "recorded_at": "2024-06-01T12:00:00Z"
                },
                "destination": { "lat": 25.0478, "lng": 121.517 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    // 4.30 km at an effective 24 km/h: 10.75 minutes, rounded up.
    assert_eq!(body["minutes"], 11);
    let distance = body["distance_km"].as_f64().unwrap();
    assert!((distance - 4.3).abs() < 0.1);
}

#[tokio::test]
async fn eta_with_zero_speed_is_unprocessable() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/eta",
            json!({
                "position": {
                    "location": { "lat": 25.0697, "lng": 121.5522 },
                    "heading": null,
                    "speed_kmh": 0.0,
                    "accuracy_m": null,
                    "recorded_at": "2024-06-01T12:00:00Z"
                },
                "destination": { "lat": 25.0478, "lng": 121.517 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
