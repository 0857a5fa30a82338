use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use pavepath_core::{
    Coordinate, DirectionStep, DirectionsAdapter, DrivingGeometry, Geocoder,
    RoutingProviderError, RoutingRules, SegmentEndpoints,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, state::AppState};

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate { lat, lon }
}

struct PolylineDirections;

impl DirectionsAdapter for PolylineDirections {
    fn fetch_segments(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<DrivingGeometry, RoutingProviderError> {
        let via = Coordinate {
            lat: (origin.lat + destination.lat) / 2.0,
            lon: origin.lon,
        };
        Ok(DrivingGeometry {
            segments: vec![
                SegmentEndpoints {
                    from: *origin,
                    to: via,
                },
                SegmentEndpoints {
                    from: via,
                    to: *destination,
                },
            ],
            directions: vec![DirectionStep {
                instruction: "Continue straight".to_string(),
                distance_m: 9000.0,
                duration_s: 600.0,
            }],
        })
    }
}

struct DownDirections;

impl DirectionsAdapter for DownDirections {
    fn fetch_segments(
        &self,
        _origin: &Coordinate,
        _destination: &Coordinate,
    ) -> Result<DrivingGeometry, RoutingProviderError> {
        Err(RoutingProviderError::transport("stub", "connection refused"))
    }
}

struct CountingGeocoder {
    calls: AtomicUsize,
}

impl Geocoder for CountingGeocoder {
    fn resolve(&self, address: &str) -> Result<Option<Coordinate>, RoutingProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match address {
            "Disneyland, Anaheim, CA" => Some(coord(33.8121, -117.9190)),
            _ => None,
        })
    }
}

fn setup_app(state: AppState) -> axum::Router {
    api::routes().with_state(Arc::new(state))
}

fn default_app() -> axum::Router {
    setup_app(AppState::new(RoutingRules::default()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn four_cities() -> Value {
    json!([
        {"lat": 33.8366, "lon": -117.9143},
        {"lat": 34.0522, "lon": -118.2437},
        {"lat": 33.7701, "lon": -118.1937},
        {"lat": 33.7455, "lon": -117.8677}
    ])
}

#[tokio::test]
async fn health_carries_request_id() {
    let app = default_app();

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn optimize_safe_route() {
    let app = default_app();
    let res = app
        .oneshot(post_json(
            "/v1/routes/optimize",
            json!({"waypoints": four_cities(), "mode": "safe", "seed": 42}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = read_json(res).await;
    let ordered = body["route"]["ordered_waypoints"].as_array().unwrap();
    assert_eq!(ordered.len(), 4);
    assert_eq!(ordered[0], json!({"lat": 33.8366, "lon": -117.9143}));
    assert_eq!(body["route"]["segments"].as_array().unwrap().len(), 3);
    assert_eq!(body["route"]["mode"], "safe");
    assert_eq!(body["summary"]["segment_scores"].as_array().unwrap().len(), 3);
    assert!(body["alerts"].is_array());
}

#[tokio::test]
async fn seeded_requests_are_reproducible() {
    let app = default_app();
    let request = json!({"waypoints": four_cities(), "seed": 7});
    let first = read_json(
        app.clone()
            .oneshot(post_json("/v1/routes/optimize", request.clone()))
            .await
            .unwrap(),
    )
    .await;
    let second = read_json(
        app.oneshot(post_json("/v1/routes/optimize", request))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(
        first["route"]["ordered_waypoints"],
        second["route"]["ordered_waypoints"]
    );
    assert_eq!(first["summary"], second["summary"]);
}

#[tokio::test]
async fn single_waypoint_has_no_summary() {
    let res = default_app()
        .oneshot(post_json(
            "/v1/routes/optimize",
            json!({"waypoints": ["33.8366,-117.9143"]}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert!(body["summary"].is_null());
    assert_eq!(body["route"]["segments"], json!([]));
}

#[tokio::test]
async fn invalid_waypoint_is_bad_request() {
    let res = default_app()
        .oneshot(post_json(
            "/v1/routes/optimize",
            json!({"waypoints": [[33.0, -117.0], [123.4, -117.0]]}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = read_json(res).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("waypoint 1"));
}

#[tokio::test]
async fn empty_waypoints_is_bad_request() {
    let res = default_app()
        .oneshot(post_json("/v1/routes/optimize", json!({"waypoints": []})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn driving_without_provider_is_unavailable() {
    let res = default_app()
        .oneshot(post_json(
            "/v1/routes/optimize",
            json!({"waypoints": [[33.8366, -117.9143], [33.7455, -117.8677]], "mode": "driving"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_json(res).await["error"], "provider_not_configured");
}

#[tokio::test]
async fn driving_route_uses_provider_polyline() {
    let state =
        AppState::new(RoutingRules::default()).with_directions(Arc::new(PolylineDirections));
    let res = setup_app(state)
        .oneshot(post_json(
            "/v1/routes/optimize",
            json!({
                "waypoints": [[33.8121, -117.9190], [33.8358, -117.9143]],
                "mode": "driving",
                "seed": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["route"]["segments"].as_array().unwrap().len(), 2);
    assert_eq!(body["route"]["directions"][0]["instruction"], "Continue straight");
    assert_eq!(body["route"]["mode"], "driving");
}

#[tokio::test]
async fn provider_failure_is_bad_gateway() {
    let state = AppState::new(RoutingRules::default()).with_directions(Arc::new(DownDirections));
    let res = setup_app(state)
        .oneshot(post_json(
            "/v1/routes/optimize",
            json!({"waypoints": [[33.8366, -117.9143], [33.7455, -117.8677]], "mode": "driving"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(res).await;
    assert_eq!(body["error"], "provider_error");
    assert!(body["message"].as_str().unwrap().contains("stub"));
}

#[tokio::test]
async fn addresses_are_geocoded_once() {
    let geocoder = Arc::new(CountingGeocoder {
        calls: AtomicUsize::new(0),
    });
    let app = setup_app(AppState::new(RoutingRules::default()).with_geocoder(geocoder.clone()));

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/routes/optimize",
            json!({"waypoints": ["Disneyland, Anaheim, CA", "B3"], "seed": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["route"]["ordered_waypoints"][1], json!({"lat": 33.7, "lon": -117.9}));

    let res = app
        .oneshot(
            Request::builder()
                .uri("/v1/geocode?q=Disneyland,%20Anaheim,%20CA")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["coordinate"], json!({"lat": 33.8121, "lon": -117.9190}));
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn geocode_errors() {
    let geocoder = Arc::new(CountingGeocoder {
        calls: AtomicUsize::new(0),
    });
    let app = setup_app(AppState::new(RoutingRules::default()).with_geocoder(geocoder));

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/v1/geocode?q=Atlantis").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .oneshot(Request::builder().uri("/v1/geocode").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = default_app()
        .oneshot(Request::builder().uri("/v1/geocode?q=Anaheim").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn analyze_supplied_readings() {
    let now = chrono::Utc::now().to_rfc3339();
    let segment = |severity: f64| {
        json!({
            "weather": {"severity": severity, "observed_at": now},
            "road_condition": {"severity": severity, "observed_at": now},
            "traffic": {"severity": severity, "observed_at": now},
            "crime": {"severity": severity, "observed_at": now},
            "natural_disaster": {"severity": severity, "observed_at": now}
        })
    };
    let res = default_app()
        .oneshot(post_json(
            "/v1/routes/analyze",
            json!({"readings": [segment(2.0), segment(9.0), segment(3.0)]}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["summary"]["highest_risk_segment"], 1);
    assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(body["alerts"][0]["segment_index"], 1);
    assert_eq!(body["requires_reroute"], true);
}

#[tokio::test]
async fn analyze_with_custom_threshold() {
    let res = default_app()
        .oneshot(post_json(
            "/v1/routes/analyze",
            json!({"simulate_segments": 5, "seed": 9, "risk_threshold": 0.0}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["summary"]["segment_scores"].as_array().unwrap().len(), 5);
    // Every simulated segment scores above zero in practice.
    assert!(!body["alerts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analyze_rejects_empty_and_missing_input() {
    let app = default_app();

    let res = app
        .clone()
        .oneshot(post_json("/v1/routes/analyze", json!({"readings": []})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(res).await["error"], "empty_route");

    let res = app
        .clone()
        .oneshot(post_json("/v1/routes/analyze", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(post_json("/v1/routes/analyze", json!({"simulate_segments": 1_000_000})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
