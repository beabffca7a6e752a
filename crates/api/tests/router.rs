use aggregator::{Aggregator, AggregatorConfig};
use api::{create_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use log_source::MemorySource;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn at(age_secs: i64) -> String {
    (Utc::now() - Duration::seconds(age_secs))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn app(source: MemorySource) -> Router {
    let config = AggregatorConfig {
        source_offset_minutes: 0,
        ..Default::default()
    };
    let aggregator = Aggregator::new(config, Arc::new(source)).unwrap();
    create_router(Arc::new(AppState::new(aggregator)))
}

fn drive_logs() -> MemorySource {
    let paths = AggregatorConfig::default().paths;
    let mut obd = vec!["-".to_string(); 30];
    obd[1] = at(3);
    obd[2] = "77.2".to_string();
    obd[3] = "28.6".to_string();
    obd[29] = "142".to_string();

    MemorySource::new()
        .with_log(&paths.alcohol, &format!("{},\"Sensor Value: 90\"", at(3)))
        .with_log(&paths.drowsiness, &format!("1,{},0,0,0,0,Drowsiness Alert", at(3)))
        .with_log(&paths.obd, &obd.join(","))
        .with_log(
            &paths.history,
            &format!(
                "{},Overspeed,Medium,Ring Road,Over limit\n{},Lane Drift,Low,NH8,Drifted, twice",
                at(7200),
                at(3600)
            ),
        )
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn live_dashboard_returns_flattened_snapshot() {
    let (status, body) = get(app(drive_logs()), "/api/v1/dashboard/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["alcoholLevel"], 0.5);
    assert_eq!(body["speed"], 142.0);
    assert_eq!(body["isConnected"], true);
    assert_eq!(body["drowsinessState"], "Drowsy");
    assert_eq!(body["totalIncidents"], 2);
    assert_eq!(body["sensors"]["visibility"]["online"], false);

    let active = body["activeIncidents"].as_array().unwrap();
    assert_eq!(active.len(), 4);
    assert_eq!(active[0]["type"], "High Speed");
    assert_eq!(active[1]["type"], "Driver Drowsiness");
    assert_eq!(active[2]["type"], "Lane Drift");
    assert_eq!(active[2]["description"], "Drifted, twice");
    assert_eq!(active[3]["type"], "Overspeed");
}

#[tokio::test]
async fn live_dashboard_survives_missing_logs() {
    let (status, body) = get(app(MemorySource::new()), "/api/v1/dashboard/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["driverScore"], 100.0);
    assert_eq!(body["activeIncidents"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn single_sensor_endpoint() {
    let (status, body) = get(app(drive_logs()), "/api/v1/sensors/obd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sensor"], "obd");
    assert_eq!(body["reading"]["value"]["speedKmh"], 142.0);
    assert_eq!(body["reading"]["isValid"], true);
    assert_eq!(body["status"]["online"], true);
}

#[tokio::test]
async fn unknown_sensor_is_not_found() {
    let (status, body) = get(app(drive_logs()), "/api/v1/sensors/radar").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unknown sensor: radar");
}

#[tokio::test]
async fn history_lists_incidents_newest_first() {
    let (status, body) = get(app(drive_logs()), "/api/v1/history?limit=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["totalIncidents"], 2);
    assert_eq!(body["summary"]["windowedIncidents"], 2);
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["incidents"][0]["type"], "Lane Drift");
}

#[tokio::test]
async fn health_reports_source_state() {
    let (status, body) = get(app(MemorySource::new()), "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["log_source_open"], true);
}

#[tokio::test]
async fn metrics_without_recorder_is_unavailable() {
    let response = app(MemorySource::new())
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
