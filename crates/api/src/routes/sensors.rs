//! Sensor Routes

use aggregator::SensorStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, Utc};
use sensor_extract::SensorReading;
use serde::Serialize;
use std::time::Duration;

use crate::{error_response, ApiResponse, SharedState};

/// Response for a single sensor
#[derive(Debug, Serialize)]
pub struct SensorResponse<T> {
    pub sensor: &'static str,
    pub reading: SensorReading<T>,
    pub status: SensorStatus,
}

fn respond<T: Serialize>(
    sensor: &'static str,
    reading: SensorReading<T>,
    now: DateTime<Utc>,
    display: Duration,
) -> Response {
    let status = SensorStatus::of(&reading, now, display);
    ApiResponse::ok(SensorResponse {
        sensor,
        reading,
        status,
    })
}

/// Latest reading of one sensor: alcohol, visibility, drowsiness or obd
pub async fn get_sensor(State(state): State<SharedState>, Path(sensor): Path<String>) -> Response {
    let aggregator = &state.aggregator;
    let now = Utc::now();
    let display = aggregator.config().freshness.display();

    match sensor.as_str() {
        "alcohol" => respond("alcohol", aggregator.alcohol(now).await, now, display),
        "visibility" => respond("visibility", aggregator.visibility(now).await, now, display),
        "drowsiness" => respond("drowsiness", aggregator.drowsiness(now).await, now, display),
        "obd" => respond("obd", aggregator.obd(now).await, now, display),
        other => error_response(StatusCode::NOT_FOUND, format!("Unknown sensor: {}", other)),
    }
}
