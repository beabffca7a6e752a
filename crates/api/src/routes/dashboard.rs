//! Live Dashboard Route

use axum::{extract::State, http::StatusCode, response::Response};
use chrono::Utc;
use tracing::error;

use crate::{error_response, ApiResponse, SharedState};

/// Build and return the live snapshot.
///
/// The aggregation runs as its own task; only a failure of that task
/// (never a failing sensor) turns into a 500.
pub async fn get_live(State(state): State<SharedState>) -> Response {
    let now = Utc::now();
    let task_state = state.clone();
    let task = tokio::spawn(async move { task_state.aggregator.aggregate(now).await });

    match task.await {
        Ok(snapshot) => ApiResponse::ok(snapshot),
        Err(e) => {
            error!("Dashboard aggregation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
