//! Incident History Routes

use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::Utc;
use incident_history::{HistorySummary, Incident};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, SharedState};

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of incidents to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Response for the history endpoint
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub summary: HistorySummary,
    /// Parsed incidents, newest first
    pub incidents: Vec<Incident>,
    pub meta: HistoryMeta,
}

#[derive(Debug, Serialize)]
pub struct HistoryMeta {
    pub count: usize,
    pub limit: usize,
}

/// Score summary plus the incident log
pub async fn get_history(
    State(state): State<SharedState>,
    Query(params): Query<HistoryQuery>,
) -> Response {
    let limit = params.limit.min(1000);
    let (summary, mut incidents) = state.aggregator.history_report(Utc::now()).await;

    incidents.sort_by(|a, b| b.time.cmp(&a.time));
    incidents.truncate(limit);

    ApiResponse::ok(HistoryResponse {
        meta: HistoryMeta {
            count: incidents.len(),
            limit,
        },
        summary,
        incidents,
    })
}
