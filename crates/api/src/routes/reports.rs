//! Report Routes

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Local};
use serde::Deserialize;
use std::sync::Arc;
use storage::MonthlyReport;

use crate::error::ApiError;
use crate::AppState;

/// Query parameters for the monthly report.
///
/// Both default to the current local month, so a dashboard polling without
/// parameters sees the month in progress. Past months are requested
/// explicitly.
#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Get detection statistics for one month
pub async fn get_monthly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthlyQuery>,
) -> Result<Json<MonthlyReport>, ApiError> {
    let today = Local::now();
    let year = params.year.unwrap_or_else(|| today.year());
    let month = params.month.unwrap_or_else(|| today.month());

    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest(format!("month must be between 1 and 12, got {}", month)));
    }

    let logger = state.pipeline.event_logger().clone();
    let report = tokio::task::spawn_blocking(move || logger.monthly_report(year, month))
        .await
        .map_err(|e| ApiError::Internal(format!("Report task failed: {}", e)))??;

    Ok(Json(report))
}
