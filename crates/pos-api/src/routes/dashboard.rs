//! Routes for dashboard figures.

use axum::extract::{Query, State};
use axum::{Json, Router, routing::get};
use chrono::NaiveDate;
use pos_core::clock::Clock;
use serde::Deserialize;
use tracing::instrument;

use pos_orders::application::dashboard::{self, DailySales, DashboardStats};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of GET /daily-sales.
#[derive(Debug, Default, Deserialize)]
pub struct DailySalesQuery {
    /// Day to report, `YYYY-MM-DD`; today (UTC) when absent.
    pub date: Option<String>,
}

/// GET /stats
#[instrument(skip_all)]
async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(
        dashboard::get_dashboard_stats(&*state.event_repository).await?,
    ))
}

/// GET /daily-sales
#[instrument(skip(state))]
async fn daily_sales(
    State(state): State<AppState>,
    Query(query): Query<DailySalesQuery>,
) -> Result<Json<DailySales>, ApiError> {
    let date = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request(format!("date must be YYYY-MM-DD, got {raw}")))?,
        None => state.clock.today(),
    };
    Ok(Json(
        dashboard::get_daily_sales(date, &*state.event_repository).await?,
    ))
}

/// Returns the router for dashboard figures.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/daily-sales", get(daily_sales))
}
