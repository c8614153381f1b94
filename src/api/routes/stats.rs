//! Usage statistics handler.

use crate::api::AppState;
use crate::api::error_response::localized;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

/// GET /stats - Conversion statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Totals, breakdowns, today's counters and the last 7 days", body = crate::types::StatsSnapshot),
        (status = 500, description = "Statistics database unavailable", body = crate::error::ApiError)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Response {
    match state.stats.query().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => localized(e, state.config.locale),
    }
}
