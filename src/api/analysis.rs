use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::services::analysis::EngineStats;
use crate::types::{CombinedAnalysis, Forecast, TechnicalAnalysis};
use crate::AppState;

/// Longest forecast horizon a request may ask for.
const MAX_FORECAST_DAYS: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct HorizonQuery {
    days: Option<u32>,
}

/// GET /api/analysis/forecast/:symbol?days=7
async fn get_forecast(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HorizonQuery>,
) -> Result<Json<Forecast>> {
    let symbol = symbol.to_uppercase();
    let days = validate_horizon(params.days, state.config.default_forecast_days)?;
    let forecast = state.engine.forecast(&symbol, days).await?;
    Ok(Json(forecast))
}

/// GET /api/analysis/signals/:symbol
async fn get_signals(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<TechnicalAnalysis>> {
    let symbol = symbol.to_uppercase();
    let technical = state.engine.technical_signals(&symbol).await?;
    Ok(Json(technical))
}

/// GET /api/analysis/analyze/:symbol?days=7
async fn analyze(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HorizonQuery>,
) -> Result<Json<CombinedAnalysis>> {
    let symbol = symbol.to_uppercase();
    let days = validate_horizon(params.days, state.config.default_forecast_days)?;
    let combined = state.engine.combined_analysis(&symbol, days).await?;
    Ok(Json(combined))
}

/// GET /api/analysis/stats
async fn get_stats(State(state): State<AppState>) -> Json<EngineStats> {
    Json(state.engine.stats())
}

/// Validate the horizon before any engine work runs.
fn validate_horizon(requested: Option<u32>, default: u32) -> Result<u32> {
    let days = requested.unwrap_or(default);
    if !(1..=MAX_FORECAST_DAYS).contains(&days) {
        tracing::warn!("Rejecting forecast horizon of {} days", days);
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}, got {}",
            MAX_FORECAST_DAYS, days
        )));
    }
    Ok(days)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forecast/:symbol", get(get_forecast))
        .route("/signals/:symbol", get(get_signals))
        .route("/analyze/:symbol", get(analyze))
        .route("/stats", get(get_stats))
}
