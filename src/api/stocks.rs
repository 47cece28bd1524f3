use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::types::{HistoryPeriod, StockHistory, StockInfo, StockQuote};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    period: Option<String>,
}

/// GET /api/stocks/quote/:symbol
async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockQuote>> {
    let symbol = symbol.to_uppercase();
    let quote = state.alphavantage.get_quote(&symbol).await?;
    Ok(Json(quote))
}

/// GET /api/stocks/history/:symbol?period=1mo
async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<StockHistory>> {
    let symbol = symbol.to_uppercase();
    let period = parse_period(params.period.as_deref())?;
    let history = state.alphavantage.get_history(&symbol, period).await?;
    Ok(Json(history))
}

/// GET /api/stocks/info/:symbol
async fn get_info(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockInfo>> {
    let symbol = symbol.to_uppercase();
    let info = state.alphavantage.get_info(&symbol).await?;
    Ok(Json(info))
}

fn parse_period(raw: Option<&str>) -> Result<HistoryPeriod> {
    match raw {
        None => Ok(HistoryPeriod::default()),
        Some(s) => HistoryPeriod::from_str(s).ok_or_else(|| {
            tracing::warn!("Rejecting unknown history period '{}'", s);
            AppError::BadRequest(format!(
                "Unknown period '{}', expected one of: 1mo, 3mo, 6mo, 1y",
                s
            ))
        }),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quote/:symbol", get(get_quote))
        .route("/history/:symbol", get(get_history))
        .route("/info/:symbol", get(get_info))
}
