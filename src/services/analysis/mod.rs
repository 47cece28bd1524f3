//! The analysis engine: price forecasts, technical signals, and the fused
//! recommendation, with per-(symbol, horizon) result memoization.

pub mod forecast;
pub mod fuse;
pub mod indicators;
pub mod signals;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::services::cache::{Cache, Clock};
use crate::services::history::HistoryProvider;
use crate::types::{
    CombinedAnalysis, Forecast, PriceSeries, TechnicalAnalysis, MIN_HISTORY_POINTS,
};

/// Engine counters exposed on the stats endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    /// Forecast model fits performed since startup.
    pub forecast_fits: u64,
    /// Requests answered from the result cache.
    pub cache_hits: u64,
    /// Requests that had to compute.
    pub cache_misses: u64,
    /// Entries currently held across both result caches.
    pub cached_entries: usize,
}

/// Turns daily close history into forecasts, signals, and combined
/// recommendations.
///
/// The engine holds no mutable state besides the result caches and its
/// counters, so one instance is shared across concurrent requests. Forecast
/// and combined results are memoized per (symbol, horizon); signals are
/// cheap and always recomputed, matching how the results are consumed.
pub struct AnalysisEngine {
    provider: Arc<dyn HistoryProvider>,
    forecast_cache: Cache<Forecast>,
    combined_cache: Cache<CombinedAnalysis>,
    lookback_days: u32,
    fit_count: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl AnalysisEngine {
    /// Create an engine with the given result TTL and history lookback.
    pub fn new(provider: Arc<dyn HistoryProvider>, cache_ttl: Duration, lookback_days: u32) -> Self {
        Self {
            provider,
            forecast_cache: Cache::new(cache_ttl),
            combined_cache: Cache::new(cache_ttl),
            lookback_days,
            fit_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Create an engine whose cache expiry reads from the given clock.
    pub fn with_clock(
        provider: Arc<dyn HistoryProvider>,
        cache_ttl: Duration,
        lookback_days: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            forecast_cache: Cache::with_clock(cache_ttl, clock.clone()),
            combined_cache: Cache::with_clock(cache_ttl, clock),
            lookback_days,
            fit_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Multi-day price forecast for a symbol, memoized per (symbol, horizon).
    pub async fn forecast(&self, symbol: &str, horizon_days: u32) -> Result<Forecast> {
        let key = cache_key(symbol, horizon_days);
        if let Some(cached) = self.forecast_cache.get(&key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            debug!("Forecast cache hit for {}", key);
            return Ok(cached);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let series = self.history(symbol).await?;
        let forecast = self.fit_forecast(symbol, &series, horizon_days)?;
        self.forecast_cache.set(key, forecast.clone());
        Ok(forecast)
    }

    /// Latest indicator values plus the signals and vote derived from them.
    /// Not cached: the indicator pass is cheap next to a model fit.
    pub async fn technical_signals(&self, symbol: &str) -> Result<TechnicalAnalysis> {
        let series = self.history(symbol).await?;
        Ok(self.technicals(symbol, &series))
    }

    /// Forecast and technicals computed from one history fetch and fused
    /// into a final recommendation, memoized per (symbol, horizon).
    pub async fn combined_analysis(
        &self,
        symbol: &str,
        horizon_days: u32,
    ) -> Result<CombinedAnalysis> {
        let key = cache_key(symbol, horizon_days);
        if let Some(cached) = self.combined_cache.get(&key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            debug!("Combined analysis cache hit for {}", key);
            return Ok(cached);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let series = self.history(symbol).await?;
        let forecast = self.fit_forecast(symbol, &series, horizon_days)?;
        let technical = self.technicals(symbol, &series);
        let combined = fuse::combine(forecast, technical);
        self.combined_cache.set(key, combined.clone());
        Ok(combined)
    }

    /// Current counter values.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            forecast_fits: self.fit_count.load(Ordering::Relaxed),
            cache_hits: self.hit_count.load(Ordering::Relaxed),
            cache_misses: self.miss_count.load(Ordering::Relaxed),
            cached_entries: self.forecast_cache.len() + self.combined_cache.len(),
        }
    }

    /// Fetch history and enforce the minimum sample size before any heavier
    /// work runs. Too little history is insufficient data no matter why the
    /// provider returned so little.
    async fn history(&self, symbol: &str) -> Result<PriceSeries> {
        let series = self.provider.fetch_history(symbol, self.lookback_days).await?;
        if series.len() < MIN_HISTORY_POINTS {
            return Err(AppError::InsufficientData(format!(
                "{}: {} daily closes available, {} required",
                symbol,
                series.len(),
                MIN_HISTORY_POINTS
            )));
        }
        Ok(series)
    }

    fn fit_forecast(
        &self,
        symbol: &str,
        series: &PriceSeries,
        horizon_days: u32,
    ) -> Result<Forecast> {
        info!(
            "Fitting forecast model for {} ({} closes, {} day horizon)",
            symbol,
            series.len(),
            horizon_days
        );
        self.fit_count.fetch_add(1, Ordering::Relaxed);
        forecast::run(symbol, series, horizon_days)
    }

    fn technicals(&self, symbol: &str, series: &PriceSeries) -> TechnicalAnalysis {
        let snapshot = indicators::snapshot(series);
        // Signals evaluate the raw values; the response carries the rounded
        // copy so a histogram a hair above zero cannot round into a phantom
        // neutral reading.
        let fired = signals::evaluate(&snapshot);
        let vote = signals::tally(&fired);

        TechnicalAnalysis {
            symbol: symbol.to_string(),
            indicators: snapshot.rounded(),
            signals: fired,
            recommendation: vote.recommendation,
            confidence: vote.confidence,
            generated_at: Utc::now(),
        }
    }
}

fn cache_key(symbol: &str, horizon_days: u32) -> String {
    format!("{}_{}", symbol, horizon_days)
}
