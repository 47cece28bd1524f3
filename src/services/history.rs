//! Seam between the analysis engine and the market-data sources.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::PriceSeries;

/// Supplies normalized daily close history for a symbol.
///
/// Implementations return a series covering roughly the trailing
/// `lookback_days` calendar days, ascending by date. The engine treats any
/// series below its minimum sample size as insufficient data regardless of
/// why the provider returned so little.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch_history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries>;
}
