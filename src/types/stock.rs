use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// History window for the historical-data endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HistoryPeriod {
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl HistoryPeriod {
    /// Get the period from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1mo" => Some(HistoryPeriod::OneMonth),
            "3mo" => Some(HistoryPeriod::ThreeMonths),
            "6mo" => Some(HistoryPeriod::SixMonths),
            "1y" => Some(HistoryPeriod::OneYear),
            _ => None,
        }
    }

    /// Number of calendar days covered by this period.
    pub fn days(&self) -> u32 {
        match self {
            HistoryPeriod::OneMonth => 30,
            HistoryPeriod::ThreeMonths => 90,
            HistoryPeriod::SixMonths => 180,
            HistoryPeriod::OneYear => 365,
        }
    }

    /// Alpha Vantage output size needed to cover this period. The compact
    /// window is 100 trading days, enough for three months but not six.
    pub fn output_size(&self) -> &'static str {
        match self {
            HistoryPeriod::OneMonth | HistoryPeriod::ThreeMonths => "compact",
            HistoryPeriod::SixMonths | HistoryPeriod::OneYear => "full",
        }
    }

    /// Get display label for this period.
    pub fn label(&self) -> &'static str {
        match self {
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
        }
    }
}

/// Real-time quote for a stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub previous_close: f64,
    pub open: f64,
    pub day_low: f64,
    pub day_high: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Historical daily bars for a stock over a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistory {
    pub symbol: String,
    pub period: HistoryPeriod,
    pub data: Vec<HistoryBar>,
}

/// Company fundamentals and current trading stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    pub symbol: String,
    pub name: String,
    pub currency: String,
    pub exchange: String,
    pub sector: String,
    pub industry: String,
    pub market_cap: f64,
    pub website: String,
    pub description: String,
    pub employees: u32,
    pub country: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub open: f64,
    pub day_low: f64,
    pub day_high: f64,
    pub fifty_two_week_low: f64,
    pub fifty_two_week_high: f64,
    pub volume: u64,
    pub average_volume: u64,
    pub dividend_yield: f64,
    pub beta: f64,
    pub trailing_pe: f64,
    pub forward_pe: f64,
}
