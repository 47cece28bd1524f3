//! Alpha Vantage API client.
//!
//! Typed access to the GLOBAL_QUOTE, TIME_SERIES_DAILY, and OVERVIEW
//! endpoints. Free-tier keys allow 25 requests/day, so analysis results are
//! memoized upstream and nothing here retries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::services::history::HistoryProvider;
use crate::types::{
    HistoryBar, HistoryPeriod, PricePoint, PriceSeries, StockHistory, StockInfo, StockQuote,
};

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage global quote response.
///
/// Rate-limited calls come back as HTTP 200 with a `Note` (legacy) or
/// `Information` field instead of a payload; both are surfaced as upstream
/// errors.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    pub global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

/// Global quote data. Every field arrives as a string; unknown symbols come
/// back as an empty object rather than an error, hence the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    pub symbol: String,
    #[serde(rename = "02. open")]
    pub open: String,
    #[serde(rename = "03. high")]
    pub high: String,
    #[serde(rename = "04. low")]
    pub low: String,
    #[serde(rename = "05. price")]
    pub price: String,
    #[serde(rename = "06. volume")]
    pub volume: String,
    #[serde(rename = "07. latest trading day")]
    pub latest_trading_day: String,
    #[serde(rename = "08. previous close")]
    pub previous_close: String,
    #[serde(rename = "09. change")]
    pub change: String,
    #[serde(rename = "10. change percent")]
    pub change_percent: String,
}

/// Time series daily response.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesDailyResponse {
    #[serde(rename = "Meta Data")]
    pub meta_data: Option<TimeSeriesMetaData>,
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<HashMap<String, TimeSeriesDataPoint>>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

/// Time series meta data.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesMetaData {
    #[serde(rename = "1. Information")]
    pub information: Option<String>,
    #[serde(rename = "2. Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "3. Last Refreshed")]
    pub last_refreshed: Option<String>,
}

/// Individual time series data point.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesDataPoint {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// Company overview data. Unknown symbols produce an empty JSON object, so
/// every field is optional and `Symbol` doubles as the existence check.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Exchange")]
    pub exchange: Option<String>,
    #[serde(rename = "Currency")]
    pub currency: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
    #[serde(rename = "Website")]
    pub website: Option<String>,
    #[serde(rename = "FullTimeEmployees")]
    pub full_time_employees: Option<String>,
    #[serde(rename = "PreviousClose")]
    pub previous_close: Option<String>,
    #[serde(rename = "52WeekHigh")]
    pub week_52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    pub week_52_low: Option<String>,
    #[serde(rename = "AverageVolume")]
    pub average_volume: Option<String>,
    #[serde(rename = "DividendYield")]
    pub dividend_yield: Option<String>,
    #[serde(rename = "Beta")]
    pub beta: Option<String>,
    #[serde(rename = "TrailingPE")]
    pub trailing_pe: Option<String>,
    #[serde(rename = "ForwardPE")]
    pub forward_pe: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

/// Alpha Vantage API client.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Get the latest quote for a symbol.
    pub async fn get_quote(&self, symbol: &str) -> Result<StockQuote> {
        let url = format!(
            "{}?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            ALPHA_VANTAGE_URL, symbol, self.api_key
        );
        debug!("Fetching quote for {}", symbol);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Alpha Vantage returned {}",
                response.status()
            )));
        }

        let data: GlobalQuoteResponse = response.json().await?;
        if let Some(limit) = data.note.or(data.information) {
            return Err(AppError::Upstream(limit));
        }

        let quote = data
            .global_quote
            .filter(|q| !q.symbol.is_empty())
            .ok_or_else(|| AppError::NotFound(format!("No quote data for {}", symbol)))?;

        Ok(StockQuote {
            symbol: quote.symbol,
            // The quote endpoint carries no company name.
            name: symbol.to_string(),
            price: parse_num(&quote.price),
            change: parse_num(&quote.change),
            change_percent: Self::parse_change_percent(&quote.change_percent),
            previous_close: parse_num(&quote.previous_close),
            open: parse_num(&quote.open),
            day_low: parse_num(&quote.low),
            day_high: parse_num(&quote.high),
            volume: parse_int(&quote.volume),
            timestamp: Utc::now(),
        })
    }

    /// Get daily bars covering the requested period, oldest first.
    pub async fn get_history(&self, symbol: &str, period: HistoryPeriod) -> Result<StockHistory> {
        let series = self.daily_series(symbol, period.output_size()).await?;

        let mut bars: Vec<HistoryBar> = series
            .into_iter()
            .filter_map(|(date_str, point)| {
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok()?;
                Some(HistoryBar {
                    date,
                    open: parse_num(&point.open),
                    high: parse_num(&point.high),
                    low: parse_num(&point.low),
                    close: parse_num(&point.close),
                    volume: parse_int(&point.volume),
                })
            })
            .collect();
        bars.sort_by_key(|b| b.date);

        // Trim to the period window, anchored at the newest bar. The "full"
        // output size reaches back 20+ years.
        if let Some(last) = bars.last() {
            let cutoff = last.date - chrono::Duration::days(i64::from(period.days()));
            bars.retain(|b| b.date >= cutoff);
        }

        Ok(StockHistory {
            symbol: symbol.to_string(),
            period,
            data: bars,
        })
    }

    /// Get company fundamentals, with current trading stats filled in from
    /// the quote endpoint.
    pub async fn get_info(&self, symbol: &str) -> Result<StockInfo> {
        let url = format!(
            "{}?function=OVERVIEW&symbol={}&apikey={}",
            ALPHA_VANTAGE_URL, symbol, self.api_key
        );
        debug!("Fetching company overview for {}", symbol);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Alpha Vantage returned {}",
                response.status()
            )));
        }

        let overview: CompanyOverview = response.json().await?;
        if let Some(limit) = overview.note.clone().or(overview.information.clone()) {
            return Err(AppError::Upstream(limit));
        }
        let official_symbol = overview
            .symbol
            .clone()
            .ok_or_else(|| AppError::NotFound(format!("Stock {} not found", symbol)))?;

        // An overview can exist for symbols the quote endpoint has nothing
        // for; trading stats degrade to zeros in that case.
        let quote = match self.get_quote(symbol).await {
            Ok(quote) => Some(quote),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        let quote = quote.unwrap_or_else(|| StockQuote {
            symbol: official_symbol.clone(),
            name: symbol.to_string(),
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            previous_close: 0.0,
            open: 0.0,
            day_low: 0.0,
            day_high: 0.0,
            volume: 0,
            timestamp: Utc::now(),
        });

        Ok(StockInfo {
            symbol: official_symbol,
            name: text_or(&overview.name, "N/A"),
            currency: text_or(&overview.currency, "USD"),
            exchange: text_or(&overview.exchange, "N/A"),
            sector: text_or(&overview.sector, "N/A"),
            industry: text_or(&overview.industry, "N/A"),
            market_cap: opt_num(&overview.market_cap),
            website: text_or(&overview.website, ""),
            description: text_or(&overview.description, ""),
            employees: opt_int(&overview.full_time_employees) as u32,
            country: text_or(&overview.country, "N/A"),
            current_price: quote.price,
            previous_close: opt_num(&overview.previous_close),
            open: quote.open,
            day_low: quote.day_low,
            day_high: quote.day_high,
            fifty_two_week_low: opt_num(&overview.week_52_low),
            fifty_two_week_high: opt_num(&overview.week_52_high),
            volume: quote.volume,
            average_volume: opt_int(&overview.average_volume),
            dividend_yield: opt_num(&overview.dividend_yield),
            beta: opt_num(&overview.beta),
            trailing_pe: opt_num(&overview.trailing_pe),
            forward_pe: opt_num(&overview.forward_pe),
        })
    }

    /// Fetch the raw daily time series map, surfacing rate limits and unknown
    /// symbols as errors.
    async fn daily_series(
        &self,
        symbol: &str,
        output_size: &str,
    ) -> Result<HashMap<String, TimeSeriesDataPoint>> {
        let url = format!(
            "{}?function=TIME_SERIES_DAILY&symbol={}&outputsize={}&apikey={}",
            ALPHA_VANTAGE_URL, symbol, output_size, self.api_key
        );
        debug!("Fetching daily series for {} ({})", symbol, output_size);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Alpha Vantage returned {}",
                response.status()
            )));
        }

        let data: TimeSeriesDailyResponse = response.json().await?;
        if let Some(limit) = data.note.or(data.information) {
            return Err(AppError::Upstream(limit));
        }

        data.time_series
            .ok_or_else(|| AppError::NotFound(format!("No daily history for {}", symbol)))
    }

    /// Parse change percent string (e.g., "1.23%" -> 1.23).
    pub fn parse_change_percent(s: &str) -> f64 {
        s.trim_end_matches('%').parse().unwrap_or(0.0)
    }
}

#[async_trait]
impl HistoryProvider for AlphaVantageClient {
    /// Daily closes normalized for the analysis engine. The compact window
    /// is 100 trading days, more than enough for the 90-day lookback.
    async fn fetch_history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries> {
        let series = self.daily_series(symbol, "compact").await?;
        let points = series
            .into_iter()
            .filter_map(|(date_str, point)| {
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok()?;
                Some(PricePoint::new(date, parse_num(&point.close)))
            })
            .collect();
        Ok(PriceSeries::from_points(points).trailing(lookback_days))
    }
}

fn parse_num(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

fn parse_int(s: &str) -> u64 {
    s.parse().unwrap_or(0)
}

/// Fundamentals arrive as optional strings, with literal "None" and "-" used
/// for missing values.
fn opt_num(field: &Option<String>) -> f64 {
    field.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0.0)
}

fn opt_int(field: &Option<String>) -> u64 {
    field.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
}

fn text_or(field: &Option<String>, default: &str) -> String {
    field.clone().unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // parse_change_percent Tests
    // =========================================================================

    #[test]
    fn test_parse_change_percent_with_percent_sign() {
        assert_eq!(AlphaVantageClient::parse_change_percent("1.23%"), 1.23);
        assert_eq!(AlphaVantageClient::parse_change_percent("-2.50%"), -2.50);
    }

    #[test]
    fn test_parse_change_percent_without_percent_sign() {
        assert_eq!(AlphaVantageClient::parse_change_percent("1.23"), 1.23);
        assert_eq!(AlphaVantageClient::parse_change_percent("-0.75"), -0.75);
    }

    #[test]
    fn test_parse_change_percent_invalid() {
        assert_eq!(AlphaVantageClient::parse_change_percent("invalid"), 0.0);
        assert_eq!(AlphaVantageClient::parse_change_percent(""), 0.0);
    }

    // =========================================================================
    // GlobalQuote Tests
    // =========================================================================

    #[test]
    fn test_global_quote_deserialization() {
        let json = r#"{
            "01. symbol": "AAPL",
            "02. open": "150.00",
            "03. high": "155.00",
            "04. low": "148.00",
            "05. price": "153.25",
            "06. volume": "50000000",
            "07. latest trading day": "2024-01-15",
            "08. previous close": "151.50",
            "09. change": "1.75",
            "10. change percent": "1.15%"
        }"#;
        let quote: GlobalQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, "153.25");
        assert_eq!(quote.change_percent, "1.15%");
    }

    #[test]
    fn test_global_quote_response_with_data() {
        let json = r#"{
            "Global Quote": {
                "01. symbol": "MSFT",
                "02. open": "380.00",
                "03. high": "385.00",
                "04. low": "378.00",
                "05. price": "383.50",
                "06. volume": "25000000",
                "07. latest trading day": "2024-01-15",
                "08. previous close": "379.00",
                "09. change": "4.50",
                "10. change percent": "1.19%"
            }
        }"#;
        let response: GlobalQuoteResponse = serde_json::from_str(json).unwrap();
        assert!(response.global_quote.is_some());
        assert_eq!(response.global_quote.unwrap().symbol, "MSFT");
    }

    #[test]
    fn test_global_quote_response_empty_object() {
        // Unknown symbols produce an empty quote object, not an error body.
        let json = r#"{"Global Quote": {}}"#;
        let response: GlobalQuoteResponse = serde_json::from_str(json).unwrap();
        assert!(response.global_quote.unwrap().symbol.is_empty());
    }

    #[test]
    fn test_global_quote_response_rate_limited() {
        let json = r#"{
            "Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
        }"#;
        let response: GlobalQuoteResponse = serde_json::from_str(json).unwrap();
        assert!(response.global_quote.is_none());
        assert!(response.information.is_some());
    }

    // =========================================================================
    // TimeSeries Tests
    // =========================================================================

    #[test]
    fn test_time_series_data_point_deserialization() {
        let json = r#"{
            "1. open": "150.00",
            "2. high": "155.00",
            "3. low": "148.00",
            "4. close": "153.00",
            "5. volume": "50000000"
        }"#;
        let point: TimeSeriesDataPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.open, "150.00");
        assert_eq!(point.close, "153.00");
        assert_eq!(point.volume, "50000000");
    }

    #[test]
    fn test_time_series_meta_data_deserialization() {
        let json = r#"{
            "1. Information": "Daily Time Series",
            "2. Symbol": "AAPL",
            "3. Last Refreshed": "2024-01-15"
        }"#;
        let meta: TimeSeriesMetaData = serde_json::from_str(json).unwrap();
        assert_eq!(meta.symbol, Some("AAPL".to_string()));
        assert_eq!(meta.last_refreshed, Some("2024-01-15".to_string()));
    }

    #[test]
    fn test_time_series_daily_response_deserialization() {
        let json = r#"{
            "Meta Data": {
                "1. Information": "Daily Prices",
                "2. Symbol": "AAPL",
                "3. Last Refreshed": "2024-01-15"
            },
            "Time Series (Daily)": {
                "2024-01-15": {
                    "1. open": "150.00",
                    "2. high": "155.00",
                    "3. low": "148.00",
                    "4. close": "153.00",
                    "5. volume": "50000000"
                }
            }
        }"#;
        let response: TimeSeriesDailyResponse = serde_json::from_str(json).unwrap();
        assert!(response.meta_data.is_some());
        let series = response.time_series.unwrap();
        assert!(series.contains_key("2024-01-15"));
    }

    // =========================================================================
    // CompanyOverview Tests
    // =========================================================================

    #[test]
    fn test_company_overview_deserialization() {
        let json = r#"{
            "Symbol": "AAPL",
            "AssetType": "Common Stock",
            "Name": "Apple Inc",
            "Description": "Technology company",
            "Exchange": "NASDAQ",
            "Currency": "USD",
            "Country": "USA",
            "Sector": "Technology",
            "Industry": "Consumer Electronics",
            "MarketCapitalization": "2500000000000",
            "Website": "https://www.apple.com",
            "FullTimeEmployees": "164000",
            "PreviousClose": "151.50",
            "52WeekHigh": "200.00",
            "52WeekLow": "130.00",
            "AverageVolume": "58000000",
            "DividendYield": "0.005",
            "Beta": "1.28",
            "TrailingPE": "29.5",
            "ForwardPE": "27.1"
        }"#;
        let overview: CompanyOverview = serde_json::from_str(json).unwrap();
        assert_eq!(overview.symbol, Some("AAPL".to_string()));
        assert_eq!(overview.name, Some("Apple Inc".to_string()));
        assert_eq!(overview.sector, Some("Technology".to_string()));
        assert_eq!(overview.week_52_high, Some("200.00".to_string()));
        assert_eq!(overview.full_time_employees, Some("164000".to_string()));
    }

    #[test]
    fn test_company_overview_minimal() {
        let json = r#"{}"#;
        let overview: CompanyOverview = serde_json::from_str(json).unwrap();
        assert!(overview.symbol.is_none());
        assert!(overview.name.is_none());
    }

    // =========================================================================
    // Field parsing Tests
    // =========================================================================

    #[test]
    fn test_opt_num_handles_missing_and_none_literal() {
        assert_eq!(opt_num(&Some("1.28".to_string())), 1.28);
        assert_eq!(opt_num(&Some("None".to_string())), 0.0);
        assert_eq!(opt_num(&Some("-".to_string())), 0.0);
        assert_eq!(opt_num(&None), 0.0);
    }

    #[test]
    fn test_opt_int_handles_missing() {
        assert_eq!(opt_int(&Some("164000".to_string())), 164000);
        assert_eq!(opt_int(&Some("None".to_string())), 0);
        assert_eq!(opt_int(&None), 0);
    }

    #[test]
    fn test_text_or_defaults() {
        assert_eq!(text_or(&Some("NASDAQ".to_string()), "N/A"), "NASDAQ");
        assert_eq!(text_or(&None, "N/A"), "N/A");
    }

    // =========================================================================
    // AlphaVantageClient Tests
    // =========================================================================

    #[test]
    fn test_alpha_vantage_client_creation() {
        let client = AlphaVantageClient::new("test_api_key".to_string());
        assert_eq!(client.api_key, "test_api_key");
    }
}
