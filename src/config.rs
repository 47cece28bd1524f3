use std::env;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Alpha Vantage API key. The public "demo" key works for a handful of
    /// symbols and is the fallback when the variable is unset.
    pub alpha_vantage_api_key: String,
    /// Calendar days of history fetched for analysis.
    pub history_lookback_days: u32,
    /// TTL for cached forecast/analysis results, in seconds.
    pub analysis_cache_ttl_secs: u64,
    /// Forecast horizon used when a request does not specify one.
    pub default_forecast_days: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        Self {
            host,
            port,
            alpha_vantage_api_key: env::var("ALPHA_VANTAGE_API_KEY")
                .unwrap_or_else(|_| "demo".to_string()),
            history_lookback_days: env::var("HISTORY_LOOKBACK_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90),
            analysis_cache_ttl_secs: env::var("ANALYSIS_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
            default_forecast_days: env::var("DEFAULT_FORECAST_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
