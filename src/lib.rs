//! Augur - stock analysis server with price forecasts and technical signals

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use config::Config;
use services::AnalysisEngine;
use sources::AlphaVantageClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub alphavantage: Arc<AlphaVantageClient>,
    pub engine: Arc<AnalysisEngine>,
}
