use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use augur::config::Config;
use augur::services::AnalysisEngine;
use augur::sources::AlphaVantageClient;
use augur::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "augur=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Augur server on {}:{}", config.host, config.port);

    // Create the Alpha Vantage client; it backs both the stock passthrough
    // endpoints and the analysis engine's history fetches.
    let alphavantage = Arc::new(AlphaVantageClient::new(
        config.alpha_vantage_api_key.clone(),
    ));

    let engine = Arc::new(AnalysisEngine::new(
        alphavantage.clone(),
        Duration::from_secs(config.analysis_cache_ttl_secs),
        config.history_lookback_days,
    ));

    // Create application state
    let state = AppState {
        config: config.clone(),
        alphavantage,
        engine,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = api::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Augur server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
