mod analytics;
mod config;
mod errors;
mod models;
mod risk;
mod server;
mod state;
mod strategy;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Structured logging (line-buffered to stderr)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("options risk engine starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        risk_free_rate = cfg.risk_free_rate,
        max_delta = cfg.greeks_limits.max_delta,
        max_gamma = cfg.greeks_limits.max_gamma,
        max_vega = cfg.greeks_limits.max_vega,
        max_theta = cfg.greeks_limits.max_theta,
        "risk limits loaded"
    );

    let port = cfg.server_port;
    let app = server::router(AppState::new(cfg));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
