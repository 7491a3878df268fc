//! HTTP Server and Scrape-on-Demand
//!
//! This module implements the Prometheus exporter HTTP server.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Scrape on demand**: every `/metrics` request runs a full scrape cycle over all
//!   configured switches and renders a registry built for that request alone
//! - **State Management**: Shared state (scraper, health flag) using Arc for thread-safety
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Returns 503 when the last cycle reached none of the switches, 200 otherwise
//!
//! # Error Handling
//!
//! Switches that fail are left out of the response; the endpoint itself still answers
//! 200 with whatever the other switches produced.

use crate::config::Config;
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use crate::scrape::Scraper;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    scraper: Arc<Scraper>,
    healthy: Arc<AtomicBool>,
}

/// Router serving the exporter endpoints for `scraper`
pub fn router(scraper: Scraper) -> Router {
    let state = AppState {
        scraper: Arc::new(scraper),
        healthy: Arc::new(AtomicBool::new(true)),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let scraper = Scraper::new(&config)?;
    info!("Exporting {} switches", scraper.devices().len());

    let app = router(scraper);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ExporterError::Server(format!("failed to bind {}: {}", addr, e)))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>TP-Link Exporter</title></head>
<body>
<h1>TP-Link Switch Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let report = state.scraper.scrape().await;
    state.healthy.store(report.any_success(), Ordering::Relaxed);

    let metrics = match MetricsCollector::new() {
        Ok(metrics) => metrics,
        Err(e) => return render_error(e),
    };
    metrics.record_devices(&report.records);
    metrics.record_cycle(&report, started.elapsed());

    match metrics.render() {
        Ok(rendered) => rendered.into_response(),
        Err(e) => render_error(e),
    }
}

fn render_error(e: anyhow::Error) -> Response {
    error!("Failed to render metrics: {}", e);
    (
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error rendering metrics: {}", e),
    )
        .into_response()
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.healthy.load(Ordering::Relaxed) {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "No switch answered the last scrape",
        )
    }
}
