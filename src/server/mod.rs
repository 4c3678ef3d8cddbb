//! HTTP surface for QR generation
//!
//! `POST /generate` takes a multipart form and answers with a PNG.
//! `GET /metrics` is mounted when metrics are enabled.

mod handlers;
mod response;

use crate::config::{MetricsFormat, QrmarkConfig, ServerOptions};
use crate::error::{Error, Result};
use crate::metrics;
use crate::pipeline::Generator;
use crate::watermark::WatermarkParams;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    generator: Arc<Generator>,
    defaults: WatermarkParams,
    metrics_format: Option<MetricsFormat>,
}

impl AppState {
    /// Build state from a loaded configuration.
    pub fn from_config(config: &QrmarkConfig) -> Result<Self> {
        let generator = Generator::new(config.encoder()).with_verification(config.qr.verify_output);
        let metrics_format = config
            .logging
            .metrics
            .then_some(config.logging.metrics_format);

        Ok(Self {
            generator: Arc::new(generator),
            defaults: config.watermark_defaults()?,
            metrics_format,
        })
    }
}

/// Build the application router for `config`.
///
/// Enables metrics aggregation when configured, so this must run inside a
/// Tokio runtime.
pub fn build(config: &QrmarkConfig) -> Result<Router> {
    let state = AppState::from_config(config)?;
    if state.metrics_format.is_some() {
        metrics::enable(config.logging.metrics_interval_secs);
    }
    router(state, &config.server)
}

/// Assemble routes and middleware around `state`.
pub fn router(state: AppState, options: &ServerOptions) -> Result<Router> {
    let mut routes = Router::new().route("/generate", post(handlers::generate));
    if state.metrics_format.is_some() {
        routes = routes.route("/metrics", get(handlers::metrics));
    }

    Ok(routes
        .with_state(state)
        .layer(cors_layer(options)?)
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(options: &ServerOptions) -> Result<CorsLayer> {
    if options.allowed_origins.is_empty() {
        return Ok(CorsLayer::very_permissive());
    }

    let origins = options
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| Error::Config(format!("Invalid allowed origin '{origin}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &QrmarkConfig) -> Result<()> {
    let app = build(config)?;
    let listener = TcpListener::bind(config.server.socket_address()).await?;
    info!(address = %listener.local_addr()?, "qrmark listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("qrmark stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
