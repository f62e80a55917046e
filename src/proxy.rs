//! The tracking proxy HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::Value;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::TrackingError;
use crate::transport::HttpTransport;
use crate::upstream::UpstreamClient;

pub struct AppState {
    pub api_key: Option<String>,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: &Config, transport: Arc<dyn HttpTransport>) -> Arc<Self> {
        Arc::new(Self {
            api_key: config.klikresi_api_key.clone(),
            upstream: UpstreamClient::new(config.klikresi_url.clone(), transport),
        })
    }

    /// Validate the query, then make exactly one upstream call.
    pub async fn forward(&self, awb: &str, courier: &str) -> Result<Value, TrackingError> {
        if awb.trim().is_empty() || courier.trim().is_empty() {
            return Err(TrackingError::Validation);
        }

        let api_key = self.api_key.as_deref().ok_or(TrackingError::Configuration)?;

        self.upstream.fetch_tracking(api_key, awb, courier).await
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/trackings/{awb}/couriers/{courier}", get(tracking_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn tracking_handler(
    State(state): State<Arc<AppState>>,
    Path((awb, courier)): Path<(String, String)>,
) -> Response {
    match state.forward(&awb, &courier).await {
        Ok(body) => {
            let mut response = (StatusCode::OK, Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type, x-api-key"),
            );
            response
        }
        Err(e) => {
            warn!(
                awb = %awb,
                courier = %courier,
                status = %e.status_code(),
                "Tracking request failed: {e}"
            );
            e.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn health_handler() -> impl IntoResponse {
    let status = HealthStatus {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
    (StatusCode::OK, Json(status))
}

pub async fn serve(config: Config, transport: Arc<dyn HttpTransport>) -> Result<()> {
    if config.klikresi_api_key.is_none() {
        warn!("KLIKRESI_API_KEY is not set; tracking requests will fail until it is");
    }

    let state = AppState::new(&config, transport);
    let app = router(state);

    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Proxy listening on {address}, upstream {}", config.klikresi_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Proxy shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
