//! HTTP server for the analysis service

pub mod routes;
pub mod state;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::{Error, Result};
use state::AppState;

/// Analysis HTTP server
pub struct AnalyzerServer {
    state: AppState,
}

impl AnalyzerServer {
    /// Wrap already-initialized state
    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let server_config = &self.state.config().server;

        let router = Router::new()
            .route("/", get(root))
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .merge(routes::api_routes(server_config.max_upload_size))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if server_config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting analysis server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }
}

/// Liveness banner
async fn root() -> Json<Value> {
    Json(json!({ "message": "Financial Document Analyzer API is running" }))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> axum::http::StatusCode {
    if state.is_ready() {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}
