//! HTTP server for the multi-tenant RAG API

pub mod routes;
pub mod state;
pub mod tenant;

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::types::response::HealthResponse;
use state::AppState;

/// Crate version reported by `/` and `/health`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// RAG HTTP Server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a new server, building providers from configuration
    pub async fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server and run until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting {} on http://{}", self.config.app.name, addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Shutting down {}", self.config.app.name);
        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Router over `state`: service info, health and the tenant API
pub fn build_router(state: AppState) -> Router {
    let config = state.config();
    let cors = cors_layer(&config.server.allowed_origins);

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));
    if !config.is_production() {
        router = router.route("/info", get(info));
    }

    router
        .merge(routes::api_routes(config.server.max_upload_size))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}

/// CORS for the configured origins; `*` allows any origin without credentials
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::DELETE]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any).allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(allowed))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// GET / - Service information
async fn root(State(state): State<AppState>) -> Json<Value> {
    let config = state.config();
    let docs = if config.is_production() {
        "disabled in production"
    } else {
        "/info"
    };

    Json(json!({
        "name": config.app.name,
        "version": VERSION,
        "environment": config.app.environment,
        "docs": docs,
    }))
}

/// GET /health - Liveness for load balancers
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        environment: state.config().app.environment.clone(),
        version: VERSION.to_string(),
    })
}

/// GET /info - Endpoint overview
async fn info(State(state): State<AppState>) -> Json<Value> {
    let rag = state.rag();
    Json(json!({
        "name": state.config().app.name,
        "version": VERSION,
        "tenant_header": "X-Tenant-ID",
        "providers": {
            "embeddings": rag.embedder().name(),
            "llm": rag.llm().name(),
            "vector_store": rag.store().name(),
        },
        "endpoints": {
            "GET /health": "Liveness check",
            "POST /documents": "Upload a text document",
            "POST /upload-files": "Upload PDF files (multipart)",
            "POST /query": "Ask a question over the tenant's documents",
            "DELETE /tenant": "Delete all tenant data",
            "GET /tenant/stats": "Stored entry count",
            "GET /tenant/documents": "List uploaded filenames",
            "DELETE /tenant/documents/:filename": "Delete one uploaded file"
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_wildcard_and_lists() {
        // Constructing the layers must not panic for either shape
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&[
            "http://localhost:3000".to_string(),
            "http://localhost:8000".to_string(),
        ]);
    }
}
