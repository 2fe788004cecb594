//! API routes for the RAG server

pub mod documents;
pub mod query;
pub mod tenant;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    routing::{delete, get, post},
    Json, Router,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Build all tenant-scoped API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion
        .route("/documents", post(documents::upload_document))
        .route(
            "/upload-files",
            post(documents::upload_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Query
        .route("/query", post(query::query_rag))
        // Tenant management
        .route("/tenant", delete(tenant::delete_tenant))
        .route("/tenant/stats", get(tenant::tenant_stats))
        .route("/tenant/documents", get(tenant::list_documents))
        .route("/tenant/documents/:filename", delete(tenant::delete_document))
}

/// Unwrap a JSON body, reporting malformed payloads as validation errors
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::Validation(rejection.body_text()))
}
