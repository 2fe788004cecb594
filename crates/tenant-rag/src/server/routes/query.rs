//! Query endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;

use super::json_body;
use crate::error::Result;
use crate::server::state::AppState;
use crate::server::tenant::TenantId;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - Answer a question from the tenant's documents
pub async fn query_rag(
    State(state): State<AppState>,
    TenantId(tenant): TenantId,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    let request = json_body(payload)?;

    let response = state.rag().query(&tenant, request).await?;

    tracing::info!(
        tenant = %tenant,
        sources = response.sources.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query answered"
    );
    Ok(Json(response))
}
