//! Tenant data management endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::server::tenant::TenantId;
use crate::types::response::{
    DocumentDeleteResponse, TenantDeleteResponse, TenantDocumentsResponse, TenantStatsResponse,
};

/// DELETE /tenant - Remove all of the tenant's data
pub async fn delete_tenant(
    State(state): State<AppState>,
    TenantId(tenant): TenantId,
) -> Result<Json<TenantDeleteResponse>> {
    let documents_deleted = state.rag().delete_tenant(&tenant).await?;

    Ok(Json(TenantDeleteResponse {
        success: true,
        message: "Tenant data deleted successfully".to_string(),
        tenant_id: tenant.to_string(),
        documents_deleted,
    }))
}

/// GET /tenant/stats
pub async fn tenant_stats(
    State(state): State<AppState>,
    TenantId(tenant): TenantId,
) -> Result<Json<TenantStatsResponse>> {
    let stats = state.rag().tenant_stats(&tenant).await?;

    Ok(Json(TenantStatsResponse {
        tenant_id: tenant.to_string(),
        namespace: stats.namespace,
        document_count: stats.entry_count,
    }))
}

/// GET /tenant/documents - Unique filenames uploaded by the tenant
pub async fn list_documents(
    State(state): State<AppState>,
    TenantId(tenant): TenantId,
) -> Result<Json<TenantDocumentsResponse>> {
    let documents = state.rag().list_documents(&tenant).await?;

    Ok(Json(TenantDocumentsResponse {
        tenant_id: tenant.to_string(),
        documents,
    }))
}

/// DELETE /tenant/documents/:filename
pub async fn delete_document(
    State(state): State<AppState>,
    TenantId(tenant): TenantId,
    Path(filename): Path<String>,
) -> Result<Json<DocumentDeleteResponse>> {
    state.rag().delete_document(&tenant, &filename).await?;

    Ok(Json(DocumentDeleteResponse {
        success: true,
        message: format!("Document {} deleted", filename),
        tenant_id: tenant.to_string(),
    }))
}
