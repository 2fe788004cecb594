//! Document upload endpoints

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Json,
};

use super::json_body;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::server::tenant::TenantId;
use crate::types::response::{DocumentUploadResponse, FileUploadResponse};
use crate::types::{DocumentUploadRequest, UploadedFile};

/// POST /documents - Embed and store one text document
pub async fn upload_document(
    State(state): State<AppState>,
    TenantId(tenant): TenantId,
    payload: std::result::Result<Json<DocumentUploadRequest>, JsonRejection>,
) -> Result<Json<DocumentUploadResponse>> {
    let request = json_body(payload)?;

    let document_id = state
        .rag()
        .upload_document(&tenant, &request.text, request.metadata)
        .await?;

    Ok(Json(DocumentUploadResponse {
        success: true,
        document_id,
        message: "Document uploaded successfully".to_string(),
        tenant_id: tenant.to_string(),
    }))
}

/// POST /upload-files - Parse, chunk and store PDF files
pub async fn upload_files(
    State(state): State<AppState>,
    TenantId(tenant): TenantId,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<FileUploadResponse>> {
    let mut multipart =
        multipart.map_err(|e| Error::BadRequest(format!("Expected multipart form data: {}", e)))?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        // Only parts carrying a filename are files
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read file '{}': {}", filename, e)))?;

        tracing::debug!(tenant = %tenant, filename = %filename, bytes = data.len(), "Received file");
        files.push(UploadedFile::new(filename, data.to_vec()));
    }

    let outcome = state.rag().upload_files(&tenant, files).await?;

    Ok(Json(FileUploadResponse {
        success: true,
        files_processed: outcome.files_processed,
        total_chunks: outcome.total_chunks,
        message: format!(
            "Successfully uploaded {} file(s) with {} chunks",
            outcome.files_processed, outcome.total_chunks
        ),
        document_ids: outcome.document_ids,
        tenant_id: tenant.to_string(),
    }))
}
