//! `X-Tenant-ID` header extractor

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::Error;
use crate::tenant::Tenant;

/// Request header carrying the tenant id
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Validated tenant of the current request; rejects with 401
#[derive(Debug, Clone)]
pub struct TenantId(pub Tenant);

#[async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = match parts.headers.get(TENANT_HEADER) {
            Some(raw) => Some(raw.to_str().map_err(|_| {
                Error::invalid_tenant(
                    "Invalid tenant ID format. Only alphanumeric characters, hyphens, and underscores are allowed.",
                )
            })?),
            None => None,
        };

        Ok(TenantId(Tenant::from_header(value)?))
    }
}
