//! Tenant identifier validation and namespace derivation
//!
//! A tenant id arrives in the `X-Tenant-ID` header. It is validated once and
//! then mapped onto the storage namespace that isolates its vectors.
//!
//! The namespace transform lowercases, so `Acme` and `acme` share a namespace.
//! This collision is inherent to the scheme and is left as is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{Error, Result};

/// Minimum tenant id length (after trimming)
pub const MIN_TENANT_LEN: usize = 3;
/// Maximum tenant id length (after trimming)
pub const MAX_TENANT_LEN: usize = 64;

static TENANT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+$").expect("tenant pattern is a valid regex")
});

static NAMESPACE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]").expect("namespace pattern is a valid regex"));

/// A validated tenant identifier (trimmed, case preserved)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tenant(String);

impl Tenant {
    /// Validate a raw header value
    pub fn validate(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(Error::invalid_tenant("X-Tenant-ID header cannot be empty"));
        }

        if !TENANT_PATTERN.is_match(trimmed) {
            return Err(Error::invalid_tenant(
                "Invalid tenant ID format. Only alphanumeric characters, hyphens, and underscores are allowed.",
            ));
        }

        // Pattern is ASCII-only, so byte length equals char count here
        if trimmed.len() < MIN_TENANT_LEN || trimmed.len() > MAX_TENANT_LEN {
            return Err(Error::invalid_tenant(format!(
                "Tenant ID must be between {} and {} characters",
                MIN_TENANT_LEN, MAX_TENANT_LEN
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Validate an optional header value, treating absence as an error
    pub fn from_header(value: Option<&str>) -> Result<Self> {
        match value {
            Some(raw) => Self::validate(raw),
            None => Err(Error::invalid_tenant("Missing X-Tenant-ID header")),
        }
    }

    /// The tenant id as supplied by the client
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage namespace for this tenant
    pub fn namespace(&self) -> String {
        to_namespace(&self.0)
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tenant {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Map any identifier to a namespace key: lowercase, then replace every
/// character outside `[a-z0-9_-]` with `_`.
pub fn to_namespace(tenant_id: &str) -> String {
    let lowered = tenant_id.to_lowercase();
    NAMESPACE_DISALLOWED.replace_all(&lowered, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_ids() {
        for raw in ["", "   ", "ab", "bad@tenant", "has space", "wow!", "invalid@tenant!"] {
            let result = Tenant::validate(raw);
            assert!(
                matches!(result, Err(Error::InvalidTenant(_))),
                "expected {:?} to be rejected",
                raw
            );
        }

        let too_long = "a".repeat(65);
        assert!(Tenant::validate(&too_long).is_err());
    }

    #[test]
    fn test_accepts_valid_ids() {
        let tenant = Tenant::validate("tenant-1_ABC").unwrap();
        assert_eq!(tenant.as_str(), "tenant-1_ABC");

        let boundary = "b".repeat(64);
        assert!(Tenant::validate(&boundary).is_ok());
        assert!(Tenant::validate("abc").is_ok());
    }

    #[test]
    fn test_trims_but_preserves_case() {
        let tenant = Tenant::validate("  Acme-Corp \n").unwrap();
        assert_eq!(tenant.as_str(), "Acme-Corp");
        assert_eq!(tenant.namespace(), "acme-corp");
    }

    #[test]
    fn test_missing_header() {
        let err = Tenant::from_header(None).unwrap_err();
        assert_eq!(err.to_string(), "Missing X-Tenant-ID header");
    }

    #[test]
    fn test_namespace_normalization() {
        assert_eq!(to_namespace("Tenant-1"), "tenant-1");
        assert_eq!(to_namespace("A!B"), "a_b");
        assert_eq!(to_namespace("x y.z"), "x_y_z");
    }

    #[test]
    fn test_namespace_is_idempotent() {
        for raw in ["Tenant-1", "A!B", "MiXeD_case-42", "ünï©ode", ""] {
            let once = to_namespace(raw);
            assert_eq!(to_namespace(&once), once);
        }
    }

    #[test]
    fn test_case_variants_share_namespace() {
        let upper = Tenant::validate("ACME").unwrap();
        let lower = Tenant::validate("acme").unwrap();
        assert_ne!(upper, lower);
        assert_eq!(upper.namespace(), lower.namespace());
    }
}
