//! Display-ready fetch failures.
//!
//! Everything that can go wrong while fetching is captured at the fetch
//! boundary and turned into a [`FetchError`], which views render inline.
//! Nothing past that boundary needs to handle [`CatalogError`] directly.

use thiserror::Error;

use crate::catalog::CatalogError;

/// Broad failure category, for choosing how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The request failed or the API returned a non-success status.
    Network,
    /// The API rejected the request for exceeding its rate limit.
    RateLimited,
    /// The API answered with something that could not be decoded.
    InvalidResponse,
    /// The requested resource does not exist.
    NotFound,
}

/// A failed fetch, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    /// Failure category.
    pub kind: FetchErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl FetchError {
    /// Create a fetch error.
    #[must_use]
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether the user can reasonably retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            FetchErrorKind::Network | FetchErrorKind::RateLimited
        )
    }
}

impl From<&CatalogError> for FetchError {
    fn from(err: &CatalogError) -> Self {
        // Don't expose transport internals to the user
        match err {
            CatalogError::Http(e) if e.is_timeout() => {
                Self::new(FetchErrorKind::Network, "The catalog took too long to respond")
            }
            CatalogError::Http(_) => {
                Self::new(FetchErrorKind::Network, "Failed to fetch products")
            }
            CatalogError::Status { status, .. } => Self::new(
                FetchErrorKind::Network,
                format!("The catalog returned an error (HTTP {status})"),
            ),
            CatalogError::RateLimited(secs) => Self::new(
                FetchErrorKind::RateLimited,
                format!("Too many requests, try again in {secs}s"),
            ),
            CatalogError::Parse(_) | CatalogError::InvalidUrl(_) => Self::new(
                FetchErrorKind::InvalidResponse,
                "Unexpected response from the catalog",
            ),
            CatalogError::NotFound(id) => {
                Self::new(FetchErrorKind::NotFound, format!("Product {id} not found"))
            }
        }
    }
}

impl From<CatalogError> for FetchError {
    fn from(err: CatalogError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pocketshop_core::ProductId;

    use super::*;

    #[test]
    fn test_status_maps_to_network() {
        let err = FetchError::from(CatalogError::Status {
            status: 500,
            body: "stack trace here".to_string(),
        });
        assert_eq!(err.kind, FetchErrorKind::Network);
        assert_eq!(err.to_string(), "The catalog returned an error (HTTP 500)");
        assert!(!err.message.contains("stack trace"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found() {
        let err = FetchError::from(CatalogError::NotFound(ProductId::new(999)));
        assert_eq!(err.kind, FetchErrorKind::NotFound);
        assert_eq!(err.message, "Product 999 not found");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rate_limited() {
        let err = FetchError::from(CatalogError::RateLimited(30));
        assert_eq!(err.kind, FetchErrorKind::RateLimited);
        assert_eq!(err.message, "Too many requests, try again in 30s");
    }

    #[test]
    fn test_parse_error_is_invalid_response() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = FetchError::from(CatalogError::Parse(parse));
        assert_eq!(err.kind, FetchErrorKind::InvalidResponse);
    }
}
