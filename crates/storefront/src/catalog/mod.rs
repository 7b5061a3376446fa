//! Remote product catalog API client.
//!
//! # Architecture
//!
//! - Plain REST + JSON over `reqwest`
//! - The remote API is the source of truth - nothing is persisted locally
//! - In-memory caching via `moka` for product details and unfiltered browse
//!   pages (TTL from configuration)
//!
//! # Endpoints
//!
//! - `GET /products/search?q={term}&limit={n}&skip={m}` - paged search
//! - `GET /products/{id}` - single product with reviews and metadata
//!
//! # Example
//!
//! ```rust,ignore
//! use pocketshop_storefront::catalog::{CatalogClient, ProductSource, SearchQuery};
//!
//! let client = CatalogClient::new(&config.catalog)?;
//!
//! let page = client.search(&SearchQuery::new("phone", 1, 20)).await?;
//! let product = client.product(page.products[0].id).await?;
//! ```

mod cache;
mod client;
pub mod query;
pub mod types;

use std::future::Future;

use pocketshop_core::ProductId;
use thiserror::Error;

pub use client::CatalogClient;
pub use query::SearchQuery;
pub use types::*;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Start of the response body, for diagnostics.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The requested product does not exist.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Something that can answer catalog queries.
///
/// [`CatalogClient`] is the production implementation; tests substitute
/// scripted sources to control timing and responses.
pub trait ProductSource: Send + Sync + 'static {
    /// Fetch one page of search results.
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<ProductPage, CatalogError>> + Send;

    /// Fetch a single product by ID.
    fn product(&self, id: ProductId)
    -> impl Future<Output = Result<Product, CatalogError>> + Send;
}
