//! Catalog REST client implementation.
//!
//! Caches product details and unfiltered browse pages using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use pocketshop_core::ProductId;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{CatalogError, Product, ProductPage, ProductSource, SearchQuery};
use crate::config::CatalogConfig;

/// Maximum characters of a response body kept for logs and errors.
const BODY_EXCERPT_CHARS: usize = 200;

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the remote product catalog.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("cached", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                cache,
            }),
        })
    }

    /// Base URL every request path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Issue a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %excerpt(&response_text),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: excerpt(&response_text),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&response_text),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Search products, one page at a time.
    ///
    /// An empty term is a valid query and returns the unfiltered catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response is malformed.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_products(&self, query: &SearchQuery) -> Result<ProductPage, CatalogError> {
        // Only unfiltered browse pages are cached
        let cache_key = query.term().is_empty().then(|| CacheKey::Browse {
            limit: query.limit(),
            skip: query.skip(),
        });

        if let Some(key) = &cache_key
            && let Some(CacheValue::Page(page)) = self.cached(key).await
        {
            debug!("Cache hit for browse page");
            return Ok(page);
        }

        let mut url = self.inner.base_url.join("products/search")?;
        url.query_pairs_mut().extend_pairs(query.params());

        let page: ProductPage = self.get_json(url).await?;
        debug!(
            returned = page.products.len(),
            total = page.total,
            "Fetched product page"
        );

        if let Some(key) = cache_key {
            self.store(key, CacheValue::Page(page.clone())).await;
        }

        Ok(page)
    }

    /// Get a single product with reviews, dimensions and metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the API has no such product, or
    /// another error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.inner.base_url.join(&format!("products/{id}"))?;

        let product: Product = match self.get_json(url).await {
            Ok(product) => product,
            Err(CatalogError::Status { status: 404, .. }) => {
                return Err(CatalogError::NotFound(id));
            }
            Err(e) => return Err(e),
        };

        self.store(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}

impl ProductSource for CatalogClient {
    async fn search(&self, query: &SearchQuery) -> Result<ProductPage, CatalogError> {
        self.search_products(query).await
    }

    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.get_product(id).await
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
