//! Application state shared across views.

use std::sync::Arc;

use pocketshop_core::ProductId;

use crate::cart::CartStore;
use crate::catalog::{CatalogClient, CatalogError};
use crate::config::StorefrontConfig;
use crate::detail::ProductDetailView;
use crate::listing::ListHandle;

/// Application state shared across all views.
///
/// This struct is cheaply cloneable via `Arc`. The catalog client and the
/// cart live as long as the application; list sessions and detail views are
/// created per screen.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<CatalogClient>,
    cart: CartStore,
}

impl AppState {
    /// Create a new application state with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, CatalogError> {
        let catalog = CatalogClient::new(&config.catalog)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: Arc::new(catalog),
                cart: CartStore::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog API client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// The application's cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Start a product list session.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn list_session(&self) -> ListHandle {
        ListHandle::spawn(Arc::clone(&self.inner.catalog), self.inner.config.listing)
    }

    /// Load a product's detail view.
    pub async fn product_detail(&self, id: ProductId) -> ProductDetailView {
        ProductDetailView::load(self.catalog(), self.cart().clone(), id).await
    }
}
