//! Cache types for catalog API responses.

use pocketshop_core::ProductId;

use super::types::{Product, ProductPage};

/// Cache key for products and product pages.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    /// Unfiltered browse pages only; search results are never cached.
    Browse { limit: u32, skip: u32 },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Page(ProductPage),
}
