//! Domain types for the remote product catalog.
//!
//! Field names follow the API's camelCase JSON. Anything the storefront does
//! not model explicitly is kept in [`Product::extra`] and passed through
//! untouched.

use chrono::{DateTime, Utc};
use pocketshop_core::{Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Product Types
// =============================================================================

/// A catalog product, read-only once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Category slug (e.g., "smartphones").
    #[serde(default)]
    pub category: String,
    /// Unit price in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Average rating, 0-5.
    #[serde(default)]
    pub rating: f64,
    /// Units in stock.
    #[serde(default)]
    pub stock: u32,
    /// Brand name, absent for unbranded goods.
    #[serde(default)]
    pub brand: Option<String>,
    /// Thumbnail URL.
    #[serde(default)]
    pub thumbnail: String,
    /// Full-size image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
    /// Weight in grams.
    #[serde(default)]
    pub weight: Option<f64>,
    /// Physical dimensions in centimetres.
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub warranty_information: Option<String>,
    #[serde(default)]
    pub shipping_information: Option<String>,
    #[serde(default)]
    pub return_policy: Option<String>,
    /// e.g. "In Stock", "Low Stock".
    #[serde(default)]
    pub availability_status: Option<String>,
    /// Customer reviews (only populated on detail fetches).
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Record metadata.
    #[serde(default)]
    pub meta: Option<ProductMeta>,
    /// Every other field the API sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    /// Unit price.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::usd(self.price)
    }

    /// "brand • category", or just the category for unbranded products.
    #[must_use]
    pub fn subtitle(&self) -> String {
        match self.brand.as_deref().filter(|b| !b.is_empty()) {
            Some(brand) => format!("{brand} • {}", self.category),
            None => self.category.clone(),
        }
    }

    /// First full-size image, falling back to the thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or(self.thumbnail.as_str(), String::as_str)
    }
}

/// Physical dimensions in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// A customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Star rating, 1-5.
    pub rating: u8,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_email: Option<String>,
}

/// Product record metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMeta {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Total matches across all pages.
    pub total: u32,
    /// Offset of the first product on this page.
    #[serde(default)]
    pub skip: u32,
    /// Requested page size.
    #[serde(default)]
    pub limit: u32,
}

impl ProductPage {
    /// Number of pages needed to show `total` products `limit` at a time.
    #[must_use]
    pub const fn page_count(&self, limit: u32) -> u32 {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(limit)
    }
}
