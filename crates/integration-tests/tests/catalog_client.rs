//! Catalog client against the fake product API.

#![allow(clippy::unwrap_used)]

use pocketshop_core::ProductId;
use pocketshop_integration_tests::{FakeCatalog, RETRY_AFTER_SECS};
use pocketshop_storefront::catalog::{CatalogClient, CatalogError, SearchQuery};
use pocketshop_storefront::error::{FetchError, FetchErrorKind};

fn client(fake: &FakeCatalog) -> CatalogClient {
    CatalogClient::new(&fake.config().catalog).unwrap()
}

#[tokio::test]
async fn test_search_sends_documented_query() {
    let fake = FakeCatalog::start().await;
    let client = client(&fake);

    let page = client
        .search_products(&SearchQuery::new("phone", 1, 20))
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.products.len(), 5);
    assert_eq!(
        fake.requests(),
        vec!["/products/search?q=phone&limit=20&skip=0"]
    );
}

#[tokio::test]
async fn test_second_page_uses_skip() {
    let fake = FakeCatalog::start().await;
    let client = client(&fake);

    let page = client
        .search_products(&SearchQuery::new("lamp", 2, 20))
        .await
        .unwrap();

    assert_eq!(page.total, 40);
    assert_eq!(page.skip, 20);
    assert_eq!(page.products.first().unwrap().id, ProductId::new(26));
    assert_eq!(page.products.last().unwrap().id, ProductId::new(45));
    assert_eq!(fake.searches_for("lamp"), vec!["/products/search?q=lamp&limit=20&skip=20"]);
}

#[tokio::test]
async fn test_search_term_is_url_encoded() {
    let fake = FakeCatalog::start().await;
    let client = client(&fake);

    let page = client
        .search_products(&SearchQuery::new("desk lamp", 1, 20))
        .await
        .unwrap();

    assert_eq!(page.total, 40);
    assert_eq!(
        fake.requests(),
        vec!["/products/search?q=desk+lamp&limit=20&skip=0"]
    );
}

#[tokio::test]
async fn test_no_matches_is_empty_page() {
    let fake = FakeCatalog::start().await;
    let page = client(&fake)
        .search_products(&SearchQuery::new("zzz", 1, 20))
        .await
        .unwrap();

    assert_eq!(page.total, 0);
    assert!(page.products.is_empty());
}

#[tokio::test]
async fn test_product_detail() {
    let fake = FakeCatalog::start().await;
    let product = client(&fake).get_product(ProductId::new(1)).await.unwrap();

    assert_eq!(product.title, "Phone Model 1");
    assert_eq!(product.unit_price().to_string(), "$100.00");
    assert_eq!(product.subtitle(), "Pocket • smartphones");
    assert_eq!(product.reviews.len(), 2);
    assert_eq!(product.sku.as_deref(), Some("PKT-PHN-001"));
    assert_eq!(
        product.meta.as_ref().unwrap().barcode.as_deref(),
        Some("1234567890123")
    );
    assert!(product.extra.contains_key("discountPercentage"));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let fake = FakeCatalog::start().await;
    let err = client(&fake)
        .get_product(ProductId::new(999))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::NotFound(id) if id == ProductId::new(999)));
    assert_eq!(FetchError::from(err).kind, FetchErrorKind::NotFound);
}

#[tokio::test]
async fn test_throttled_is_rate_limited() {
    let fake = FakeCatalog::start().await;
    fake.set_throttled(true);

    let err = client(&fake)
        .search_products(&SearchQuery::new("phone", 1, 20))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::RateLimited(secs) if secs == RETRY_AFTER_SECS));
}

#[tokio::test]
async fn test_product_details_are_cached() {
    let fake = FakeCatalog::start().await;
    let client = client(&fake);

    client.get_product(ProductId::new(1)).await.unwrap();
    client.get_product(ProductId::new(1)).await.unwrap();

    assert_eq!(fake.requests(), vec!["/products/1"]);
}

#[tokio::test]
async fn test_only_browse_pages_are_cached() {
    let fake = FakeCatalog::start().await;
    let client = client(&fake);
    let browse = SearchQuery::new("", 1, 20);
    let search = SearchQuery::new("phone", 1, 20);

    client.search_products(&browse).await.unwrap();
    client.search_products(&browse).await.unwrap();
    client.search_products(&search).await.unwrap();
    client.search_products(&search).await.unwrap();

    assert_eq!(fake.searches_for("").len(), 1);
    assert_eq!(fake.searches_for("phone").len(), 2);
}

#[tokio::test]
async fn test_cache_disabled_with_zero_ttl() {
    let fake = FakeCatalog::start().await;
    let mut config = fake.config();
    config.catalog.cache_ttl = std::time::Duration::ZERO;
    let client = CatalogClient::new(&config.catalog).unwrap();

    client.get_product(ProductId::new(2)).await.unwrap();
    client.get_product(ProductId::new(2)).await.unwrap();

    assert_eq!(fake.requests().len(), 2);
}
