//! Product detail view model.
//!
//! Loads one product, tracks the quantity selector and derives the
//! add-to-cart button from the shared [`CartStore`]. Cart state is never
//! copied into the view model; it is read from the store on every call so
//! the view always reflects the cart's current contents.

use pocketshop_core::{Price, ProductId, Quantity};
use tracing::{instrument, warn};

use crate::cart::{CartChange, CartStore};
use crate::catalog::{CatalogError, Product, ProductSource};
use crate::error::FetchError;
use crate::navigation::Intent;

/// Loading state of the detail view.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    /// The catalog has no product with this ID.
    NotFound(ProductId),
    /// The fetch failed for another reason.
    Failed(FetchError),
    Loaded(Box<Product>),
}

/// Add-to-cart button label and availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartButton {
    /// Not in the cart yet.
    Add,
    /// In the cart with a different quantity.
    Update,
    /// In the cart with the selected quantity. Disabled.
    Added,
}

impl CartButton {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "Add to cart",
            Self::Update => "Update cart",
            Self::Added => "Added to cart",
        }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Added)
    }
}

/// Errors from detail view actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DetailError {
    #[error("product is not loaded")]
    NotLoaded,
}

/// View model for one product's detail screen.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    id: ProductId,
    state: DetailState,
    selected: Option<Quantity>,
    cart: CartStore,
}

impl ProductDetailView {
    /// A view that is still waiting for its product.
    #[must_use]
    pub const fn loading(id: ProductId, cart: CartStore) -> Self {
        Self {
            id,
            state: DetailState::Loading,
            selected: None,
            cart,
        }
    }

    /// Fetch the product and build the view.
    #[instrument(skip(source, cart))]
    pub async fn load<S: ProductSource>(source: &S, cart: CartStore, id: ProductId) -> Self {
        let result = source.product(id).await;
        let mut view = Self::loading(id, cart);
        view.resolve(result);
        view
    }

    /// Apply the fetch result.
    pub fn resolve(&mut self, result: Result<Product, CatalogError>) {
        self.state = match result {
            Ok(product) => DetailState::Loaded(Box::new(product)),
            Err(CatalogError::NotFound(id)) => DetailState::NotFound(id),
            Err(e) => {
                warn!(product_id = %self.id, error = %e, "Failed to load product");
                DetailState::Failed(FetchError::from(&e))
            }
        };
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> &DetailState {
        &self.state
    }

    /// The loaded product, if any.
    #[must_use]
    pub fn product(&self) -> Option<&Product> {
        match &self.state {
            DetailState::Loaded(product) => Some(product),
            _ => None,
        }
    }

    /// Quantity shown in the selector.
    ///
    /// The user's choice wins; otherwise the quantity already in the cart;
    /// otherwise one.
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.selected
            .or_else(|| self.cart.quantity_of(self.id))
            .unwrap_or(Quantity::ONE)
    }

    /// Choose a quantity in the selector.
    pub const fn select_quantity(&mut self, quantity: Quantity) {
        self.selected = Some(quantity);
    }

    /// Current button state, derived from the cart.
    #[must_use]
    pub fn button(&self) -> CartButton {
        match self.cart.quantity_of(self.id) {
            None => CartButton::Add,
            Some(in_cart) if in_cart == self.quantity() => CartButton::Added,
            Some(_) => CartButton::Update,
        }
    }

    /// Unit price times the selected quantity.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.product()
            .map(|product| product.unit_price().times(self.quantity()))
    }

    /// Put the selected quantity in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`DetailError::NotLoaded`] unless the product has loaded.
    pub fn add_to_cart(&mut self) -> Result<CartChange, DetailError> {
        let quantity = self.quantity();
        let product = self.product().ok_or(DetailError::NotLoaded)?;
        let change = self.cart.add_to_cart(product, quantity);
        self.selected = None;
        Ok(change)
    }

    /// Intent for the back button.
    #[must_use]
    pub const fn back(&self) -> Intent {
        Intent::Back
    }

    /// Intent for the cart button.
    #[must_use]
    pub const fn open_cart(&self) -> Intent {
        Intent::Cart
    }
}
