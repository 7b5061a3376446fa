//! In-memory shopping cart.
//!
//! [`CartStore`] is a cheaply cloneable handle: every clone sees the same
//! lines. All mutation goes through its methods, each of which holds the
//! write lock for its whole duration, so readers never observe a
//! half-applied change. Totals are derived on every read.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pocketshop_core::{Price, ProductId, Quantity};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Product;

/// One cart line: a product and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: Quantity,
}

impl CartItem {
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.unit_price().times(self.quantity)
    }
}

/// What [`CartStore::add_to_cart`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added,
    /// An existing line's quantity was replaced.
    Updated,
    /// The line already had that quantity.
    Unchanged,
}

/// Lines and total read under a single lock.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Price,
}

impl CartSnapshot {
    /// Number of distinct lines.
    #[must_use]
    pub fn badge_count(&self) -> usize {
        self.items.len()
    }
}

/// Shared cart handle.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    items: Arc<RwLock<Vec<CartItem>>>,
}

impl CartStore {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the line list half
    // written: every mutation is a single push, assignment or retain.
    fn read(&self) -> RwLockReadGuard<'_, Vec<CartItem>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<CartItem>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put `quantity` of `product` in the cart.
    ///
    /// If the product is already in the cart its quantity is replaced, not
    /// incremented; otherwise a new line is appended.
    pub fn add_to_cart(&self, product: &Product, quantity: Quantity) -> CartChange {
        let mut items = self.write();
        let change = match items.iter_mut().find(|item| item.id() == product.id) {
            Some(item) if item.quantity == quantity => CartChange::Unchanged,
            Some(item) => {
                item.quantity = quantity;
                CartChange::Updated
            }
            None => {
                items.push(CartItem {
                    product: product.clone(),
                    quantity,
                });
                CartChange::Added
            }
        };
        drop(items);

        debug!(product_id = %product.id, %quantity, ?change, "Cart updated");
        change
    }

    /// Remove a product's line. Returns whether anything was removed.
    pub fn remove_from_cart(&self, id: ProductId) -> bool {
        let mut items = self.write();
        let before = items.len();
        items.retain(|item| item.id() != id);
        let removed = items.len() != before;
        drop(items);

        if removed {
            debug!(product_id = %id, "Removed from cart");
        }
        removed
    }

    /// Remove every line.
    pub fn clear_cart(&self) {
        self.write().clear();
        debug!("Cart cleared");
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.read().clone()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.read().iter().map(CartItem::line_total).sum()
    }

    /// Quantity of `id` in the cart, if present.
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> Option<Quantity> {
        self.read()
            .iter()
            .find(|item| item.id() == id)
            .map(|item| item.quantity)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Count shown on the cart badge.
    #[must_use]
    pub fn badge_count(&self) -> usize {
        self.len()
    }

    /// Lines and their total, consistent with each other.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let items = self.read().clone();
        let total = items.iter().map(CartItem::line_total).sum();
        CartSnapshot { items, total }
    }
}
