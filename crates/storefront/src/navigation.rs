//! Navigation intents emitted by the view models.
//!
//! The core never routes by itself. Views hand these intents to whatever
//! owns the screen stack (the CLI shell keeps a simple history).

use pocketshop_core::ProductId;

/// Where the user wants to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// The product list.
    Catalog,
    /// A product's detail view.
    Product(ProductId),
    /// The cart.
    Cart,
    /// Whatever was shown before.
    Back,
}

impl Intent {
    /// Route path for this intent, or `None` for [`Intent::Back`], which
    /// depends on history.
    #[must_use]
    pub fn path(self) -> Option<String> {
        match self {
            Self::Catalog => Some("/".to_string()),
            Self::Product(id) => Some(format!("/product/{id}")),
            Self::Cart => Some("/cart".to_string()),
            Self::Back => None,
        }
    }
}
