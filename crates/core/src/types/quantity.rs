//! Cart line quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at one; removing an item is a separate operation.
    #[error("quantity must be at least 1")]
    Zero,
    /// The requested quantity exceeds what a single line may hold.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// The number of units of one product in a cart line.
///
/// Invalid quantities are rejected here, at the input boundary, so the cart
/// store never has to deal with them.
///
/// ## Constraints
///
/// - At least 1
/// - At most [`Quantity::MAX`] (the quantity selector offers `1..=10`)
///
/// ## Examples
///
/// ```
/// use pocketshop_core::Quantity;
///
/// assert!(Quantity::new(1).is_ok());
/// assert!(Quantity::new(10).is_ok());
/// assert!(Quantity::new(0).is_err());
/// assert!(Quantity::new(11).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Smallest selectable quantity.
    pub const ONE: Self = Self(1);

    /// Largest selectable quantity.
    pub const MAX: u32 = 10;

    /// Create a validated quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is zero or greater than [`Quantity::MAX`].
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::Zero);
        }
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// All quantities a selector may offer, in ascending order.
    pub fn choices() -> impl Iterator<Item = Self> {
        (1..=Self::MAX).map(Self)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl std::str::FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Anything unparseable is treated as out of range rather than a new error kind.
        s.trim()
            .parse::<u32>()
            .map_err(|_| QuantityError::TooLarge { max: Self::MAX })
            .and_then(Self::new)
    }
}
