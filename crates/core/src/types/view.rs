//! Product list presentation modes.

use serde::{Deserialize, Serialize};

/// How the product list is presented and paged.
///
/// - `Grid` shows one page at a time with discrete page navigation.
/// - `List` accumulates pages as the reader approaches the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grid => write!(f, "grid"),
            Self::List => write!(f, "list"),
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "list" => Ok(Self::List),
            _ => Err(format!("invalid view mode: {s}")),
        }
    }
}
