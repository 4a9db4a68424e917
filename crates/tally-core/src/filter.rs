//! # Item Type Filters
//!
//! Selects items by `cart_type` using a compact condition string.
//!
//! | Condition            | Meaning                         |
//! |----------------------|---------------------------------|
//! | `"~"` or `""`        | every item                      |
//! | `"product,service"`  | type is one of the listed types |
//! | `"~gift"`            | type is none of the listed      |
//!
//! ## Example
//! ```rust
//! use tally_core::filter::ItemFilter;
//!
//! let filter: ItemFilter = "~gift,fee".parse().unwrap();
//! assert!(filter.matches_type("product"));
//! assert!(!filter.matches_type("gift"));
//! ```

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::identity::Identity;

/// Cart type condition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemFilter {
    /// Matches every item.
    #[default]
    All,

    /// Matches items whose type is listed.
    AnyOf(Vec<String>),

    /// Matches items whose type is not listed.
    NoneOf(Vec<String>),
}

impl ItemFilter {
    /// Parses a condition string. Never fails; unknown types simply match
    /// nothing (or everything, when negated).
    pub fn parse(condition: &str) -> Self {
        let condition = condition.trim();
        let (negated, list) = match condition.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, condition),
        };

        let types: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        match (negated, types.is_empty()) {
            (_, true) => ItemFilter::All,
            (true, false) => ItemFilter::NoneOf(types),
            (false, false) => ItemFilter::AnyOf(types),
        }
    }

    /// Whether a cart type passes the filter.
    pub fn matches_type(&self, cart_type: &str) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::AnyOf(types) => types.iter().any(|t| t == cart_type),
            ItemFilter::NoneOf(types) => !types.iter().any(|t| t == cart_type),
        }
    }

    /// Whether an entity passes the filter.
    pub fn matches<I: Identity + ?Sized>(&self, entity: &I) -> bool {
        self.matches_type(entity.cart_type())
    }
}

impl FromStr for ItemFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ItemFilter::parse(s))
    }
}

impl From<String> for ItemFilter {
    fn from(value: String) -> Self {
        ItemFilter::parse(&value)
    }
}

impl From<ItemFilter> for String {
    fn from(value: ItemFilter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ItemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemFilter::All => write!(f, "~"),
            ItemFilter::AnyOf(types) => write!(f, "{}", types.join(",")),
            ItemFilter::NoneOf(types) => write!(f, "~{}", types.join(",")),
        }
    }
}
