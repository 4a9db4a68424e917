//! # tally-core: Cart Totals Engine
//!
//! Computes the priced, discounted contents of a shopping cart: per-item
//! subtotals, a grand total, and a signed record of which promotion changed
//! what and by how much.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tally-cli (scenario runner)                     │   │
//! │  │     config file + env ──► scenario.toml ──► JSON report         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │  │  engine   │  │  totals   │  │ templates │  │   │
//! │  │   │ CartState │  │ 4 stages  │  │ CartTotals│  │ discounts │  │   │
//! │  │   │ counters  │  │ converge  │  │  report   │  │  bundles  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • EXACT DECIMALS • DETERMINISTIC ORDER                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - Mutable cart container, the entry point for callers
//! - [`engine`] - The four-stage totals pipeline
//! - [`totals`] - Immutable result with rounding and reporting queries
//! - [`promotion`] - The promotion trait and its four hooks
//! - [`templates`] - Ready-made promotions
//! - [`decimal`] - Exact decimal wrapper with explicit scales
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks at the cart boundary
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::cart::CartState;
//! use tally_core::item::Product;
//! use tally_core::templates::{FreeItem, PercentageDiscount};
//! use tally_core::{CartKey, DecimalValue};
//!
//! let mut cart = CartState::new();
//! cart.add_item(Product::new("A", "product", 200).into_ref(), 2).unwrap();
//! cart.add_item(Product::new("B", "product", 120).into_ref(), 2).unwrap();
//!
//! cart.add_promotion(
//!     FreeItem::new("B_FREE", CartKey::new("B", "product"), 1).unwrap().into_ref(),
//! );
//! cart.add_promotion(
//!     PercentageDiscount::new("TEN", DecimalValue::from_int(10)).unwrap().into_ref(),
//! );
//!
//! // (400 × 0.9) + ((240 - 120) × 0.9)
//! let totals = cart.perform_totals().unwrap();
//! assert_eq!(totals.total(), DecimalValue::from_int(468));
//! assert_eq!(totals.savings(), DecimalValue::from_int(172));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod config;
pub mod context;
pub mod counter;
pub mod decimal;
pub mod diff;
pub mod engine;
pub mod error;
pub mod filter;
pub mod identity;
pub mod impact;
pub mod item;
pub mod promotion;
pub mod report;
pub mod snapshot;
pub mod templates;
pub mod totals;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::CartState;
pub use config::{CartConfig, RemovalFloor};
pub use counter::ItemCounter;
pub use decimal::DecimalValue;
pub use error::{ConvergenceStage, CoreError, CoreResult, ValidationError};
pub use filter::ItemFilter;
pub use identity::{CartKey, Identity};
pub use item::{CartItem, ItemRef, Product};
pub use promotion::{Promotion, PromotionRef};
pub use report::TotalsReport;
pub use totals::CartTotals;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single item in cart.
///
/// Catches typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;
