//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Totals engine + cart mutation errors           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-cli errors (host app)                                           │
//! │  └── CliError         - I/O, TOML, JSON + wrapped CoreError            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CliError → stderr                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Classes
//! | Class        | Variants                                   | Handling          |
//! |--------------|--------------------------------------------|-------------------|
//! | Programming  | `DiffInconsistency`, `ConvergenceLimit`    | abort computation |
//! | Domain       | `DivisionByZero`, `InvalidRoundingScale`   | surface to caller |
//! | Mutation     | `ItemNotFound`, `BindingTargetMissing`     | surface to caller |
//!
//! Lookups (`quantity_of`, `item_quantity`) never error: they return `None`.

use thiserror::Error;

use crate::identity::CartKey;

// =============================================================================
// Core Error
// =============================================================================

/// Core totals-engine errors.
///
/// Nothing in this crate retries. Every variant that a promotion hook
/// returns propagates unchanged out of `CartState::perform_totals()`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Division by a zero decimal value.
    #[error("Division by zero (dividend {dividend})")]
    DivisionByZero { dividend: String },

    /// A rounding scale below zero was configured.
    #[error("Invalid rounding scale {scale}: must not be negative")]
    InvalidRoundingScale { scale: i32 },

    /// A decimal could not be constructed from its input.
    #[error("Invalid decimal '{input}': {reason}")]
    InvalidDecimal { input: String, reason: String },

    /// The diff of two collections found a key in the delta map that
    /// neither source collection contains.
    ///
    /// ## When This Occurs
    /// Never, unless stages disagree about the keys they hand each other.
    /// It is an internal inconsistency, so the computation aborts.
    #[error("Diff inconsistency: key {key} missing from both collections")]
    DiffInconsistency { key: String },

    /// A fixed-point stage kept restarting past the configured guard.
    ///
    /// ## When This Occurs
    /// ```text
    /// promo A: "remove B"   ──►  restart
    /// promo B: "remove A"   ──►  restart   (B re-added A's removal target)
    /// promo A: "remove B"   ──►  restart
    /// ...                        ConvergenceLimit { restarts: 1000 }
    /// ```
    #[error("{stage} did not converge after {restarts} restarts")]
    ConvergenceLimit {
        stage: ConvergenceStage,
        restarts: usize,
    },

    /// Mutation of an item that is not in the cart.
    #[error("Cart item not found: {0}")]
    ItemNotFound(CartKey),

    /// Removal of a promotion that is not registered.
    #[error("Promotion not found: {0}")]
    PromotionNotFound(CartKey),

    /// A bound item was added before the item it is bound to.
    #[error("Bound item {bound} targets {target}, which is not in the cart")]
    BindingTargetMissing { bound: CartKey, target: CartKey },

    /// A calculation context value failed to (de)serialize.
    #[error("Context value '{key}' could not be converted: {source}")]
    ContextValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// The fixed-point stage that tripped the convergence guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStage {
    /// Stage 1: promotions rewriting the promotion list.
    Promotions,
    /// Stage 2: promotions rewriting the item counters.
    Items,
}

impl std::fmt::Display for ConvergenceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvergenceStage::Promotions => write!(f, "Promotion convergence"),
            ConvergenceStage::Items => write!(f, "Item convergence"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any cart state changes, so a failed call leaves the
/// cart untouched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ConvergenceLimit {
            stage: ConvergenceStage::Items,
            restarts: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Item convergence did not converge after 1000 restarts"
        );

        let err = CoreError::InvalidRoundingScale { scale: -2 };
        assert_eq!(
            err.to_string(),
            "Invalid rounding scale -2: must not be negative"
        );
    }

    #[test]
    fn test_key_in_error_message() {
        let err = CoreError::ItemNotFound(CartKey::new("A", "product"));
        assert_eq!(err.to_string(), "Cart item not found: A________product");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "cart_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
