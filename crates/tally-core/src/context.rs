//! # Promotion Calculations Context
//!
//! Per-call scratch space, partitioned by promotion key.
//!
//! ```text
//! perform_totals()
//!   ├── PromoCalculationsContext::new()     fresh, empty
//!   ├── stage 3: BUNDLE.set_value("bundles", 2)   item A
//!   │            BUNDLE.value("bundles") → 2      item B (same call)
//!   ├── stage 4: ...
//!   └── dropped                             never reused
//! ```
//!
//! Values are stored as JSON so a promotion can keep any serde type without
//! the engine knowing about it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::identity::CartKey;

/// Promotion-keyed key/value store, created once per totals computation.
#[derive(Debug, Default)]
pub struct PromoCalculationsContext {
    values: HashMap<CartKey, HashMap<String, Value>>,
}

impl PromoCalculationsContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under `(promotion, key)`, replacing any previous one.
    pub fn set_value<T: Serialize>(
        &mut self,
        promotion: &CartKey,
        key: &str,
        value: &T,
    ) -> CoreResult<()> {
        let value = serde_json::to_value(value).map_err(|source| CoreError::ContextValue {
            key: key.to_string(),
            source,
        })?;
        self.values
            .entry(promotion.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Reads a value back; `Ok(None)` when nothing was stored.
    pub fn value<T: DeserializeOwned>(&self, promotion: &CartKey, key: &str) -> CoreResult<Option<T>> {
        match self.values.get(promotion).and_then(|slot| slot.get(key)) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| CoreError::ContextValue {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Checks if a value was stored.
    pub fn has_value(&self, promotion: &CartKey, key: &str) -> bool {
        self.values
            .get(promotion)
            .is_some_and(|slot| slot.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_partitioned_by_promotion() {
        let first = CartKey::new("P1", "promotion");
        let second = CartKey::new("P2", "promotion");
        let mut context = PromoCalculationsContext::new();

        context.set_value(&first, "count", &3_i64).unwrap();

        assert_eq!(context.value::<i64>(&first, "count").unwrap(), Some(3));
        assert_eq!(context.value::<i64>(&second, "count").unwrap(), None);
        assert!(context.has_value(&first, "count"));
        assert!(!context.has_value(&second, "count"));
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let promo = CartKey::new("P1", "promotion");
        let mut context = PromoCalculationsContext::new();
        context.set_value(&promo, "label", &"ten").unwrap();

        let result = context.value::<i64>(&promo, "label");
        assert!(matches!(result, Err(CoreError::ContextValue { .. })));
    }
}
