//! # Collection Diffs
//!
//! Correlates two collections by key and reports signed changes.
//!
//! ```text
//! promotions: set semantics        items: quantity semantics
//! before {P1, P2}                  before { A: 2, B: 1 }
//! after  {P1, P3}                  after  { A: 3,       C: 1 }
//! diff   P2 -1, P3 +1              diff   A +1, B -1, C +1
//! ```
//!
//! Both diffs first build a key → delta map, then resolve every non-zero
//! delta back to an entity. A key that resolves to nothing is an internal
//! inconsistency and aborts the computation.

use indexmap::IndexMap;

use crate::counter::ItemCounter;
use crate::error::{CoreError, CoreResult};
use crate::identity::CartKey;
use crate::impact::{ItemDifference, PromotionDifference};
use crate::promotion::PromotionRef;

/// Keys a promotion list, keeping the first occurrence of each key.
pub fn keyed_promotions(promotions: &[PromotionRef]) -> IndexMap<CartKey, PromotionRef> {
    let mut keyed = IndexMap::new();
    for promotion in promotions {
        keyed
            .entry(promotion.key())
            .or_insert_with(|| promotion.clone());
    }
    keyed
}

/// Set difference of two promotion lists by key.
pub fn promotion_diff(
    before: &[PromotionRef],
    after: &[PromotionRef],
) -> CoreResult<Vec<PromotionDifference>> {
    let before = keyed_promotions(before);
    let after = keyed_promotions(after);

    let mut deltas: IndexMap<CartKey, i64> = IndexMap::new();
    for key in before.keys() {
        *deltas.entry(key.clone()).or_insert(0) -= 1;
    }
    for key in after.keys() {
        *deltas.entry(key.clone()).or_insert(0) += 1;
    }

    let mut differences = Vec::new();
    for (key, difference) in deltas {
        if difference == 0 {
            continue;
        }
        let promotion = after
            .get(&key)
            .or_else(|| before.get(&key))
            .ok_or_else(|| CoreError::DiffInconsistency {
                key: key.to_string(),
            })?;
        differences.push(PromotionDifference {
            promotion: promotion.clone(),
            difference,
        });
    }
    Ok(differences)
}

/// Quantity difference of two keyed counter collections.
pub fn item_diff(
    before: &IndexMap<CartKey, ItemCounter>,
    after: &IndexMap<CartKey, ItemCounter>,
) -> CoreResult<Vec<ItemDifference>> {
    let mut deltas: IndexMap<CartKey, i64> = IndexMap::new();
    for (key, counter) in before {
        *deltas.entry(key.clone()).or_insert(0) -= counter.quantity;
    }
    for (key, counter) in after {
        *deltas.entry(key.clone()).or_insert(0) += counter.quantity;
    }

    let mut differences = Vec::new();
    for (key, difference) in deltas {
        if difference == 0 {
            continue;
        }
        let counter = after
            .get(&key)
            .or_else(|| before.get(&key))
            .ok_or_else(|| CoreError::DiffInconsistency {
                key: key.to_string(),
            })?;
        differences.push(ItemDifference {
            item: counter.item.clone(),
            difference,
        });
    }
    Ok(differences)
}
