//! # Totals Engine
//!
//! Turns item counters and promotions into a [`CartTotals`] snapshot.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  counters (value copy)        eligible promotions                      │
//! │        │                             │                                  │
//! │        │          ┌──────────────────▼──────────────────┐              │
//! │        │          │ 1. promotion convergence            │  restart on  │
//! │        │          │    P.reduce_promotions(others) + P  │  set diff    │
//! │        │          └──────────────────┬──────────────────┘              │
//! │  ┌─────▼─────────────────────────────▼─────────────────┐              │
//! │  │ 2. item convergence                                 │  restart on  │
//! │  │    P.reduce_items(counters) → filter qty>0 → re-key │  qty diff    │
//! │  └─────┬───────────────────────────────────────────────┘              │
//! │  ┌─────▼───────────────────────────────────────────────┐              │
//! │  │ 3. subtotal reduction (per item, fold promotions)   │  clamp ≥ 0   │
//! │  └─────┬───────────────────────────────────────────────┘              │
//! │  ┌─────▼───────────────────────────────────────────────┐              │
//! │  │ 4. cross-item redistribution (per promotion)        │  clamp ≥ 0   │
//! │  └─────┬───────────────────────────────────────────────┘              │
//! │        ▼                                                               │
//! │   CartTotals                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Restart Policy
//! Stages 1 and 2 walk the list with an index. Any non-empty diff resets the
//! index to zero, so every promotion sees the latest list again. The number
//! of restarts per stage is capped by `max_convergence_restarts`.

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::config::CartConfig;
use crate::context::PromoCalculationsContext;
use crate::counter::{make_keyed, ItemCounter};
use crate::decimal::DecimalValue;
use crate::diff::{item_diff, keyed_promotions, promotion_diff};
use crate::error::{ConvergenceStage, CoreError, CoreResult};
use crate::identity::CartKey;
use crate::impact::{ItemPromoImpact, ItemSubtotal, PromoImpact};
use crate::promotion::{PromotionRef, SubtotalReducer};
use crate::snapshot::ModifiedCartData;
use crate::totals::{CartTotals, TotalsParts};

/// Runs the four reduction stages under one configuration.
#[derive(Debug, Clone, Copy)]
pub struct TotalsEngine<'a> {
    config: &'a CartConfig,
}

impl<'a> TotalsEngine<'a> {
    pub fn new(config: &'a CartConfig) -> Self {
        TotalsEngine { config }
    }

    /// Computes totals.
    ///
    /// `eligible` is the promotion list after eligibility filtering,
    /// `ineligible` the promotions that vetoed themselves.
    pub fn perform(
        &self,
        counters: Vec<ItemCounter>,
        eligible: Vec<PromotionRef>,
        ineligible: Vec<PromotionRef>,
    ) -> CoreResult<CartTotals> {
        debug!(
            items = counters.len(),
            eligible = eligible.len(),
            ineligible = ineligible.len(),
            "Performing totals"
        );

        // zero-quantity counters only exist under the legacy floor
        let counters: Vec<ItemCounter> = counters
            .into_iter()
            .filter(|counter| counter.quantity > 0)
            .collect();

        let mut promo_impacts: IndexMap<CartKey, PromoImpact> = IndexMap::new();
        let mut item_impacts: Vec<ItemPromoImpact> = Vec::new();
        let mut context = PromoCalculationsContext::new();

        let promotions = self.converge_promotions(&counters, eligible, &mut promo_impacts)?;
        let items = self.converge_items(counters, &promotions, &mut promo_impacts)?;

        let mut item_subtotals =
            self.reduce_subtotals(&items, &promotions, &mut context, &mut item_impacts)?;
        self.redistribute(
            &items,
            &promotions,
            &mut item_subtotals,
            &mut context,
            &mut item_impacts,
        )?;

        let promotions = keyed_promotions(&promotions);
        let not_eligible: Vec<PromotionRef> = ineligible
            .into_iter()
            .filter(|promotion| !promotions.contains_key(&promotion.key()))
            .collect();

        debug!(
            items = items.len(),
            promotions = promotions.len(),
            not_eligible = not_eligible.len(),
            impacts = item_impacts.len(),
            "Totals complete"
        );

        Ok(CartTotals::new(
            TotalsParts {
                items: make_keyed(items),
                promotions,
                not_eligible,
                promo_impacts,
                item_subtotals,
                item_impacts,
            },
            self.config,
        ))
    }

    fn snapshot(&self, items: &[ItemCounter], promotions: &[PromotionRef]) -> ModifiedCartData {
        ModifiedCartData::new(
            items.to_vec(),
            promotions.to_vec(),
            self.config.subtotal_scale,
            self.config.redistribution_scale,
        )
    }

    /// Errors once `restarts` has reached the configured cap.
    fn guard_restart(&self, stage: ConvergenceStage, restarts: usize) -> CoreResult<()> {
        let limit = self.config.max_convergence_restarts;
        if limit != 0 && restarts >= limit {
            warn!(stage = %stage, restarts, "Convergence guard tripped");
            return Err(CoreError::ConvergenceLimit { stage, restarts });
        }
        Ok(())
    }

    // =========================================================================
    // Stage 1: Promotion Convergence
    // =========================================================================

    pub(crate) fn converge_promotions(
        &self,
        items: &[ItemCounter],
        promotions: Vec<PromotionRef>,
        impacts: &mut IndexMap<CartKey, PromoImpact>,
    ) -> CoreResult<Vec<PromotionRef>> {
        let mut working: Vec<PromotionRef> = keyed_promotions(&promotions).into_values().collect();
        let mut restarts = 0;
        let mut index = 0;

        while index < working.len() {
            let promotion = working[index].clone();
            let key = promotion.key();

            let snapshot = self.snapshot(items, &working);
            let others: Vec<PromotionRef> = working
                .iter()
                .filter(|other| other.key() != key)
                .cloned()
                .collect();

            let mut reduced = promotion.reduce_promotions(&snapshot, others)?;
            reduced.push(promotion.clone());
            let reduced: Vec<PromotionRef> = keyed_promotions(&reduced).into_values().collect();

            let diff = promotion_diff(&working, &reduced)?;
            if diff.is_empty() {
                index += 1;
                continue;
            }

            trace!(promotion = %key, changes = diff.len(), "Promotion list changed");
            self.guard_restart(ConvergenceStage::Promotions, restarts)?;

            impacts
                .entry(key)
                .or_insert_with(|| PromoImpact::new(promotion.clone()))
                .caused_by_promotion_reduction
                .extend(diff);

            working = reduced;
            restarts += 1;
            index = 0;
        }

        debug!(promotions = working.len(), restarts, "Promotions converged");
        Ok(working)
    }

    // =========================================================================
    // Stage 2: Item Convergence
    // =========================================================================

    pub(crate) fn converge_items(
        &self,
        items: Vec<ItemCounter>,
        promotions: &[PromotionRef],
        impacts: &mut IndexMap<CartKey, PromoImpact>,
    ) -> CoreResult<Vec<ItemCounter>> {
        let snapshot = self.snapshot(&items, promotions);
        let mut working = make_keyed(items);
        let mut restarts = 0;
        let mut index = 0;

        while index < promotions.len() {
            let promotion = &promotions[index];

            let reduced = promotion.reduce_items(&snapshot, working.values().cloned().collect())?;
            let reduced = make_keyed(reduced.into_iter().filter(|counter| counter.quantity > 0));

            let diff = item_diff(&working, &reduced)?;
            if diff.is_empty() {
                index += 1;
                continue;
            }

            let key = promotion.key();
            trace!(promotion = %key, changes = diff.len(), "Item counters changed");
            self.guard_restart(ConvergenceStage::Items, restarts)?;

            impacts
                .entry(key)
                .or_insert_with(|| PromoImpact::new(promotion.clone()))
                .caused_by_item_reduction
                .extend(diff);

            working = reduced;
            restarts += 1;
            index = 0;
        }

        debug!(items = working.len(), restarts, "Items converged");
        Ok(working.into_values().collect())
    }

    // =========================================================================
    // Stage 3: Subtotal Reduction
    // =========================================================================

    pub(crate) fn reduce_subtotals(
        &self,
        items: &[ItemCounter],
        promotions: &[PromotionRef],
        context: &mut PromoCalculationsContext,
        impacts: &mut Vec<ItemPromoImpact>,
    ) -> CoreResult<Vec<ItemSubtotal>> {
        let scale = self.config.subtotal_scale;
        let snapshot = self.snapshot(items, promotions);
        let mut subtotals = Vec::with_capacity(items.len());

        for counter in items.iter().filter(|counter| counter.quantity > 0) {
            let before = DecimalValue::from_int(counter.item.unit_price())
                .mul_scaled(DecimalValue::from_int(counter.quantity), scale);
            let mut running = before;

            for promotion in promotions {
                let reduced = promotion
                    .reduce_item_subtotal(&snapshot, &counter.item, running, context)?
                    .truncate(scale)
                    .clamp_non_negative();

                let delta = reduced - running;
                if !delta.is_zero() {
                    trace!(
                        item = %counter.key(),
                        promotion = %promotion.key(),
                        delta = %delta,
                        "Subtotal reduced"
                    );
                    impacts.push(ItemPromoImpact {
                        item: counter.item.clone(),
                        promotion: promotion.clone(),
                        price_impact: delta,
                    });
                }
                running = reduced;
            }

            subtotals.push(ItemSubtotal {
                item: counter.item.clone(),
                quantity: counter.quantity,
                subtotal_before_promotions: before,
                subtotal_after_promotions: running,
            });
        }

        Ok(subtotals)
    }

    // =========================================================================
    // Stage 4: Cross-Item Redistribution
    // =========================================================================

    pub(crate) fn redistribute(
        &self,
        items: &[ItemCounter],
        promotions: &[PromotionRef],
        subtotals: &mut [ItemSubtotal],
        context: &mut PromoCalculationsContext,
        impacts: &mut Vec<ItemPromoImpact>,
    ) -> CoreResult<()> {
        let snapshot = self.snapshot(items, promotions);

        for promotion in promotions {
            let mut reducers: Vec<SubtotalReducer> = subtotals
                .iter()
                .map(|subtotal| {
                    SubtotalReducer::new(
                        subtotal.item.clone(),
                        subtotal.quantity,
                        subtotal.subtotal_after_promotions,
                    )
                })
                .collect();

            promotion.reduce_items_subtotal(&mut reducers, context, &snapshot)?;

            for (subtotal, reducer) in subtotals.iter_mut().zip(reducers) {
                let delta = reducer.subtotal() - subtotal.subtotal_after_promotions;
                if delta.is_zero() {
                    continue;
                }
                trace!(
                    item = %subtotal.key(),
                    promotion = %promotion.key(),
                    delta = %delta,
                    "Subtotal redistributed"
                );
                impacts.push(ItemPromoImpact {
                    item: subtotal.item.clone(),
                    promotion: promotion.clone(),
                    price_impact: delta,
                });
                subtotal.subtotal_after_promotions = reducer.subtotal();
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::item::{ItemRef, Product};
    use crate::promotion::Promotion;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    // -------------------------------------------------------------------------
    // Test promotions
    // -------------------------------------------------------------------------

    /// Multiplies every subtotal by a factor.
    #[derive(Debug)]
    struct Multiply(&'static str, DecimalValue);

    impl Identity for Multiply {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            "promotion"
        }
    }

    impl Promotion for Multiply {
        fn reduce_item_subtotal(
            &self,
            cart: &ModifiedCartData,
            _item: &ItemRef,
            subtotal: DecimalValue,
            _context: &mut PromoCalculationsContext,
        ) -> CoreResult<DecimalValue> {
            Ok(subtotal.mul_scaled(self.1, cart.subtotal_scale()))
        }
    }

    /// Takes a fixed amount off one item.
    #[derive(Debug)]
    struct TakeOff(&'static str, CartKey, i64);

    impl Identity for TakeOff {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            "promotion"
        }
    }

    impl Promotion for TakeOff {
        fn reduce_item_subtotal(
            &self,
            _cart: &ModifiedCartData,
            item: &ItemRef,
            subtotal: DecimalValue,
            _context: &mut PromoCalculationsContext,
        ) -> CoreResult<DecimalValue> {
            if item.key() == self.1 {
                Ok(subtotal - DecimalValue::from_int(self.2))
            } else {
                Ok(subtotal)
            }
        }
    }

    /// Removes every other promotion.
    #[derive(Debug)]
    struct RemoveOthers(&'static str);

    impl Identity for RemoveOthers {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            "promotion"
        }
    }

    impl Promotion for RemoveOthers {
        fn reduce_promotions(
            &self,
            _cart: &ModifiedCartData,
            _promotions: Vec<PromotionRef>,
        ) -> CoreResult<Vec<PromotionRef>> {
            Ok(Vec::new())
        }
    }

    /// Adds a promotion if it is missing.
    #[derive(Debug)]
    struct AddPromotion(&'static str, PromotionRef);

    impl Identity for AddPromotion {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            "promotion"
        }
    }

    impl Promotion for AddPromotion {
        fn reduce_promotions(
            &self,
            _cart: &ModifiedCartData,
            mut promotions: Vec<PromotionRef>,
        ) -> CoreResult<Vec<PromotionRef>> {
            promotions.push(self.1.clone());
            Ok(promotions)
        }
    }

    /// Ensures an item is present with a fixed quantity.
    #[derive(Debug)]
    struct EnsureItem(&'static str, ItemRef, i64);

    impl Identity for EnsureItem {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            "promotion"
        }
    }

    impl Promotion for EnsureItem {
        fn reduce_items(
            &self,
            _cart: &ModifiedCartData,
            mut counters: Vec<ItemCounter>,
        ) -> CoreResult<Vec<ItemCounter>> {
            let key = self.1.key();
            counters.retain(|counter| counter.key() != key);
            counters.push(ItemCounter::new(self.1.clone(), self.2));
            Ok(counters)
        }
    }

    /// Toggles an item in and out forever.
    #[derive(Debug)]
    struct Flip(&'static str);

    impl Identity for Flip {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            "promotion"
        }
    }

    impl Promotion for Flip {
        fn reduce_items(
            &self,
            _cart: &ModifiedCartData,
            counters: Vec<ItemCounter>,
        ) -> CoreResult<Vec<ItemCounter>> {
            Ok(counters
                .into_iter()
                .map(|mut counter| {
                    counter.quantity += 1;
                    counter
                })
                .collect())
        }
    }

    /// Moves the whole cart discount onto the first item.
    #[derive(Debug)]
    struct FirstItemPays(&'static str, i64);

    impl Identity for FirstItemPays {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            "promotion"
        }
    }

    impl Promotion for FirstItemPays {
        fn reduce_items_subtotal(
            &self,
            items: &mut [SubtotalReducer],
            _context: &mut PromoCalculationsContext,
            _cart: &ModifiedCartData,
        ) -> CoreResult<()> {
            if let Some(first) = items.first_mut() {
                let reduced = first.subtotal() - DecimalValue::from_int(self.1);
                first.set_subtotal(reduced);
            }
            Ok(())
        }
    }

    fn product(id: &str, price: i64) -> ItemRef {
        Product::new(id, "product", price).into_ref()
    }

    fn key(id: &str) -> CartKey {
        CartKey::new(id, "product")
    }

    fn promo_key(id: &str) -> CartKey {
        CartKey::new(id, "promotion")
    }

    fn ten_percent() -> PromotionRef {
        Arc::new(Multiply("TEN", DecimalValue::from(dec!(0.9))))
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_promotions_sums_unit_price_times_quantity() {
        let config = CartConfig::default();
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![
                    ItemCounter::new(product("A", 200), 2),
                    ItemCounter::new(product("B", 120), 3),
                ],
                Vec::new(),
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.total(), DecimalValue::from_int(760));
        assert!(totals.item_promo_impacts().is_empty());
        assert!(!totals.has_promotion_diff());
        assert!(!totals.has_item_diff());
    }

    #[test]
    fn test_percentage_discount_example() {
        let config = CartConfig::default();
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 200), 2)],
                vec![ten_percent()],
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.total(), DecimalValue::from_int(360));
        let impacts = totals.item_promo_impacts();
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].item.key(), key("A"));
        assert_eq!(impacts[0].price_impact, DecimalValue::from_int(-40));
    }

    #[test]
    fn test_free_item_then_percentage_stacking() {
        let config = CartConfig::default();
        let free_b: PromotionRef = Arc::new(TakeOff("FREE", key("B"), 120));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![
                    ItemCounter::new(product("A", 200), 2),
                    ItemCounter::new(product("B", 120), 2),
                ],
                vec![free_b, ten_percent()],
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.total(), DecimalValue::from_int(468));

        let summary: Vec<_> = totals
            .item_promo_impacts()
            .iter()
            .map(|i| (i.item.cart_id().to_string(), i.promotion.cart_id().to_string(), i.price_impact))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A".to_string(), "TEN".to_string(), DecimalValue::from_int(-40)),
                ("B".to_string(), "FREE".to_string(), DecimalValue::from_int(-120)),
                ("B".to_string(), "TEN".to_string(), DecimalValue::from_int(-12)),
            ]
        );
    }

    #[test]
    fn test_negative_subtotal_is_clamped_to_zero() {
        let config = CartConfig::default();
        let overshoot: PromotionRef = Arc::new(TakeOff("BIG", key("A"), 1000));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 200), 2)],
                vec![overshoot],
                Vec::new(),
            )
            .unwrap();

        let subtotal = totals.subtotal_for_item(&key("A")).unwrap();
        assert_eq!(subtotal.subtotal_after_promotions, DecimalValue::ZERO);
        assert_eq!(
            totals.item_promo_impacts()[0].price_impact,
            DecimalValue::from_int(-400)
        );
        assert_eq!(totals.total(), DecimalValue::ZERO);
    }

    #[test]
    fn test_ineligible_promotion_is_reported() {
        let config = CartConfig::default();
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 200), 2)],
                Vec::new(),
                vec![ten_percent()],
            )
            .unwrap();

        assert_eq!(totals.not_eligible().len(), 1);
        assert_eq!(totals.total(), DecimalValue::from_int(400));
        assert!(totals.item_promo_impacts().is_empty());
    }

    #[test]
    fn test_ineligible_promotion_re_added_is_not_reported() {
        let config = CartConfig::default();
        let adder: PromotionRef = Arc::new(AddPromotion("ADDER", ten_percent()));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 200), 2)],
                vec![adder],
                vec![ten_percent()],
            )
            .unwrap();

        assert!(totals.not_eligible().is_empty());
        assert!(totals.promotions().contains_key(&promo_key("TEN")));
        assert_eq!(totals.total(), DecimalValue::from_int(360));

        let impact = totals.promo_impact(&promo_key("ADDER")).unwrap();
        assert_eq!(impact.caused_by_promotion_reduction.len(), 1);
        assert_eq!(impact.caused_by_promotion_reduction[0].difference, 1);
        assert!(totals.has_promotion_diff());
    }

    #[test]
    fn test_exclusion_restarts_and_converges() {
        let config = CartConfig::default();
        let exclusive: PromotionRef = Arc::new(RemoveOthers("ONLY"));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 200), 2)],
                vec![ten_percent(), exclusive],
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.promotions().len(), 1);
        assert!(totals.promotions().contains_key(&promo_key("ONLY")));
        assert_eq!(totals.total(), DecimalValue::from_int(400));

        let impact = totals.promo_impact(&promo_key("ONLY")).unwrap();
        assert_eq!(impact.caused_by_promotion_reduction[0].difference, -1);
    }

    #[test]
    fn test_converged_promotions_are_a_fixed_point() {
        let config = CartConfig::default();
        let engine = TotalsEngine::new(&config);
        let exclusive: PromotionRef = Arc::new(RemoveOthers("ONLY"));
        let mut impacts = IndexMap::new();

        let converged = engine
            .converge_promotions(&[], vec![ten_percent(), exclusive], &mut impacts)
            .unwrap();

        let mut again = IndexMap::new();
        let rerun = engine
            .converge_promotions(&[], converged.clone(), &mut again)
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(rerun.len(), converged.len());
    }

    #[test]
    fn test_converged_items_are_a_fixed_point() {
        let config = CartConfig::default();
        let engine = TotalsEngine::new(&config);
        let gift = Product::new("G", "gift", 0).into_ref();
        let injector: PromotionRef = Arc::new(EnsureItem("GIFT", gift, 1));
        let promotions = vec![injector];
        let mut impacts = IndexMap::new();

        let converged = engine
            .converge_items(
                vec![ItemCounter::new(product("A", 200), 2)],
                &promotions,
                &mut impacts,
            )
            .unwrap();
        assert_eq!(impacts.len(), 1);

        let mut again = IndexMap::new();
        let rerun = engine
            .converge_items(converged.clone(), &promotions, &mut again)
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(rerun.len(), converged.len());
        assert!(rerun
            .iter()
            .zip(&converged)
            .all(|(left, right)| left.key() == right.key() && left.quantity == right.quantity));
    }

    #[test]
    fn test_item_injection_records_item_diff() {
        let config = CartConfig::default();
        let gift = Product::new("G", "gift", 0).into_ref();
        let injector: PromotionRef = Arc::new(EnsureItem("GIFT", gift, 1));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 200), 2)],
                vec![injector],
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.item_quantity(&CartKey::new("G", "gift")), Some(1));
        assert!(totals.has_item_diff());
        let impact = totals.promo_impact(&promo_key("GIFT")).unwrap();
        assert_eq!(impact.caused_by_item_reduction.len(), 1);
        assert_eq!(impact.caused_by_item_reduction[0].difference, 1);
    }

    #[test]
    fn test_item_removed_by_promotion_is_absent() {
        let config = CartConfig::default();
        let zero_a: PromotionRef = Arc::new(EnsureItem("OOS", product("A", 200), 0));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![
                    ItemCounter::new(product("A", 200), 2),
                    ItemCounter::new(product("B", 100), 1),
                ],
                vec![zero_a],
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.item_quantity(&key("A")), None);
        assert_eq!(totals.total(), DecimalValue::from_int(100));
        let impact = totals.promo_impact(&promo_key("OOS")).unwrap();
        assert_eq!(impact.caused_by_item_reduction[0].difference, -2);
    }

    #[test]
    fn test_convergence_guard_trips() {
        let config = CartConfig {
            max_convergence_restarts: 5,
            ..CartConfig::default()
        };
        let flip: PromotionRef = Arc::new(Flip("FLIP"));
        let result = TotalsEngine::new(&config).perform(
            vec![ItemCounter::new(product("A", 200), 1)],
            vec![flip],
            Vec::new(),
        );

        match result {
            Err(CoreError::ConvergenceLimit { stage, restarts }) => {
                assert_eq!(stage, ConvergenceStage::Items);
                assert_eq!(restarts, 5);
            }
            other => panic!("expected convergence limit, got {:?}", other),
        }
    }

    #[test]
    fn test_redistribution_updates_after_but_not_before() {
        let config = CartConfig::default();
        let pays: PromotionRef = Arc::new(FirstItemPays("PAYS", 50));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![
                    ItemCounter::new(product("A", 200), 1),
                    ItemCounter::new(product("B", 100), 1),
                ],
                vec![pays],
                Vec::new(),
            )
            .unwrap();

        let a = totals.subtotal_for_item(&key("A")).unwrap();
        assert_eq!(a.subtotal_before_promotions, DecimalValue::from_int(200));
        assert_eq!(a.subtotal_after_promotions, DecimalValue::from_int(150));
        assert_eq!(totals.total(), DecimalValue::from_int(250));
        assert_eq!(totals.savings(), DecimalValue::from_int(50));
        assert_eq!(totals.impact_of_promotion(&promo_key("PAYS")), DecimalValue::from_int(-50));
    }

    #[test]
    fn test_redistribution_clamps_at_zero() {
        let config = CartConfig::default();
        let pays: PromotionRef = Arc::new(FirstItemPays("PAYS", 500));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 200), 1)],
                vec![pays],
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.total(), DecimalValue::ZERO);
        assert_eq!(
            totals.item_promo_impacts()[0].price_impact,
            DecimalValue::from_int(-200)
        );
    }

    #[test]
    fn test_rounded_total_and_rounding_amount() {
        let config = CartConfig::default();
        let third_off: PromotionRef = Arc::new(Multiply("THIRD", DecimalValue::from(dec!(0.6667))));
        let totals = TotalsEngine::new(&config)
            .perform(
                vec![ItemCounter::new(product("A", 1), 1)],
                vec![third_off],
                Vec::new(),
            )
            .unwrap();

        assert_eq!(totals.total(), DecimalValue::from(dec!(0.6667)));
        assert_eq!(totals.rounded_total().unwrap(), DecimalValue::from(dec!(0.67)));
        assert_eq!(
            totals.rounding_amount().unwrap(),
            DecimalValue::from(dec!(0.0033))
        );
    }

    #[test]
    fn test_negative_rounding_scale_is_an_error() {
        let config = CartConfig {
            rounding_decimals: -1,
            ..CartConfig::default()
        };
        let totals = TotalsEngine::new(&config)
            .perform(vec![ItemCounter::new(product("A", 1), 1)], Vec::new(), Vec::new())
            .unwrap();

        assert!(matches!(
            totals.rounded_total(),
            Err(CoreError::InvalidRoundingScale { scale: -1 })
        ));
    }
}
