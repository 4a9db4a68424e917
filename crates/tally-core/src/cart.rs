//! # Cart State
//!
//! The long-lived, mutable side of the system: items, promotions, bindings
//! and host context. Totals are computed from it but never written back.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartState (one per shopping session)                                  │
//! │                                                                         │
//! │  add_item ──┐                                                          │
//! │  remove_item├──► ItemCounterStore ──┐                                  │
//! │  set_qty  ──┘                       │ snapshot (value copy)            │
//! │                                     ▼                                  │
//! │  add_promotion ──► promotions ──► perform_totals() ──► CartTotals      │
//! │                                     ▲                  (immutable)     │
//! │  set_context ──► context ───────────┘ (read by eligibility checks)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use tally_core::cart::CartState;
//! use tally_core::item::Product;
//! use tally_core::DecimalValue;
//!
//! let mut cart = CartState::new();
//! cart.add_item(Product::new("A", "product", 200).into_ref(), 2).unwrap();
//!
//! let totals = cart.perform_totals().unwrap();
//! assert_eq!(totals.total(), DecimalValue::from_int(400));
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::CartConfig;
use crate::counter::{ItemCounter, ItemCounterStore};
use crate::engine::TotalsEngine;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::filter::ItemFilter;
use crate::identity::CartKey;
use crate::item::ItemRef;
use crate::promotion::PromotionRef;
use crate::totals::CartTotals;
use crate::validation::{validate_cart_id, validate_cart_type, validate_quantity, validate_unit_price};

/// Items, promotions and host context of one shopping session.
#[derive(Debug, Clone)]
pub struct CartState {
    store: ItemCounterStore,
    promotions: Vec<PromotionRef>,
    /// Target key → keys of the items bound to it.
    bindings: IndexMap<CartKey, Vec<CartKey>>,
    context: Map<String, Value>,
    config: CartConfig,
}

impl Default for CartState {
    fn default() -> Self {
        CartState::new()
    }
}

impl CartState {
    /// Creates an empty cart with the default configuration.
    pub fn new() -> Self {
        let config = CartConfig::default();
        CartState {
            store: ItemCounterStore::new(config.removal_floor),
            promotions: Vec::new(),
            bindings: IndexMap::new(),
            context: Map::new(),
            config,
        }
    }

    /// Creates an empty cart with a validated configuration.
    pub fn with_config(config: CartConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(CartState {
            store: ItemCounterStore::new(config.removal_floor),
            promotions: Vec::new(),
            bindings: IndexMap::new(),
            context: Map::new(),
            config,
        })
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Adds `quantity` units, merging with an item of the same key.
    ///
    /// ## Bound Items
    /// Every binding target must already be in the cart. A bound item that
    /// follows a single target takes that target's quantity, ignoring
    /// `quantity`.
    pub fn add_item(&mut self, item: ItemRef, quantity: i64) -> CoreResult<()> {
        validate_cart_id(item.cart_id())?;
        validate_cart_type(item.cart_type())?;
        validate_unit_price(item.unit_price())?;
        validate_quantity(quantity)?;

        let key = item.key();
        if let Some(existing) = self.store.quantity_of(&key) {
            // the limit applies to each add, not to the merged total
            let merged = existing.saturating_add(quantity);
            debug!(item = %key, quantity, merged, "Merging item");
            return self.apply_quantity(&key, merged);
        }

        let mut quantity = quantity;
        if let Some(binding) = item.binding() {
            for target in &binding.targets {
                if !self.store.contains(target) {
                    return Err(CoreError::BindingTargetMissing {
                        bound: key.clone(),
                        target: target.clone(),
                    });
                }
            }
            if let Some(target) = binding.followed_target() {
                quantity = self.store.quantity_of(target).unwrap_or(quantity);
            }
            for target in binding.targets {
                self.bindings.entry(target).or_default().push(key.clone());
            }
        }

        debug!(item = %key, quantity, "Adding item");
        self.store.add(item, quantity);
        Ok(())
    }

    /// Sets an item's quantity. `0` removes the item and everything bound to
    /// it; followers of the item take the new quantity.
    pub fn set_item_quantity(&mut self, key: &CartKey, quantity: i64) -> CoreResult<()> {
        if !self.store.contains(key) {
            return Err(CoreError::ItemNotFound(key.clone()));
        }
        if quantity == 0 {
            return self.remove_item(key, None);
        }
        validate_quantity(quantity)?;

        debug!(item = %key, quantity, "Setting item quantity");
        self.apply_quantity(key, quantity)
    }

    /// Stores an already validated quantity and carries it to followers.
    fn apply_quantity(&mut self, key: &CartKey, quantity: i64) -> CoreResult<()> {
        self.store.set_quantity(key, quantity);
        self.sync_followers(key, quantity)
    }

    /// Removes an item, or `quantity` units of it.
    ///
    /// When the item leaves the store (per the removal floor), every item
    /// bound to it is removed as well.
    pub fn remove_item(&mut self, key: &CartKey, quantity: Option<i64>) -> CoreResult<()> {
        if let Some(quantity) = quantity {
            if quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
        }

        let item = self
            .store
            .get(key)
            .map(|counter| counter.item.clone())
            .ok_or_else(|| CoreError::ItemNotFound(key.clone()))?;

        debug!(item = %key, ?quantity, "Removing item");
        self.store.remove(key, quantity);

        match self.store.quantity_of(key) {
            // a legacy target held at zero keeps its followers
            Some(0) => Ok(()),
            Some(remaining) => self.sync_followers(key, remaining),
            None => {
                self.detach(key, &item);
                Ok(())
            }
        }
    }

    /// Copies `quantity` onto every item that follows `target`.
    fn sync_followers(&mut self, target: &CartKey, quantity: i64) -> CoreResult<()> {
        let followers: Vec<CartKey> = self
            .bindings
            .get(target)
            .map(|bound| {
                bound
                    .iter()
                    .filter(|key| {
                        self.store
                            .get(key)
                            .and_then(|counter| counter.item.binding())
                            .is_some_and(|binding| binding.followed_target() == Some(target))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for follower in followers {
            if self.store.quantity_of(&follower) != Some(quantity) {
                self.apply_quantity(&follower, quantity)?;
            }
        }
        Ok(())
    }

    /// Drops a removed item's bindings and removes whatever was bound to it.
    fn detach(&mut self, key: &CartKey, item: &ItemRef) {
        if let Some(binding) = item.binding() {
            for target in &binding.targets {
                if let Some(bound) = self.bindings.get_mut(target) {
                    bound.retain(|bound_key| bound_key != key);
                    if bound.is_empty() {
                        self.bindings.shift_remove(target);
                    }
                }
            }
        }

        for bound_key in self.bindings.shift_remove(key).unwrap_or_default() {
            if let Some(bound_item) = self.store.get(&bound_key).map(|c| c.item.clone()) {
                debug!(item = %bound_key, target = %key, "Removing bound item");
                self.store.remove(&bound_key, None);
                self.detach(&bound_key, &bound_item);
            }
        }
    }

    pub fn has_item(&self, key: &CartKey) -> bool {
        self.store.contains(key)
    }

    pub fn item(&self, key: &CartKey) -> Option<&ItemRef> {
        self.store.get(key).map(|counter| &counter.item)
    }

    /// Stored quantity, `None` when absent.
    pub fn quantity_of(&self, key: &CartKey) -> Option<i64> {
        self.store.quantity_of(key)
    }

    /// Counters in cart order.
    pub fn items(&self) -> impl Iterator<Item = &ItemCounter> {
        self.store.iter()
    }

    /// Counters whose type passes the filter.
    pub fn items_matching<'a>(&'a self, filter: &'a ItemFilter) -> impl Iterator<Item = &'a ItemCounter> {
        self.store
            .iter()
            .filter(move |counter| filter.matches_type(counter.item.cart_type()))
    }

    /// Number of distinct items.
    pub fn item_count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Removes every item and binding. Promotions and context stay.
    pub fn clear_items(&mut self) {
        self.store.clear();
        self.bindings.clear();
    }

    /// Stable re-order of items by type. Unlisted types go last.
    pub fn sort_by_type(&mut self, order: &[&str]) {
        self.store.sort_by_key(|counter| {
            order
                .iter()
                .position(|cart_type| *cart_type == counter.item.cart_type())
                .unwrap_or(order.len())
        });
    }

    // =========================================================================
    // Promotions
    // =========================================================================

    pub fn add_promotion(&mut self, promotion: PromotionRef) {
        debug!(promotion = %promotion.key(), "Adding promotion");
        self.promotions.push(promotion);
    }

    pub fn remove_promotion(&mut self, key: &CartKey) -> CoreResult<()> {
        let before = self.promotions.len();
        self.promotions.retain(|promotion| &promotion.key() != key);
        if self.promotions.len() == before {
            return Err(CoreError::PromotionNotFound(key.clone()));
        }
        Ok(())
    }

    /// Replaces the promotion list.
    pub fn set_promotions<I>(&mut self, promotions: I)
    where
        I: IntoIterator<Item = PromotionRef>,
    {
        self.promotions = promotions.into_iter().collect();
    }

    pub fn promotions(&self) -> &[PromotionRef] {
        &self.promotions
    }

    // =========================================================================
    // Context
    // =========================================================================

    /// Replaces the host-supplied context data.
    pub fn set_context(&mut self, context: Map<String, Value>) {
        self.context = context;
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Runs the totals engine over a copy of the current state.
    pub fn perform_totals(&self) -> CoreResult<CartTotals> {
        let (eligible, ineligible): (Vec<PromotionRef>, Vec<PromotionRef>) = self
            .promotions
            .iter()
            .cloned()
            .partition(|promotion| promotion.is_eligible(self));

        TotalsEngine::new(&self.config).perform(self.store.snapshot(), eligible, ineligible)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
