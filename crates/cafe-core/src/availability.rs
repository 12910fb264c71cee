//! # Availability Checker
//!
//! Compares what a recipe needs with what the ledger holds.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_availability("latte", recipe, snapshot, 6)                       │
//! │                                                                         │
//! │   recipe × 6      Milk 6        Beans 108                               │
//! │   snapshot        Milk 5        Beans 500                               │
//! │                   ──────        ─────────                               │
//! │   verdict         short 1       ok                                      │
//! │                                                                         │
//! │   → available: false, shortfalls: [Milk 1], available_quantity: 5       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These functions are pure. A positive verdict is a point-in-time reading
//! of the snapshot it was given and reserves nothing; the conditional
//! decrement at commit is what actually prevents overselling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::quantity::Quantity;
use crate::recipe::ConsumptionMap;
use crate::types::{Ingredient, RecipeLine};

// =============================================================================
// Stock Snapshot
// =============================================================================

#[derive(Debug, Clone)]
struct StockLevel {
    name: String,
    on_hand: Quantity,
}

/// Ledger quantities read at one point in time.
///
/// Ingredients absent from the snapshot count as zero on hand.
#[derive(Debug, Clone, Default)]
pub struct StockSnapshot {
    levels: HashMap<String, StockLevel>,
}

impl StockSnapshot {
    pub fn new() -> Self {
        StockSnapshot::default()
    }

    pub fn insert(&mut self, ingredient_id: impl Into<String>, name: impl Into<String>, on_hand: Quantity) {
        self.levels.insert(
            ingredient_id.into(),
            StockLevel {
                name: name.into(),
                on_hand,
            },
        );
    }

    pub fn on_hand(&self, ingredient_id: &str) -> Quantity {
        self.levels
            .get(ingredient_id)
            .map(|level| level.on_hand)
            .unwrap_or(Quantity::ZERO)
    }

    /// Display name, falling back to the id for unknown ingredients.
    pub fn name_of<'a>(&'a self, ingredient_id: &'a str) -> &'a str {
        self.levels
            .get(ingredient_id)
            .map(|level| level.name.as_str())
            .unwrap_or(ingredient_id)
    }
}

impl FromIterator<Ingredient> for StockSnapshot {
    fn from_iter<I: IntoIterator<Item = Ingredient>>(iter: I) -> Self {
        let mut snapshot = StockSnapshot::new();
        for ingredient in iter {
            let on_hand = ingredient.quantity_on_hand();
            snapshot.insert(ingredient.id, ingredient.name, on_hand);
        }
        snapshot
    }
}

// =============================================================================
// Verdicts
// =============================================================================

/// One ingredient that cannot cover the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shortfall {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub required: Quantity,
    pub on_hand: Quantity,
    /// `required - on_hand`, always positive.
    pub missing: Quantity,
}

/// Verdict for (item, requested quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Availability {
    pub item_id: String,
    pub requested_quantity: i64,
    pub available: bool,
    /// Every short ingredient, not just the first.
    pub shortfalls: Vec<Shortfall>,
    /// Most units the current stock could make. `None` means unbounded
    /// (externally sourced item).
    pub available_quantity: Option<i64>,
}

impl Availability {
    /// Verdict for an externally sourced item: always available.
    pub fn unbounded(item_id: impl Into<String>, requested_quantity: i64) -> Self {
        Availability {
            item_id: item_id.into(),
            requested_quantity,
            available: true,
            shortfalls: Vec::new(),
            available_quantity: None,
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.available
    }
}

// =============================================================================
// Checks
// =============================================================================

/// Checks whether `requested` units of an item can be made from `stock`.
pub fn check_availability(
    item_id: &str,
    recipe: &[RecipeLine],
    stock: &StockSnapshot,
    requested: i64,
) -> Availability {
    if recipe.is_empty() {
        return Availability::unbounded(item_id, requested);
    }

    let required = ConsumptionMap::expand(recipe, requested);
    let shortfalls = check_consumption(&required, stock);

    // Per-unit aggregation handles a recipe that lists an ingredient twice.
    let per_unit = ConsumptionMap::expand(recipe, 1);
    let available_quantity = per_unit
        .iter()
        .filter_map(|(id, qty)| stock.on_hand(id).servings_of(qty))
        .min();

    Availability {
        item_id: item_id.to_string(),
        requested_quantity: requested,
        available: shortfalls.is_empty(),
        shortfalls,
        available_quantity,
    }
}

/// Lists every ingredient in `required` that `stock` cannot cover.
///
/// Used for a whole order at checkout, where lines sharing an ingredient
/// must be judged on their combined demand.
pub fn check_consumption(required: &ConsumptionMap, stock: &StockSnapshot) -> Vec<Shortfall> {
    required
        .iter()
        .filter_map(|(id, needed)| {
            let on_hand = stock.on_hand(id);
            if needed <= on_hand {
                return None;
            }
            Some(Shortfall {
                ingredient_id: id.to_string(),
                ingredient_name: stock.name_of(id).to_string(),
                required: needed,
                on_hand,
                missing: needed - on_hand,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> StockSnapshot {
        let mut s = StockSnapshot::new();
        s.insert("milk", "Milk", Quantity::from_units(5));
        s.insert("beans", "Beans", Quantity::from_units(500));
        s
    }

    fn latte() -> Vec<RecipeLine> {
        vec![
            RecipeLine::new("latte", "milk", Quantity::from_units(1)),
            RecipeLine::new("latte", "beans", Quantity::from_units(18)),
        ]
    }

    #[test]
    fn test_available_within_stock() {
        let verdict = check_availability("latte", &latte(), &stock(), 5);
        assert!(verdict.is_available());
        assert!(verdict.shortfalls.is_empty());
        assert_eq!(verdict.available_quantity, Some(5));
    }

    #[test]
    fn test_shortfall_reports_missing_amount() {
        let verdict = check_availability("latte", &latte(), &stock(), 6);
        assert!(!verdict.is_available());
        assert_eq!(verdict.shortfalls.len(), 1);

        let milk = &verdict.shortfalls[0];
        assert_eq!(milk.ingredient_id, "milk");
        assert_eq!(milk.ingredient_name, "Milk");
        assert_eq!(milk.missing, Quantity::from_units(1));
    }

    #[test]
    fn test_every_short_ingredient_is_listed() {
        let verdict = check_availability("latte", &latte(), &stock(), 40);
        let ids: Vec<_> = verdict.shortfalls.iter().map(|s| s.ingredient_id.as_str()).collect();
        assert_eq!(ids, vec!["beans", "milk"]);
    }

    #[test]
    fn test_unknown_ingredient_counts_as_zero() {
        let recipe = vec![RecipeLine::new("cocoa-drink", "cocoa", Quantity::from_units(10))];
        let verdict = check_availability("cocoa-drink", &recipe, &stock(), 1);
        assert!(!verdict.is_available());
        assert_eq!(verdict.shortfalls[0].ingredient_name, "cocoa");
        assert_eq!(verdict.available_quantity, Some(0));
    }

    #[test]
    fn test_externally_sourced_is_unbounded() {
        let verdict = check_availability("water", &[], &StockSnapshot::new(), 1_000);
        assert!(verdict.is_available());
        assert_eq!(verdict.available_quantity, None);
    }

    #[test]
    fn test_combined_demand_across_lines() {
        let mut required = ConsumptionMap::expand(&latte(), 3);
        required.merge(&ConsumptionMap::expand(&latte(), 3));
        let shortfalls = check_consumption(&required, &stock());
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].missing, Quantity::from_units(1));
    }
}
