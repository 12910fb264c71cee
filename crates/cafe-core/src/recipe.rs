//! # Recipe Expansion
//!
//! Turns (item, quantity) into the ingredient quantities it consumes.
//!
//! ```text
//!   Latte × 2                     recipe: Milk 0.24, Beans 18
//!      │
//!      ▼  expand
//!   { Milk: 0.48, Beans: 36 }
//!      │
//!      ▼  merge with Mocha × 1    recipe: Milk 0.2, Beans 18, Cocoa 10
//!   { Beans: 54, Cocoa: 10, Milk: 0.68 }   ← one debit per ingredient
//! ```
//!
//! The aggregated map is what checkout debits and what a sale stores as its
//! consumption snapshot. Keys are ordered so debits always touch ingredients
//! in the same order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::quantity::Quantity;
use crate::types::{ConsumptionLine, RecipeLine};

/// Aggregated ingredient consumption keyed by ingredient id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionMap(BTreeMap<String, Quantity>);

impl ConsumptionMap {
    pub fn new() -> Self {
        ConsumptionMap(BTreeMap::new())
    }

    /// Expands one recipe for `quantity` units of its item.
    ///
    /// An empty recipe (externally sourced item) yields an empty map.
    pub fn expand(recipe: &[RecipeLine], quantity: i64) -> Self {
        let mut map = ConsumptionMap::new();
        for line in recipe {
            map.add(&line.ingredient_id, line.quantity_per_unit() * quantity);
        }
        map
    }

    /// Adds `quantity` of an ingredient. Zero quantities are not recorded.
    pub fn add(&mut self, ingredient_id: &str, quantity: Quantity) {
        if quantity.is_zero() {
            return;
        }
        *self.0.entry(ingredient_id.to_string()).or_default() += quantity;
    }

    pub fn merge(&mut self, other: &ConsumptionMap) {
        for (id, qty) in other.iter() {
            self.add(id, qty);
        }
    }

    /// Quantity required of an ingredient; zero when it is not consumed.
    pub fn get(&self, ingredient_id: &str) -> Quantity {
        self.0.get(ingredient_id).copied().unwrap_or(Quantity::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Quantity)> + '_ {
        self.0.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    pub fn ingredient_ids(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rows for the consumption snapshot stored on a sale.
    pub fn to_lines(&self) -> Vec<ConsumptionLine> {
        self.0
            .iter()
            .map(|(id, qty)| ConsumptionLine {
                ingredient_id: id.clone(),
                quantity_milli: qty.milli(),
            })
            .collect()
    }
}

/// Duplicate ingredient ids are summed.
impl FromIterator<(String, Quantity)> for ConsumptionMap {
    fn from_iter<I: IntoIterator<Item = (String, Quantity)>>(iter: I) -> Self {
        let mut map = ConsumptionMap::new();
        for (id, qty) in iter {
            map.add(&id, qty);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latte() -> Vec<RecipeLine> {
        vec![
            RecipeLine::new("latte", "milk", Quantity::from_milli(240)),
            RecipeLine::new("latte", "beans", Quantity::from_units(18)),
        ]
    }

    fn mocha() -> Vec<RecipeLine> {
        vec![
            RecipeLine::new("mocha", "milk", Quantity::from_milli(200)),
            RecipeLine::new("mocha", "beans", Quantity::from_units(18)),
            RecipeLine::new("mocha", "cocoa", Quantity::from_units(10)),
        ]
    }

    #[test]
    fn test_expand_multiplies_per_unit() {
        let map = ConsumptionMap::expand(&latte(), 2);
        assert_eq!(map.get("milk"), Quantity::from_milli(480));
        assert_eq!(map.get("beans"), Quantity::from_units(36));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_externally_sourced_expands_to_nothing() {
        assert!(ConsumptionMap::expand(&[], 12).is_empty());
    }

    #[test]
    fn test_merge_aggregates_shared_ingredients() {
        let mut map = ConsumptionMap::expand(&latte(), 2);
        map.merge(&ConsumptionMap::expand(&mocha(), 1));

        assert_eq!(map.get("milk"), Quantity::from_milli(680));
        assert_eq!(map.get("beans"), Quantity::from_units(54));
        assert_eq!(map.get("cocoa"), Quantity::from_units(10));
        assert_eq!(map.get("sugar"), Quantity::ZERO);
    }

    #[test]
    fn test_to_lines_is_ordered_by_ingredient() {
        let mut map = ConsumptionMap::expand(&mocha(), 1);
        map.merge(&ConsumptionMap::expand(&latte(), 1));
        let ids: Vec<_> = map.to_lines().into_iter().map(|l| l.ingredient_id).collect();
        assert_eq!(ids, vec!["beans", "cocoa", "milk"]);
    }

    #[test]
    fn test_from_iter_sums_duplicates() {
        let map: ConsumptionMap = vec![
            ("milk".to_string(), Quantity::from_units(1)),
            ("milk".to_string(), Quantity::from_units(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.get("milk"), Quantity::from_units(3));
    }
}
