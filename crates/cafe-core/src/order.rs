//! # Draft Order
//!
//! The in-progress cart of one checkout session. Never persisted.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Order Operations                               │
//! │                                                                         │
//! │  Register Action          Method                  Availability gate     │
//! │  ───────────────          ──────                  ─────────────────     │
//! │                                                                         │
//! │  Tap item ───────────────► add_line() ──────────► existing + qty        │
//! │                                                                         │
//! │  Change quantity ────────► set_line_quantity() ─► new absolute qty      │
//! │                                                                         │
//! │  Tap remove ─────────────► remove_line() ───────► none                  │
//! │                                                                         │
//! │  Cancel order ───────────► clear() ─────────────► none                  │
//! │                                                                         │
//! │  A rejected mutation leaves the order exactly as it was.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order does no I/O. Mutations that need a stock verdict take a
//! closure mapping the target line quantity to an [`Availability`]; the
//! caller builds it from a ledger snapshot.
//!
//! Totals are computed from the lines on every call and never cached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::availability::Availability;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{MenuItem, TaxRate};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

// =============================================================================
// Draft Line
// =============================================================================

/// One item in the draft order.
///
/// Name and unit price are frozen when the line is first added, so a menu
/// price change mid-order does not reprice the customer's items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftLine {
    pub item_id: String,
    pub name: String,
    pub category: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl DraftLine {
    fn from_item(item: &MenuItem, quantity: i64) -> Self {
        DraftLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            unit_price_cents: item.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// quantity × unit price
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Draft Order
// =============================================================================

/// Single-owner cart. No locking; one register session owns it.
///
/// ## Invariants
/// - Lines are unique by `item_id`
/// - Every line has 1..=999 units
/// - At most 100 lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftOrder {
    lines: Vec<DraftLine>,
    tax_rate: TaxRate,
    created_at: DateTime<Utc>,
}

impl DraftOrder {
    pub fn new(tax_rate: TaxRate) -> Self {
        DraftOrder {
            lines: Vec::new(),
            tax_rate,
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` of an item, merging into an existing line.
    ///
    /// `verdict_for` is asked about the line's resulting quantity
    /// (existing + `quantity`), not just the increment.
    pub fn add_line<F>(&mut self, item: &MenuItem, quantity: i64, verdict_for: F) -> CoreResult<()>
    where
        F: FnOnce(i64) -> Availability,
    {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if !item.is_active {
            return Err(CoreError::InactiveItem(item.id.clone()));
        }

        let existing = self.position(&item.id);
        let target = match existing {
            Some(idx) => self.lines[idx].quantity + quantity,
            None => {
                if self.lines.len() >= MAX_ORDER_LINES {
                    return Err(CoreError::OrderTooLarge { max: MAX_ORDER_LINES });
                }
                quantity
            }
        };
        if target > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: target,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let verdict = verdict_for(target);
        if !verdict.available {
            return Err(CoreError::InsufficientStock {
                item_id: item.id.clone(),
                shortfalls: verdict.shortfalls,
            });
        }

        match existing {
            Some(idx) => self.lines[idx].quantity = target,
            None => self.lines.push(DraftLine::from_item(item, target)),
        }
        Ok(())
    }

    /// Sets a line to an absolute quantity. `quantity <= 0` removes it.
    pub fn set_line_quantity<F>(&mut self, item_id: &str, quantity: i64, verdict_for: F) -> CoreResult<()>
    where
        F: FnOnce(i64) -> Availability,
    {
        if quantity <= 0 {
            self.remove_line(item_id);
            return Ok(());
        }

        let idx = self
            .position(item_id)
            .ok_or_else(|| CoreError::LineNotFound(item_id.to_string()))?;

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let verdict = verdict_for(quantity);
        if !verdict.available {
            return Err(CoreError::InsufficientStock {
                item_id: item_id.to_string(),
                shortfalls: verdict.shortfalls,
            });
        }

        self.lines[idx].quantity = quantity;
        Ok(())
    }

    /// Removes a line. Returns whether one was present.
    pub fn remove_line(&mut self, item_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.item_id != item_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    fn position(&self, item_id: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.item_id == item_id)
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    /// Current quantity of an item; zero when it is not in the order.
    pub fn quantity_of(&self, item_id: &str) -> i64 {
        self.position(item_id)
            .map(|idx| self.lines[idx].quantity)
            .unwrap_or(0)
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(DraftLine::subtotal).sum()
    }

    pub fn tax(&self) -> Money {
        self.subtotal().calculate_tax(self.tax_rate)
    }

    pub fn total(&self) -> Money {
        self.subtotal() + self.tax()
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from(self)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Totals summary for the register display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl From<&DraftOrder> for OrderTotals {
    fn from(order: &DraftOrder) -> Self {
        let subtotal = order.subtotal();
        let tax = subtotal.calculate_tax(order.tax_rate);
        OrderTotals {
            line_count: order.lines.len(),
            total_quantity: order.lines.iter().map(|line| line.quantity).sum(),
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: (subtotal + tax).cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
