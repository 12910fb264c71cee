//! # Domain Types
//!
//! Core domain types shared by the pipelines and the UI layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Ingredient    │   │   RecipeLine    │   │    MenuItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  ingredient_id  │   │  id (UUID)      │       │
//! │  │  quantity_milli │   │  item_id ───────┼──►│  price_cents    │       │
//! │  │  threshold      │   │  per-unit milli │   │  category       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │    SaleItem     │   │ ConsumptionLine │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64, seq)  │──►│  item snapshot  │   │  ingredient_id  │       │
//! │  │  totals         │──►│  qty × price    │   │  quantity_milli │       │
//! │  │  void fields    │──────────────────────────►(snapshot)      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ingredients and menu items use UUID v4 ids. Sale ids are assigned by the
//! journal at commit time and increase monotonically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::recipe::ConsumptionMap;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (825 = 8.25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Ingredient
// =============================================================================

/// A stock-tracked ingredient in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ingredient {
    pub id: String,

    pub name: String,

    /// Unit of measure label ("ml", "g", "pcs").
    pub unit: String,

    /// Quantity on hand in thousandths of `unit`. Never negative.
    pub quantity_milli: i64,

    /// At or below this level the ingredient is reported as low stock.
    pub low_stock_threshold_milli: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    #[inline]
    pub fn quantity_on_hand(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    #[inline]
    pub fn low_stock_threshold(&self) -> Quantity {
        Quantity::from_milli(self.low_stock_threshold_milli)
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity_milli <= self.low_stock_threshold_milli
    }
}

// =============================================================================
// Menu Item
// =============================================================================

/// A sellable item on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MenuItem {
    pub id: String,

    /// Business identifier shown on the register ("LATTE-12").
    pub sku: String,

    pub name: String,

    /// Menu grouping used by the category breakdown report.
    pub category: String,

    pub price_cents: i64,

    /// Inactive items stay in history but cannot be ordered.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Recipe Line
// =============================================================================

/// One ingredient requirement for producing one unit of a menu item.
///
/// An item with no recipe lines is externally sourced (bottled water, pastry
/// bought in) and never touches the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipeLine {
    pub item_id: String,
    pub ingredient_id: String,
    pub quantity_milli_per_unit: i64,
}

impl RecipeLine {
    pub fn new(item_id: impl Into<String>, ingredient_id: impl Into<String>, per_unit: Quantity) -> Self {
        RecipeLine {
            item_id: item_id.into(),
            ingredient_id: ingredient_id.into(),
            quantity_milli_per_unit: per_unit.milli(),
        }
    }

    #[inline]
    pub fn quantity_per_unit(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli_per_unit)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the only method with tendered amount and change.
    Cash,
    /// Card payment on an external terminal.
    ExternalCard,
    /// QR / mobile wallet payment.
    EWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::ExternalCard => "external_card",
            PaymentMethod::EWallet => "e_wallet",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" | "external_card" => Ok(PaymentMethod::ExternalCard),
            "e_wallet" | "ewallet" | "wallet" | "qr" => Ok(PaymentMethod::EWallet),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec![
                    "cash".to_string(),
                    "external_card".to_string(),
                    "e_wallet".to_string(),
                ],
            }),
        }
    }
}

/// How the customer pays at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    /// Amount handed over by the customer. Only meaningful for cash.
    pub cash_tendered_cents: Option<i64>,
}

impl PaymentRequest {
    pub fn cash(tendered: Money) -> Self {
        PaymentRequest {
            method: PaymentMethod::Cash,
            cash_tendered_cents: Some(tendered.cents()),
        }
    }

    pub fn card() -> Self {
        PaymentRequest {
            method: PaymentMethod::ExternalCard,
            cash_tendered_cents: None,
        }
    }

    pub fn e_wallet() -> Self {
        PaymentRequest {
            method: PaymentMethod::EWallet,
            cash_tendered_cents: None,
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle of a persisted sale: `Committed → Voided`.
///
/// Drafts are never persisted, so they have no status here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Committed,
    Voided,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a committed sale. Name and price are frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub item_id: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price × quantity
    pub line_subtotal_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }
}

// =============================================================================
// Consumption Snapshot
// =============================================================================

/// One row of the ingredient consumption recorded on a sale at commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ConsumptionLine {
    pub ingredient_id: String,
    pub quantity_milli: i64,
}

impl ConsumptionLine {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The only permitted change to a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoidPatch {
    pub reason: String,
    #[ts(as = "String")]
    pub voided_at: DateTime<Utc>,
}

impl VoidPatch {
    pub fn new(reason: impl Into<String>) -> Self {
        VoidPatch {
            reason: reason.into(),
            voided_at: Utc::now(),
        }
    }
}

/// A committed (and possibly voided) sale from the journal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub cashier_id: String,
    pub terminal_id: String,
    pub payment_method: PaymentMethod,
    pub cash_tendered_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub voided: bool,
    pub void_reason: Option<String>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub items: Vec<SaleItem>,
    /// Aggregated ingredient consumption debited at commit.
    pub consumption: Vec<ConsumptionLine>,
}

impl Sale {
    /// Receipt number in format `YYYYMMDD-NNNNNN` (commit date, sale id).
    pub fn receipt_number(&self) -> String {
        format!("{}-{:06}", self.created_at.format("%Y%m%d"), self.id)
    }

    pub fn status(&self) -> SaleStatus {
        if self.voided {
            SaleStatus::Voided
        } else {
            SaleStatus::Committed
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// The consumption snapshot as a map, for crediting back on void.
    pub fn consumption_map(&self) -> ConsumptionMap {
        self.consumption
            .iter()
            .map(|line| (line.ingredient_id.clone(), line.quantity()))
            .collect()
    }

    /// Applies the void fields. Everything else about a sale is immutable.
    pub fn with_void(mut self, patch: VoidPatch) -> Self {
        self.voided = true;
        self.void_reason = Some(patch.reason);
        self.voided_at = Some(patch.voided_at);
        self
    }
}

/// Result of a successful checkout handed back to the UI.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutReceipt {
    pub sale: Sale,
    /// Cash change due to the customer; zero for non-cash payments.
    pub change_cents: i64,
}

impl CheckoutReceipt {
    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Why the ledger changed.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Debit at checkout.
    Sale,
    /// Credit when a sale is voided.
    Void,
    /// Credit from a delivery.
    Receiving,
    /// Debit for spoilage, spills, staff use.
    Pullout,
}

/// An audit row for every ledger change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: i64,
    pub ingredient_id: String,
    pub kind: MovementKind,
    /// Signed change: negative for debits.
    pub delta_milli: i64,
    pub sale_id: Option<i64>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Reporting Read Models
// =============================================================================

/// Aggregates over a date range of the journal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesSummary {
    pub committed_count: i64,
    pub voided_count: i64,
    /// Subtotals of non-voided sales.
    pub gross_cents: i64,
    pub tax_cents: i64,
    /// Totals of non-voided sales.
    pub net_cents: i64,
}

/// Non-voided totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyTotal {
    /// `YYYY-MM-DD`
    pub day: String,
    pub sale_count: i64,
    pub total_cents: i64,
}

/// Non-voided quantity and revenue for one menu category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategoryTotal {
    pub category: String,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sale() -> Sale {
        Sale {
            id: 42,
            cashier_id: "cashier-1".to_string(),
            terminal_id: "pos-01".to_string(),
            payment_method: PaymentMethod::Cash,
            cash_tendered_cents: Some(1000),
            change_cents: Some(100),
            subtotal_cents: 900,
            tax_cents: 0,
            total_cents: 900,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            voided: false,
            void_reason: None,
            voided_at: None,
            items: vec![],
            consumption: vec![
                ConsumptionLine {
                    ingredient_id: "milk".to_string(),
                    quantity_milli: 480,
                },
                ConsumptionLine {
                    ingredient_id: "beans".to_string(),
                    quantity_milli: 36_000,
                },
            ],
        }
    }

    #[test]
    fn test_receipt_number() {
        assert_eq!(sale().receipt_number(), "20260314-000042");
    }

    #[test]
    fn test_with_void_only_touches_void_fields() {
        let original = sale();
        let patch = VoidPatch::new("wrong order");
        let voided = original.clone().with_void(patch.clone());

        assert_eq!(voided.status(), SaleStatus::Voided);
        assert_eq!(voided.void_reason.as_deref(), Some("wrong order"));
        assert_eq!(voided.voided_at, Some(patch.voided_at));
        assert_eq!(voided.total_cents, original.total_cents);
        assert_eq!(voided.consumption, original.consumption);
    }

    #[test]
    fn test_consumption_map_from_snapshot() {
        let map = sale().consumption_map();
        assert_eq!(map.get("milk"), Quantity::from_milli(480));
        assert_eq!(map.get("beans"), Quantity::from_units(36));
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("CASH".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::ExternalCard);
        assert_eq!("qr".parse::<PaymentMethod>().unwrap(), PaymentMethod::EWallet);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_low_stock() {
        let now = Utc::now();
        let mut milk = Ingredient {
            id: "milk".to_string(),
            name: "Whole Milk".to_string(),
            unit: "ml".to_string(),
            quantity_milli: 2_000_000,
            low_stock_threshold_milli: 1_000_000,
            created_at: now,
            updated_at: now,
        };
        assert!(!milk.is_low_stock());
        milk.quantity_milli = 1_000_000;
        assert!(milk.is_low_stock());
    }
}
