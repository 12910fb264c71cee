//! # cafe-core: Pure Business Logic for Cafe POS
//!
//! This crate holds the order/inventory rules of the coffee shop POS as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cafe POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI layer (external)                          │   │
//! │  │    Menu ──► Draft Order ──► Tender ──► Receipt / Void          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cafe-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────────┐ ┌──────────────┐  │   │
//! │  │   │  money   │ │ quantity │ │ availability │ │    order     │  │   │
//! │  │   │  Money   │ │ Quantity │ │ Availability │ │  DraftOrder  │  │   │
//! │  │   │ TaxRate  │ │          │ │  Shortfall   │ │  DraftLine   │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────────┘ └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          cafe-db (Stock Ledger, Sale Journal, Pipelines)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ingredient, MenuItem, Sale, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`quantity`] - Fixed-point ingredient quantities
//! - [`recipe`] - Recipe expansion into ingredient consumption
//! - [`availability`] - Stock availability verdicts
//! - [`order`] - The in-memory draft order
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use cafe_core::money::Money;
//! use cafe_core::types::TaxRate;
//!
//! let price = Money::from_cents(1099);
//! let tax = price.calculate_tax(TaxRate::from_bps(1200));
//! assert_eq!(tax.cents(), 132);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod error;
pub mod money;
pub mod order;
pub mod quantity;
pub mod recipe;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use availability::{check_availability, check_consumption, Availability, Shortfall, StockSnapshot};
pub use error::{CheckoutError, CoreError, CoreResult, ErrorReport, ValidationError, VoidError};
pub use money::Money;
pub use order::{DraftLine, DraftOrder, OrderTotals};
pub use quantity::Quantity;
pub use recipe::ConsumptionMap;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single draft order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single item in a draft order.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest menu price in cents (100,000.00).
///
/// A full order of maximal lines stays far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

/// Largest per-unit recipe requirement, in milli-units (one million units).
pub const MAX_RECIPE_QUANTITY_MILLI: i64 = 1_000_000_000;

/// Ceiling for an ingredient's quantity on hand, and for any single
/// adjustment, in milli-units.
///
/// Covers a full order's demand (`MAX_ORDER_LINES × MAX_ITEM_QUANTITY ×
/// MAX_RECIPE_QUANTITY_MILLI`) with room to spare.
pub const MAX_STOCK_MILLI: i64 = 1_000_000_000_000_000;
