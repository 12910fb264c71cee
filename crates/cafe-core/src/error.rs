//! # Error Types
//!
//! Domain-specific error types for cafe-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cafe-core errors (this file)                                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── CoreError        - Draft order / availability failures            │
//! │  ├── CheckoutError    - Checkout pipeline outcomes                     │
//! │  └── VoidError        - Void pipeline outcomes                         │
//! │                                                                         │
//! │  cafe-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  UI boundary                                                           │
//! │  └── ErrorReport      - What the register sees (serialized)            │
//! │                                                                         │
//! │  Flow: DbError → CommitFailure / VoidFailure → ErrorReport → UI        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is a typed result returned to the caller. Nothing in the
//! engine retries on its own; a retried checkout starts over from validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::availability::Shortfall;
use crate::money::Money;

/// Renders `Milk short 1, Beans short 0.5` for error messages.
fn describe_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| format!("{} short {}", s.ingredient_name, s.missing))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Core Error
// =============================================================================

/// Draft order and availability errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Menu item id is unknown.
    #[error("Menu item not found: {0}")]
    ItemNotFound(String),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// Menu item exists but has been taken off the menu.
    #[error("Menu item is not available for sale: {0}")]
    InactiveItem(String),

    /// `set_line_quantity` on an item that is not in the order.
    #[error("Item {0} is not in the order")]
    LineNotFound(String),

    /// Not enough ingredients to make the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Add Latte (qty: 6), Milk on hand: 5
    ///      │
    ///      ▼
    /// check_availability → short { Milk: 1 }
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: "latte", shortfalls: [Milk short 1] }
    ///      │
    ///      ▼
    /// Order unchanged, UI shows which ingredient ran out
    /// ```
    #[error("Insufficient stock for {item_id}: {}", describe_shortfalls(.shortfalls))]
    InsufficientStock {
        item_id: String,
        shortfalls: Vec<Shortfall>,
    },

    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The stock ledger or catalog could not be read.
    #[error("Storage error: {0}")]
    Storage(String),
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Everything that can stop a draft order from becoming a sale.
///
/// On any of these the ledger and the journal are untouched.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cannot check out an empty order")]
    EmptyOrder,

    /// Stock moved since the items were added (or another terminal won the
    /// race for the last units).
    #[error("Insufficient stock: {}", describe_shortfalls(.shortfalls))]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    #[error("Cash tendered {tendered} is less than total {total}")]
    InsufficientPayment { total: Money, tendered: Money },

    /// The atomic commit failed and was rolled back.
    #[error("Checkout could not be committed: {0}")]
    CommitFailure(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Void Error
// =============================================================================

#[derive(Debug, Error)]
pub enum VoidError {
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Re-voiding is a caller error; the ledger is not touched again.
    #[error("Sale {0} is already voided")]
    AlreadyVoided(i64),

    /// The atomic void failed and was rolled back.
    #[error("Void could not be committed: {0}")]
    VoidFailure(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic or storage access runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Error Report
// =============================================================================

/// Serializable failure payload for the UI.
///
/// `code` is a stable machine-readable identifier; `message` is the Display
/// text. `shortfalls` is filled only for stock failures so the register can
/// name the missing ingredients.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortfalls: Vec<Shortfall>,
}

impl ErrorReport {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorReport {
            code: code.into(),
            message: message.into(),
            shortfalls: Vec::new(),
        }
    }

    fn with_shortfalls(mut self, shortfalls: &[Shortfall]) -> Self {
        self.shortfalls = shortfalls.to_vec();
        self
    }
}

impl From<&CoreError> for ErrorReport {
    fn from(err: &CoreError) -> Self {
        let code = match err {
            CoreError::ItemNotFound(_) => "ITEM_NOT_FOUND",
            CoreError::IngredientNotFound(_) => "INGREDIENT_NOT_FOUND",
            CoreError::InactiveItem(_) => "INACTIVE_ITEM",
            CoreError::LineNotFound(_) => "LINE_NOT_FOUND",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::OrderTooLarge { .. } => "ORDER_TOO_LARGE",
            CoreError::QuantityTooLarge { .. } => "QUANTITY_TOO_LARGE",
            CoreError::Validation(_) => "VALIDATION",
            CoreError::Storage(_) => "STORAGE",
        };
        let report = ErrorReport::new(code, err.to_string());
        match err {
            CoreError::InsufficientStock { shortfalls, .. } => report.with_shortfalls(shortfalls),
            _ => report,
        }
    }
}

impl From<&CheckoutError> for ErrorReport {
    fn from(err: &CheckoutError) -> Self {
        let code = match err {
            CheckoutError::EmptyOrder => "EMPTY_ORDER",
            CheckoutError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CheckoutError::InsufficientPayment { .. } => "INSUFFICIENT_PAYMENT",
            CheckoutError::CommitFailure(_) => "COMMIT_FAILURE",
            CheckoutError::Validation(_) => "VALIDATION",
        };
        let report = ErrorReport::new(code, err.to_string());
        match err {
            CheckoutError::InsufficientStock { shortfalls } => report.with_shortfalls(shortfalls),
            _ => report,
        }
    }
}

impl From<&VoidError> for ErrorReport {
    fn from(err: &VoidError) -> Self {
        let code = match err {
            VoidError::SaleNotFound(_) => "SALE_NOT_FOUND",
            VoidError::AlreadyVoided(_) => "ALREADY_VOIDED",
            VoidError::VoidFailure(_) => "VOID_FAILURE",
            VoidError::Validation(_) => "VALIDATION",
        };
        ErrorReport::new(code, err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;

    fn milk_short_one() -> Shortfall {
        Shortfall {
            ingredient_id: "milk".to_string(),
            ingredient_name: "Milk".to_string(),
            required: Quantity::from_units(6),
            on_hand: Quantity::from_units(5),
            missing: Quantity::from_units(1),
        }
    }

    #[test]
    fn test_insufficient_stock_message_names_ingredients() {
        let err = CoreError::InsufficientStock {
            item_id: "latte".to_string(),
            shortfalls: vec![milk_short_one()],
        };
        assert_eq!(err.to_string(), "Insufficient stock for latte: Milk short 1");
    }

    #[test]
    fn test_insufficient_payment_message() {
        let err = CheckoutError::InsufficientPayment {
            total: Money::from_cents(10_000),
            tendered: Money::from_cents(5_000),
        };
        assert_eq!(err.to_string(), "Cash tendered 50.00 is less than total 100.00");
    }

    #[test]
    fn test_validation_converts() {
        let err: CoreError = ValidationError::Required {
            field: "cashier_id".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));

        let err: VoidError = ValidationError::Required {
            field: "reason".to_string(),
        }
        .into();
        assert!(matches!(err, VoidError::Validation(_)));
    }

    #[test]
    fn test_report_carries_shortfalls() {
        let err = CheckoutError::InsufficientStock {
            shortfalls: vec![milk_short_one()],
        };
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, "INSUFFICIENT_STOCK");
        assert_eq!(report.shortfalls.len(), 1);
        assert_eq!(report.shortfalls[0].missing, Quantity::from_units(1));

        let report = ErrorReport::from(&VoidError::AlreadyVoided(7));
        assert_eq!(report.code, "ALREADY_VOIDED");
        assert!(report.shortfalls.is_empty());
    }

    #[test]
    fn test_report_json_omits_empty_shortfalls() {
        let json = serde_json::to_value(ErrorReport::from(&CheckoutError::EmptyOrder)).unwrap();
        assert_eq!(json["code"], "EMPTY_ORDER");
        assert!(json.get("shortfalls").is_none());

        let err = CoreError::InsufficientStock {
            item_id: "latte".to_string(),
            shortfalls: vec![milk_short_one()],
        };
        let json = serde_json::to_value(ErrorReport::from(&err)).unwrap();
        assert_eq!(json["shortfalls"][0]["ingredient_name"], "Milk");
    }
}
