//! # Validation Module
//!
//! Input validation for the order/inventory engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register UI                                                  │
//! │  └── Immediate feedback (empty fields, obvious typos)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantities, prices, ids, reasons                                  │
//! │  └── Runs before any ledger or journal access                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity_milli >= 0)                                       │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cafe_core::validation::{validate_quantity, validate_void_reason};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_void_reason("  ").is_err());
//! ```

use crate::error::ValidationError;
use crate::quantity::Quantity;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES, MAX_PRICE_CENTS, MAX_RECIPE_QUANTITY_MILLI, MAX_STOCK_MILLI};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted void / adjustment reason.
pub const MAX_REASON_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a menu SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, underscores only
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_sku;
///
/// assert!(validate_sku("LATTE-12").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (menu item, ingredient, category).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates the cashier recorded on a sale. The id itself comes from the
/// external session layer and is not interpreted here.
pub fn validate_cashier_id(cashier_id: &str) -> ValidationResult<()> {
    if cashier_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "cashier_id".to_string(),
        });
    }
    if cashier_id.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "cashier_id".to_string(),
            max: 100,
        });
    }
    Ok(())
}

/// Void reasons are mandatory: a void must be explainable at end of day.
///
/// ## Returns
/// The trimmed reason.
pub fn validate_void_reason(reason: &str) -> ValidationResult<String> {
    validate_reason("reason", reason)
}

/// Shared rule for void and stock adjustment reasons.
pub fn validate_reason(field: &str, reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if reason.len() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(reason.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a draft line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (staff drinks, freebies).
///
/// Capped at [`MAX_PRICE_CENTS`] so line and order totals cannot overflow.
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(450).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX / 10).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates an amount of cash handed over at checkout.
pub fn validate_cash_tendered(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "cash_tendered".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a per-unit recipe requirement. Must be positive and at most
/// [`MAX_RECIPE_QUANTITY_MILLI`].
pub fn validate_recipe_quantity(per_unit: Quantity) -> ValidationResult<()> {
    if !per_unit.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity_per_unit".to_string(),
        });
    }
    if per_unit.milli() > MAX_RECIPE_QUANTITY_MILLI {
        return Err(ValidationError::OutOfRange {
            field: "quantity_per_unit".to_string(),
            min: 1,
            max: MAX_RECIPE_QUANTITY_MILLI,
        });
    }
    Ok(())
}

/// Validates a receiving / pullout amount. Must be positive; the direction
/// comes from the operation.
pub fn validate_stock_delta(delta: Quantity) -> ValidationResult<()> {
    if !delta.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if delta.milli() > MAX_STOCK_MILLI {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK_MILLI,
        });
    }
    Ok(())
}

/// Validates a low-stock threshold or opening stock level.
pub fn validate_stock_level(field: &str, level: Quantity) -> ValidationResult<()> {
    if level.is_negative() || level.milli() > MAX_STOCK_MILLI {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_MILLI,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates order size (number of distinct lines).
pub fn validate_order_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "order lines".to_string(),
            min: 0,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string (ingredient and menu item ids).
///
/// ```rust
/// use cafe_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("LATTE-12").is_ok());
        assert!(validate_sku("cold_brew").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_void_reason_trims() {
        assert_eq!(validate_void_reason("  wrong drink ").unwrap(), "wrong drink");
        assert!(validate_void_reason("").is_err());
        assert!(validate_void_reason(&"x".repeat(MAX_REASON_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_stock_quantities() {
        assert!(validate_stock_delta(Quantity::from_milli(1)).is_ok());
        assert!(validate_stock_delta(Quantity::ZERO).is_err());
        assert!(validate_recipe_quantity(Quantity::from_milli(-5)).is_err());
        assert!(validate_stock_level("threshold", Quantity::ZERO).is_ok());
        assert!(validate_stock_level("threshold", Quantity::from_milli(-1)).is_err());
    }

    #[test]
    fn test_bounds_keep_order_arithmetic_in_range() {
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_recipe_quantity(Quantity::from_milli(MAX_RECIPE_QUANTITY_MILLI)).is_ok());
        assert!(validate_recipe_quantity(Quantity::from_milli(i64::MAX / 10)).is_err());
        assert!(validate_stock_delta(Quantity::from_milli(MAX_STOCK_MILLI + 1)).is_err());
        assert!(validate_stock_level("opening stock", Quantity::from_milli(i64::MAX)).is_err());

        // Worst-case order still fits.
        let lines = MAX_ORDER_LINES as i64;
        assert!(MAX_PRICE_CENTS.checked_mul(MAX_ITEM_QUANTITY * lines).is_some());
        let demand = MAX_RECIPE_QUANTITY_MILLI * MAX_ITEM_QUANTITY * lines;
        assert!(demand <= MAX_STOCK_MILLI);
    }

    #[test]
    fn test_validate_cashier_id() {
        assert!(validate_cashier_id("barista-07").is_ok());
        assert!(validate_cashier_id("   ").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(1200).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_order_size() {
        assert!(validate_order_size(MAX_ORDER_LINES).is_ok());
        assert!(validate_order_size(MAX_ORDER_LINES + 1).is_err());
    }
}
