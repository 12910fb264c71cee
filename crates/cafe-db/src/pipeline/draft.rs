//! # Draft Orders
//!
//! Order entry on the register. The draft itself lives in memory
//! ([`DraftOrder`]); this service feeds it the menu item and a fresh
//! availability verdict for every change that grows a line.
//!
//! ## Order Lifecycle
//! ```text
//! ┌──────────┐  add_line        ┌──────────┐  checkout    ┌──────────┐
//! │  Empty   │─────────────────►│ Building │─────────────►│  Sale    │
//! │  draft   │  set_quantity    │          │  (pipeline)  │ (stored) │
//! └──────────┘  remove_line     └──────────┘              └──────────┘
//!      ▲                             │
//!      └──────── clear_order ────────┘
//! ```
//!
//! A rejected change leaves the draft exactly as it was. Nothing here writes
//! to the database.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use cafe_core::{check_availability, CoreError, CoreResult, DraftOrder};

use crate::pipeline::availability::AvailabilityService;

#[derive(Debug, Clone)]
pub struct DraftOrderService {
    availability: AvailabilityService,
}

impl DraftOrderService {
    pub fn new(pool: SqlitePool) -> Self {
        DraftOrderService {
            availability: AvailabilityService::new(pool),
        }
    }

    /// Adds `quantity` of an item, merging with an existing line.
    ///
    /// The line's resulting quantity must be makeable from current stock.
    pub async fn add_line(&self, order: &mut DraftOrder, item_id: &str, quantity: i64) -> CoreResult<()> {
        let item = self.availability.load_item(item_id).await?;
        let (recipe, stock) = self.availability.load_context(&item).await?;

        order
            .add_line(&item, quantity, |target| {
                check_availability(&item.id, &recipe, &stock, target)
            })
            .map_err(log_rejection)?;

        debug!(item_id = %item.id, line_quantity = order.quantity_of(&item.id), "Line added");
        Ok(())
    }

    /// Sets a line to an absolute quantity; zero or less removes it.
    pub async fn set_line_quantity(&self, order: &mut DraftOrder, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_line(order, item_id);
            return Ok(());
        }
        if order.quantity_of(item_id) == 0 {
            return Err(CoreError::LineNotFound(item_id.to_string()));
        }

        let item = self.availability.load_item(item_id).await?;
        let (recipe, stock) = self.availability.load_context(&item).await?;

        order
            .set_line_quantity(item_id, quantity, |target| {
                check_availability(&item.id, &recipe, &stock, target)
            })
            .map_err(log_rejection)?;

        debug!(item_id = %item_id, quantity, "Line quantity set");
        Ok(())
    }

    /// Returns whether a line was present.
    pub fn remove_line(&self, order: &mut DraftOrder, item_id: &str) -> bool {
        let removed = order.remove_line(item_id);
        debug!(item_id = %item_id, removed, "Line removed");
        removed
    }

    pub fn clear_order(&self, order: &mut DraftOrder) {
        order.clear();
        debug!("Draft order cleared");
    }
}

fn log_rejection(err: CoreError) -> CoreError {
    if let CoreError::InsufficientStock { item_id, shortfalls } = &err {
        warn!(item_id = %item_id, shortfalls = shortfalls.len(), "Line rejected: insufficient stock");
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;
    use cafe_core::{
        Money, Quantity, TaxRate, ValidationError, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_RECIPE_QUANTITY_MILLI,
        MAX_STOCK_MILLI,
    };

    #[tokio::test]
    async fn test_add_rejected_when_stock_short() {
        let cafe = fixture::cafe().await;
        let orders = cafe.db.orders();
        let mut order = DraftOrder::new(TaxRate::zero());

        let err = orders.add_line(&mut order, &cafe.latte.id, 6).await.unwrap_err();
        match err {
            CoreError::InsufficientStock { shortfalls, .. } => {
                assert_eq!(shortfalls[0].ingredient_id, cafe.milk.id);
                assert_eq!(shortfalls[0].missing, Quantity::from_units(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(order.is_empty());

        orders.add_line(&mut order, &cafe.latte.id, 5).await.unwrap();
        assert_eq!(order.quantity_of(&cafe.latte.id), 5);
    }

    #[tokio::test]
    async fn test_catalog_bounds_keep_a_full_line_priceable() {
        let cafe = fixture::cafe().await;
        let cream = cafe
            .db
            .ingredients()
            .insert("Cream", "L", Quantity::from_milli(MAX_STOCK_MILLI), Quantity::ZERO)
            .await
            .unwrap();

        let err = cafe
            .db
            .menu()
            .insert("GOLD", "Gold Latte", "Coffee", Money::from_cents(i64::MAX / 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let bulk = cafe
            .db
            .menu()
            .insert("BULK", "Catering Urn", "Coffee", Money::from_cents(MAX_PRICE_CENTS))
            .await
            .unwrap();
        let err = cafe
            .db
            .recipes()
            .set_recipe(&bulk.id, &[(cream.id.clone(), Quantity::from_milli(i64::MAX / 10))])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        cafe.db
            .recipes()
            .set_recipe(&bulk.id, &[(cream.id.clone(), Quantity::from_milli(MAX_RECIPE_QUANTITY_MILLI))])
            .await
            .unwrap();

        let mut order = DraftOrder::new(TaxRate::from_bps(10000));
        cafe.db.orders().add_line(&mut order, &bulk.id, MAX_ITEM_QUANTITY).await.unwrap();

        assert_eq!(order.subtotal(), Money::from_cents(MAX_PRICE_CENTS * MAX_ITEM_QUANTITY));
        assert_eq!(order.total(), Money::from_cents(2 * MAX_PRICE_CENTS * MAX_ITEM_QUANTITY));
    }

    #[tokio::test]
    async fn test_merge_checks_combined_quantity() {
        let cafe = fixture::cafe().await;
        let orders = cafe.db.orders();
        let mut order = DraftOrder::new(TaxRate::zero());

        orders.add_line(&mut order, &cafe.latte.id, 3).await.unwrap();
        let err = orders.add_line(&mut order, &cafe.latte.id, 3).await.unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(order.quantity_of(&cafe.latte.id), 3);
        assert_eq!(order.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_externally_sourced_item_never_blocked() {
        let cafe = fixture::cafe().await;
        let orders = cafe.db.orders();
        let mut order = DraftOrder::new(TaxRate::zero());

        orders.add_line(&mut order, &cafe.water.id, 999).await.unwrap();
        assert_eq!(order.total(), Money::from_cents(999 * 150));
    }

    #[tokio::test]
    async fn test_price_frozen_at_add() {
        let cafe = fixture::cafe().await;
        let orders = cafe.db.orders();
        let mut order = DraftOrder::new(TaxRate::zero());

        orders.add_line(&mut order, &cafe.water.id, 1).await.unwrap();
        cafe.db.menu().update_price(&cafe.water.id, Money::from_cents(200)).await.unwrap();
        orders.add_line(&mut order, &cafe.water.id, 1).await.unwrap();

        assert_eq!(order.subtotal(), Money::from_cents(300));
    }

    #[tokio::test]
    async fn test_set_quantity_and_remove() {
        let cafe = fixture::cafe().await;
        let orders = cafe.db.orders();
        let mut order = DraftOrder::new(TaxRate::zero());

        let err = orders.set_line_quantity(&mut order, &cafe.latte.id, 2).await.unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound(_)));

        orders.add_line(&mut order, &cafe.latte.id, 1).await.unwrap();
        orders.set_line_quantity(&mut order, &cafe.latte.id, 4).await.unwrap();
        assert_eq!(order.quantity_of(&cafe.latte.id), 4);

        let err = orders.set_line_quantity(&mut order, &cafe.latte.id, 7).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(order.quantity_of(&cafe.latte.id), 4);

        orders.set_line_quantity(&mut order, &cafe.latte.id, 0).await.unwrap();
        assert!(order.is_empty());

        orders.add_line(&mut order, &cafe.water.id, 2).await.unwrap();
        assert!(orders.remove_line(&mut order, &cafe.water.id));
        assert!(!orders.remove_line(&mut order, &cafe.water.id));

        orders.add_line(&mut order, &cafe.water.id, 2).await.unwrap();
        orders.clear_order(&mut order);
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_and_unknown_items() {
        let cafe = fixture::cafe().await;
        let orders = cafe.db.orders();
        let mut order = DraftOrder::new(TaxRate::zero());
        cafe.db.menu().set_active(&cafe.water.id, false).await.unwrap();

        let err = orders.add_line(&mut order, &cafe.water.id, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::InactiveItem(_)));

        let err = orders.add_line(&mut order, "ghost", 1).await.unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(_)));
    }
}
