//! # Void
//!
//! Reverses a committed sale: marks it voided and credits back exactly what
//! its checkout debited.
//!
//! ```text
//!  BEGIN
//!    UPDATE sales SET voided = 1 ... WHERE id = ? AND voided = 0   ← write lock
//!      0 rows → not found / already voided, ROLLBACK
//!    SELECT sale_consumption                                       (snapshot)
//!    for each line: credit ingredient, stock_movements (void, +n)
//!  COMMIT
//! ```
//!
//! Credits come from the consumption snapshot stored with the sale, never
//! from the current recipe, so a recipe edited after the sale cannot skew
//! the ledger. The `voided = 0` guard makes the flag flip and the credits
//! happen at most once per sale even when two terminals void together.

use sqlx::SqlitePool;
use tracing::{error, info, warn};

use cafe_core::validation::validate_void_reason;
use cafe_core::{MovementKind, Sale, VoidError, VoidPatch};

use crate::error::DbError;
use crate::repository::ingredient;
use crate::repository::sale;

#[derive(Debug, Clone)]
pub struct VoidPipeline {
    pool: SqlitePool,
}

impl VoidPipeline {
    pub fn new(pool: SqlitePool) -> Self {
        VoidPipeline { pool }
    }

    /// Voids a sale and restores its ingredients. Returns the voided sale.
    pub async fn void_sale(&self, sale_id: i64, reason: &str) -> Result<Sale, VoidError> {
        let reason = validate_void_reason(reason)?;
        let patch = VoidPatch::new(reason);

        let mut tx = self.pool.begin().await.map_err(|e| void_failure(e.into()))?;

        let applied = sale::apply_void(&mut tx, sale_id, &patch)
            .await
            .map_err(void_failure)?;

        let sale = sale::fetch_sale(&mut tx, sale_id).await.map_err(void_failure)?;
        let Some(sale) = sale else {
            warn!(sale_id, "Void rejected: sale not found");
            return Err(VoidError::SaleNotFound(sale_id));
        };
        if !applied {
            warn!(sale_id, "Void rejected: sale already voided");
            return Err(VoidError::AlreadyVoided(sale_id));
        }

        for line in &sale.consumption {
            let amount = line.quantity();
            let credited = ingredient::credit(&mut tx, &line.ingredient_id, amount)
                .await
                .map_err(void_failure)?;
            if !credited {
                return Err(void_failure(DbError::not_found("ingredient", &line.ingredient_id)));
            }
            ingredient::record_movement(
                &mut tx,
                &line.ingredient_id,
                MovementKind::Void,
                amount,
                Some(sale_id),
                Some(patch.reason.as_str()),
                patch.voided_at,
            )
            .await
            .map_err(void_failure)?;
        }

        tx.commit()
            .await
            .map_err(|e| void_failure(DbError::TransactionFailed(e.to_string())))?;

        info!(
            sale_id,
            receipt = %sale.receipt_number(),
            ingredients_restored = sale.consumption.len(),
            reason = %patch.reason,
            "Sale voided"
        );
        Ok(sale)
    }
}

fn void_failure(err: DbError) -> VoidError {
    error!(error = %err, "Void commit failed");
    VoidError::VoidFailure(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;
    use cafe_core::{DraftOrder, PaymentRequest, Quantity, SaleStatus, TaxRate};

    async fn sell_lattes(cafe: &fixture::Cafe, quantity: i64) -> Sale {
        let mut order = DraftOrder::new(TaxRate::zero());
        cafe.db.orders().add_line(&mut order, &cafe.latte.id, quantity).await.unwrap();
        cafe.db
            .checkout("pos-01")
            .checkout(&mut order, "cashier-1", PaymentRequest::card())
            .await
            .unwrap()
            .sale
    }

    #[tokio::test]
    async fn test_void_restores_stock() {
        let cafe = fixture::cafe().await;
        let sale = sell_lattes(&cafe, 5).await;
        assert_eq!(cafe.milk_on_hand().await, Quantity::ZERO);

        let voided = cafe.db.voids().void_sale(sale.id, "customer changed mind").await.unwrap();

        assert_eq!(voided.status(), SaleStatus::Voided);
        assert_eq!(voided.void_reason.as_deref(), Some("customer changed mind"));
        assert!(voided.voided_at.is_some());
        assert_eq!(cafe.milk_on_hand().await, Quantity::from_units(5));

        let stored = cafe.db.sales().get_by_id(sale.id).await.unwrap().unwrap();
        assert!(stored.voided);
        assert_eq!(stored.total_cents, sale.total_cents);
        assert_eq!(stored.items, sale.items);
    }

    #[tokio::test]
    async fn test_double_void_rejected() {
        let cafe = fixture::cafe().await;
        let sale = sell_lattes(&cafe, 2).await;
        let voids = cafe.db.voids();

        voids.void_sale(sale.id, "wrong item").await.unwrap();
        let err = voids.void_sale(sale.id, "wrong item").await.unwrap_err();

        assert!(matches!(err, VoidError::AlreadyVoided(id) if id == sale.id));
        assert_eq!(cafe.milk_on_hand().await, Quantity::from_units(5));
    }

    #[tokio::test]
    async fn test_unknown_sale_and_missing_reason() {
        let cafe = fixture::cafe().await;
        let voids = cafe.db.voids();

        let err = voids.void_sale(404, "mistake").await.unwrap_err();
        assert!(matches!(err, VoidError::SaleNotFound(404)));

        let sale = sell_lattes(&cafe, 1).await;
        let err = voids.void_sale(sale.id, "   ").await.unwrap_err();
        assert!(matches!(err, VoidError::Validation(_)));
        assert!(!cafe.db.sales().get_by_id(sale.id).await.unwrap().unwrap().voided);
    }

    #[tokio::test]
    async fn test_credits_follow_snapshot_not_current_recipe() {
        let cafe = fixture::cafe().await;
        let sale = sell_lattes(&cafe, 2).await;

        // Recipe doubles after the sale; the void must still credit 2.
        cafe.db
            .recipes()
            .set_recipe(&cafe.latte.id, &[(cafe.milk.id.clone(), Quantity::from_units(2))])
            .await
            .unwrap();
        cafe.db.voids().void_sale(sale.id, "refund").await.unwrap();

        assert_eq!(cafe.milk_on_hand().await, Quantity::from_units(5));
    }

    #[tokio::test]
    async fn test_void_movements_mirror_sale_movements() {
        let cafe = fixture::cafe().await;
        let sale = sell_lattes(&cafe, 3).await;
        cafe.db.voids().void_sale(sale.id, "refund").await.unwrap();

        let movements = cafe.db.ingredients().movements_for_sale(sale.id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].kind, MovementKind::Sale);
        assert_eq!(movements[1].kind, MovementKind::Void);
        assert_eq!(movements[0].delta_milli + movements[1].delta_milli, 0);
        assert_eq!(movements[1].note.as_deref(), Some("refund"));
    }

    #[tokio::test]
    async fn test_voided_sale_leaves_summary_totals() {
        let cafe = fixture::cafe().await;
        let kept = sell_lattes(&cafe, 1).await;
        let refunded = sell_lattes(&cafe, 2).await;
        cafe.db.voids().void_sale(refunded.id, "refund").await.unwrap();

        let summary = cafe.sales_summary().await;
        assert_eq!(summary.committed_count, 1);
        assert_eq!(summary.voided_count, 1);
        assert_eq!(summary.net_cents, kept.total_cents);
    }

    #[tokio::test]
    async fn test_externally_sourced_void_leaves_ledger_alone() {
        let cafe = fixture::cafe().await;
        let mut order = DraftOrder::new(TaxRate::zero());
        cafe.db.orders().add_line(&mut order, &cafe.water.id, 4).await.unwrap();
        let sale = cafe
            .db
            .checkout("pos-01")
            .checkout(&mut order, "cashier-1", PaymentRequest::card())
            .await
            .unwrap()
            .sale;

        let voided = cafe.db.voids().void_sale(sale.id, "refund").await.unwrap();

        assert!(voided.voided);
        assert_eq!(cafe.milk_on_hand().await, Quantity::from_units(5));
        assert!(cafe.db.ingredients().movements_for_sale(sale.id).await.unwrap().is_empty());
    }
}
