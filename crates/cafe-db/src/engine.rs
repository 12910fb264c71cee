//! # Engine
//!
//! The single handle a register holds: configuration plus database, with
//! the operations the UI invokes.
//!
//! ```text
//!  UI action                 Engine method            Result
//!  ─────────────────────     ─────────────────────    ──────────────────────
//!  tap menu item             add_line                 CoreResult<()>
//!  edit quantity             set_line_quantity        CoreResult<()>
//!  remove / clear            remove_line, clear_order bool / ()
//!  grey out buttons          check_availability       CoreResult<Availability>
//!  pay                       checkout                 Result<CheckoutReceipt, CheckoutError>
//!  void from history         void_sale                Result<Sale, VoidError>
//!  reprint receipt           get_sale                 DbResult<Option<Sale>>
//! ```
//!
//! Every failure maps to an [`ErrorReport`](cafe_core::ErrorReport) for the
//! UI through `From`.

use thiserror::Error;
use tracing::info;

use cafe_core::{
    Availability, CheckoutError, CheckoutReceipt, CoreResult, DraftOrder, PaymentRequest, Sale, VoidError,
};

use crate::config::{ConfigError, EngineConfig};
use crate::error::{DbError, DbResult};
use crate::pipeline::{AvailabilityService, CheckoutPipeline, DraftOrderService, VoidPipeline};
use crate::pool::Database;

/// Startup failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    config: EngineConfig,
    availability: AvailabilityService,
    orders: DraftOrderService,
    checkout: CheckoutPipeline,
    voids: VoidPipeline,
}

impl Engine {
    /// Opens (and migrates) the configured database.
    pub async fn open(config: EngineConfig) -> Result<Self, EngineError> {
        let db = Database::new(config.db_config()?).await?;
        info!(
            terminal_id = %config.terminal_id(),
            store = %config.store.name,
            tax_rate = config.tax_rate().percentage(),
            "Engine ready"
        );
        Ok(Self::with_database(db, config))
    }

    /// Wraps an already open database.
    pub fn with_database(db: Database, config: EngineConfig) -> Self {
        Engine {
            availability: db.availability(),
            orders: db.orders(),
            checkout: db.checkout(config.terminal_id()),
            voids: db.voids(),
            db,
            config,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// An empty draft taxed at the store's rate.
    pub fn new_order(&self) -> DraftOrder {
        DraftOrder::new(self.config.tax_rate())
    }

    pub async fn check_availability(&self, item_id: &str, quantity: i64) -> CoreResult<Availability> {
        self.availability.check_availability(item_id, quantity).await
    }

    pub async fn add_line(&self, order: &mut DraftOrder, item_id: &str, quantity: i64) -> CoreResult<()> {
        self.orders.add_line(order, item_id, quantity).await
    }

    pub async fn set_line_quantity(&self, order: &mut DraftOrder, item_id: &str, quantity: i64) -> CoreResult<()> {
        self.orders.set_line_quantity(order, item_id, quantity).await
    }

    pub fn remove_line(&self, order: &mut DraftOrder, item_id: &str) -> bool {
        self.orders.remove_line(order, item_id)
    }

    pub fn clear_order(&self, order: &mut DraftOrder) {
        self.orders.clear_order(order)
    }

    pub async fn checkout(
        &self,
        order: &mut DraftOrder,
        cashier_id: &str,
        payment: PaymentRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        self.checkout.checkout(order, cashier_id, payment).await
    }

    pub async fn void_sale(&self, sale_id: i64, reason: &str) -> Result<Sale, VoidError> {
        self.voids.void_sale(sale_id, reason).await
    }

    pub async fn get_sale(&self, sale_id: i64) -> DbResult<Option<Sale>> {
        self.db.sales().get_by_id(sale_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;
    use cafe_core::{ErrorReport, Money, Quantity};

    async fn engine_with_tax(bps: u32) -> (Engine, fixture::Cafe) {
        let cafe = fixture::cafe().await;
        let mut config = EngineConfig::default();
        config.store.tax_rate_bps = bps;
        config.terminal.id = "pos-07".to_string();
        (Engine::with_database(cafe.db.clone(), config), cafe)
    }

    #[tokio::test]
    async fn test_register_flow() {
        let (engine, cafe) = engine_with_tax(1000).await;
        let mut order = engine.new_order();

        engine.add_line(&mut order, &cafe.latte.id, 2).await.unwrap();
        engine.add_line(&mut order, &cafe.water.id, 1).await.unwrap();
        assert_eq!(order.subtotal(), Money::from_cents(1050));
        assert_eq!(order.tax(), Money::from_cents(105));

        let receipt = engine
            .checkout(&mut order, "cashier-1", PaymentRequest::cash(Money::from_cents(2000)))
            .await
            .unwrap();
        assert_eq!(receipt.sale.total_cents, 1155);
        assert_eq!(receipt.change(), Money::from_cents(845));
        assert_eq!(receipt.sale.terminal_id, "pos-07");
        assert_eq!(cafe.milk_on_hand().await, Quantity::from_units(3));

        let sale = engine.get_sale(receipt.sale.id).await.unwrap().unwrap();
        assert_eq!(sale.receipt_number(), receipt.sale.receipt_number());

        engine.void_sale(sale.id, "wrong order").await.unwrap();
        assert_eq!(cafe.milk_on_hand().await, Quantity::from_units(5));
        assert!(engine.get_sale(sale.id).await.unwrap().unwrap().voided);
    }

    #[tokio::test]
    async fn test_failures_become_reports() {
        let (engine, cafe) = engine_with_tax(0).await;
        let mut order = engine.new_order();

        let err = engine.add_line(&mut order, &cafe.latte.id, 6).await.unwrap_err();
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, "INSUFFICIENT_STOCK");
        assert_eq!(report.shortfalls[0].ingredient_name, "Milk");

        let err = engine
            .checkout(&mut order, "cashier-1", PaymentRequest::card())
            .await
            .unwrap_err();
        assert_eq!(ErrorReport::from(&err).code, "EMPTY_ORDER");

        let err = engine.void_sale(9, "mistake").await.unwrap_err();
        assert_eq!(ErrorReport::from(&err).code, "SALE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.database.path = Some(dir.path().join("register.db"));

        let engine = Engine::open(config).await.unwrap();

        assert!(engine.database().health_check().await);
        assert!(engine.database().migration_status().await.unwrap().is_current());
        assert!(engine.new_order().is_empty());
    }
}
