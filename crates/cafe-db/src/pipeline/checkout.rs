//! # Checkout
//!
//! Turns a draft order into a committed sale.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Non-empty order, valid cashier                                      │
//! │  2. Cash: tendered >= total, change = tendered - total                  │
//! │  3. Expand every line's recipe, sum demand per ingredient               │
//! │  4. Advisory check of the summed demand against a ledger snapshot      │
//! │  5. One transaction:                                                    │
//! │       INSERT sale (+ items + consumption snapshot)   ← takes write lock │
//! │       for each ingredient:                                              │
//! │         UPDATE ... SET qty = qty - n WHERE id = ? AND qty >= n          │
//! │         0 rows → ROLLBACK, InsufficientStock                            │
//! │         1 row  → stock_movements (sale, -n)                             │
//! │     COMMIT                                                              │
//! │  6. Clear the draft                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 4 only gives a friendly early answer; step 5 is authoritative. Two
//! terminals racing for the last units serialize on the write lock and the
//! loser's conditional decrement affects no row, so the ledger never goes
//! negative and no sale is stored without its debits.
//!
//! A failed checkout leaves the draft intact so the cashier can adjust it
//! and try again. A successful one empties it, so submitting the same draft
//! twice cannot record a second sale.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

use cafe_core::validation::{validate_cash_tendered, validate_cashier_id, validate_order_size};
use cafe_core::{
    check_consumption, CheckoutError, CheckoutReceipt, ConsumptionMap, DraftOrder, Money, MovementKind,
    PaymentMethod, PaymentRequest, Quantity, Sale, Shortfall, StockSnapshot,
};

use crate::error::DbError;
use crate::repository::ingredient::{self, IngredientRepository};
use crate::repository::recipe::RecipeRepository;
use crate::repository::sale::{self, NewSale};

#[derive(Debug, Clone)]
pub struct CheckoutPipeline {
    pool: SqlitePool,
    recipes: RecipeRepository,
    ingredients: IngredientRepository,
    terminal_id: String,
}

/// Cash amounts settled for a sale.
struct Settlement {
    cash_tendered_cents: Option<i64>,
    change_cents: Option<i64>,
}

impl CheckoutPipeline {
    pub fn new(pool: SqlitePool, terminal_id: impl Into<String>) -> Self {
        CheckoutPipeline {
            recipes: RecipeRepository::new(pool.clone()),
            ingredients: IngredientRepository::new(pool.clone()),
            pool,
            terminal_id: terminal_id.into(),
        }
    }

    pub fn terminal_id(&self) -> &str {
        &self.terminal_id
    }

    /// Commits `order` as a sale and clears it.
    ///
    /// On any error nothing is stored and `order` is unchanged.
    pub async fn checkout(
        &self,
        order: &mut DraftOrder,
        cashier_id: &str,
        payment: PaymentRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if order.is_empty() {
            return Err(CheckoutError::EmptyOrder);
        }
        validate_cashier_id(cashier_id)?;
        validate_order_size(order.lines().len())?;

        let totals = order.totals();
        let settlement = settle(&payment, Money::from_cents(totals.total_cents))?;

        let consumption = self.consumption_for(order).await?;

        let stock = self
            .ingredients
            .snapshot(&consumption.ingredient_ids())
            .await
            .map_err(commit_failure)?;
        let shortfalls = check_consumption(&consumption, &stock);
        if !shortfalls.is_empty() {
            warn!(
                terminal_id = %self.terminal_id,
                shortfalls = shortfalls.len(),
                "Checkout rejected before commit: insufficient stock"
            );
            return Err(CheckoutError::InsufficientStock { shortfalls });
        }

        let new_sale = NewSale {
            cashier_id: cashier_id.trim().to_string(),
            terminal_id: self.terminal_id.clone(),
            payment_method: payment.method,
            cash_tendered_cents: settlement.cash_tendered_cents,
            change_cents: settlement.change_cents,
            subtotal_cents: totals.subtotal_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            lines: order.lines().to_vec(),
            consumption,
            created_at: Utc::now(),
        };

        let sale = self.commit(new_sale, &stock).await?;

        order.clear();

        info!(
            sale_id = sale.id,
            receipt = %sale.receipt_number(),
            terminal_id = %sale.terminal_id,
            cashier_id = %sale.cashier_id,
            payment_method = %sale.payment_method,
            total = %sale.total(),
            "Sale committed"
        );

        let change_cents = sale.change_cents.unwrap_or(0);
        Ok(CheckoutReceipt { sale, change_cents })
    }

    /// Step 5: journals the sale and applies its conditional debits in one
    /// transaction. `stock` is the advisory snapshot and only names the
    /// ingredients in shortfalls; it may be stale.
    async fn commit(&self, new_sale: NewSale, stock: &StockSnapshot) -> Result<Sale, CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(|e| commit_failure(e.into()))?;

        let sale = sale::append(&mut tx, new_sale).await.map_err(commit_failure)?;

        let shortfalls = debit_all(&mut tx, sale.id, &sale.consumption_map(), stock)
            .await
            .map_err(commit_failure)?;
        if !shortfalls.is_empty() {
            // Dropping the transaction rolls the sale insert back too.
            drop(tx);
            warn!(
                terminal_id = %self.terminal_id,
                shortfalls = shortfalls.len(),
                "Checkout rolled back: stock taken by a concurrent sale"
            );
            return Err(CheckoutError::InsufficientStock { shortfalls });
        }

        tx.commit()
            .await
            .map_err(|e| commit_failure(DbError::TransactionFailed(e.to_string())))?;

        Ok(sale)
    }

    /// Summed ingredient demand of every line, recipes read now.
    async fn consumption_for(&self, order: &DraftOrder) -> Result<ConsumptionMap, CheckoutError> {
        let mut consumption = ConsumptionMap::new();
        for line in order.lines() {
            let recipe = self
                .recipes
                .expand_recipe(&line.item_id)
                .await
                .map_err(commit_failure)?;
            consumption.merge(&ConsumptionMap::expand(&recipe, line.quantity));
        }
        Ok(consumption)
    }
}

/// Validates the payment against the total.
///
/// Only cash records a tendered amount and change. A cash request without a
/// tendered amount counts as zero tendered.
fn settle(payment: &PaymentRequest, total: Money) -> Result<Settlement, CheckoutError> {
    match payment.method {
        PaymentMethod::Cash => {
            let tendered = payment.cash_tendered_cents.unwrap_or(0);
            validate_cash_tendered(tendered)?;
            if tendered < total.cents() {
                return Err(CheckoutError::InsufficientPayment {
                    total,
                    tendered: Money::from_cents(tendered),
                });
            }
            Ok(Settlement {
                cash_tendered_cents: Some(tendered),
                change_cents: Some(tendered - total.cents()),
            })
        }
        PaymentMethod::ExternalCard | PaymentMethod::EWallet => Ok(Settlement {
            cash_tendered_cents: None,
            change_cents: None,
        }),
    }
}

/// Conditionally debits every ingredient and logs a movement for each.
///
/// Returns the shortfalls of the debits that affected no row. When the list
/// is non-empty the caller must roll back.
async fn debit_all(
    conn: &mut SqliteConnection,
    sale_id: i64,
    consumption: &ConsumptionMap,
    names: &StockSnapshot,
) -> Result<Vec<Shortfall>, DbError> {
    let now = Utc::now();
    let mut shortfalls = Vec::new();

    for (ingredient_id, amount) in consumption.iter() {
        if ingredient::debit(conn, ingredient_id, amount).await? {
            ingredient::record_movement(
                conn,
                ingredient_id,
                MovementKind::Sale,
                -amount,
                Some(sale_id),
                None,
                now,
            )
            .await?;
            continue;
        }

        let on_hand = ingredient::fetch_quantity(conn, ingredient_id)
            .await?
            .unwrap_or(Quantity::ZERO);
        shortfalls.push(Shortfall {
            ingredient_id: ingredient_id.to_string(),
            ingredient_name: names.name_of(ingredient_id).to_string(),
            required: amount,
            on_hand,
            missing: amount - on_hand,
        });
    }

    Ok(shortfalls)
}

fn commit_failure(err: DbError) -> CheckoutError {
    error!(error = %err, "Checkout commit failed");
    CheckoutError::CommitFailure(err.to_string())
}
