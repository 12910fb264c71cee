//! # Stock Ledger
//!
//! Authoritative ingredient quantities and the movement log behind them.
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Why The Debit Carries Its Own Guard                  │
//! │                                                                         │
//! │  ❌ Read-then-write (oversells under concurrency)                       │
//! │     SELECT quantity_milli ...           → 1000 on both terminals       │
//! │     UPDATE ... SET quantity_milli = 0   → both "succeed"               │
//! │                                                                         │
//! │  ✅ Conditional decrement                                               │
//! │     UPDATE ingredients                                                 │
//! │        SET quantity_milli = quantity_milli - :debit                    │
//! │      WHERE id = :id AND quantity_milli >= :debit                       │
//! │                                                                         │
//! │     rows_affected = 1  → debited                                       │
//! │     rows_affected = 0  → short (or unknown id); caller rolls back      │
//! │                                                                         │
//! │  SQLite serializes writers, so the guard is evaluated against the      │
//! │  committed quantity at the moment of the write.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every change to `quantity_milli` appends a `stock_movements` row in the
//! same transaction.
//!
//! The connection-level functions ([`debit`], [`credit`], [`record_movement`])
//! are the building blocks the checkout and void transactions compose. The
//! repository methods wrap them for standalone adjustments.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use cafe_core::availability::{Shortfall, StockSnapshot};
use cafe_core::validation::{validate_name, validate_reason, validate_stock_delta, validate_stock_level};
use cafe_core::{CoreError, CoreResult, Ingredient, MovementKind, Quantity, StockMovement, ValidationError, MAX_STOCK_MILLI};

use crate::error::{DbError, DbResult};

const INGREDIENT_COLUMNS: &str = r#"
    id, name, unit, quantity_milli, low_stock_threshold_milli, created_at, updated_at
"#;

const MOVEMENT_COLUMNS: &str = r#"
    id, ingredient_id, kind, delta_milli, sale_id, note, created_at
"#;

// =============================================================================
// Transaction building blocks
// =============================================================================

/// Conditionally debits an ingredient.
///
/// Returns `false` (and changes nothing) when the ingredient holds less
/// than `amount` or does not exist.
pub async fn debit(conn: &mut SqliteConnection, ingredient_id: &str, amount: Quantity) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE ingredients
        SET
            quantity_milli = quantity_milli - ?2,
            updated_at = ?3
        WHERE id = ?1 AND quantity_milli >= ?2
        "#,
    )
    .bind(ingredient_id)
    .bind(amount.milli())
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let debited = result.rows_affected() == 1;
    debug!(ingredient_id = %ingredient_id, delta_milli = -amount.milli(), debited, "Debit");
    Ok(debited)
}

/// Credits an ingredient. Returns `false` when the id is unknown.
pub async fn credit(conn: &mut SqliteConnection, ingredient_id: &str, amount: Quantity) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE ingredients
        SET
            quantity_milli = quantity_milli + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(ingredient_id)
    .bind(amount.milli())
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let credited = result.rows_affected() == 1;
    debug!(ingredient_id = %ingredient_id, delta_milli = amount.milli(), credited, "Credit");
    Ok(credited)
}

/// Credits an ingredient only while the result stays within `ceiling`.
///
/// Returns `false` (and changes nothing) when the credit would pass the
/// ceiling or the id is unknown.
pub async fn credit_within(
    conn: &mut SqliteConnection,
    ingredient_id: &str,
    amount: Quantity,
    ceiling: Quantity,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE ingredients
        SET
            quantity_milli = quantity_milli + ?2,
            updated_at = ?4
        WHERE id = ?1 AND quantity_milli <= ?3 - ?2
        "#,
    )
    .bind(ingredient_id)
    .bind(amount.milli())
    .bind(ceiling.milli())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let credited = result.rows_affected() == 1;
    debug!(ingredient_id = %ingredient_id, delta_milli = amount.milli(), credited, "Bounded credit");
    Ok(credited)
}

/// Appends a movement row. `delta` is signed: negative for debits.
pub async fn record_movement(
    conn: &mut SqliteConnection,
    ingredient_id: &str,
    kind: MovementKind,
    delta: Quantity,
    sale_id: Option<i64>,
    note: Option<&str>,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (ingredient_id, kind, delta_milli, sale_id, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(ingredient_id)
    .bind(kind)
    .bind(delta.milli())
    .bind(sale_id)
    .bind(note)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Current quantity on hand, read on an existing connection.
pub async fn fetch_quantity(conn: &mut SqliteConnection, ingredient_id: &str) -> DbResult<Option<Quantity>> {
    let milli: Option<i64> = sqlx::query_scalar("SELECT quantity_milli FROM ingredients WHERE id = ?1")
        .bind(ingredient_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(milli.map(Quantity::from_milli))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository over the `ingredients` and `stock_movements` tables.
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let sql = format!("SELECT {} FROM ingredients WHERE id = ?1", INGREDIENT_COLUMNS);
        let ingredient = sqlx::query_as::<_, Ingredient>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ingredient)
    }

    /// Quantity on hand. Unknown ids are `NotFound`.
    pub async fn get_quantity(&self, id: &str) -> DbResult<Quantity> {
        let mut conn = self.pool.acquire().await?;
        fetch_quantity(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Ingredient", id))
    }

    /// All ingredients sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Ingredient>> {
        let sql = format!("SELECT {} FROM ingredients ORDER BY name", INGREDIENT_COLUMNS);
        let ingredients = sqlx::query_as::<_, Ingredient>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(ingredients)
    }

    /// Ingredients at or below their low-stock threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Ingredient>> {
        let sql = format!(
            "SELECT {} FROM ingredients WHERE quantity_milli <= low_stock_threshold_milli ORDER BY name",
            INGREDIENT_COLUMNS
        );
        let ingredients = sqlx::query_as::<_, Ingredient>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = ingredients.len(), "Low-stock ingredients");
        Ok(ingredients)
    }

    /// Reads the current levels of the given ingredients in one query.
    ///
    /// Ids missing from the ledger are simply absent (they read as zero).
    pub async fn snapshot(&self, ids: &[String]) -> DbResult<StockSnapshot> {
        if ids.is_empty() {
            return Ok(StockSnapshot::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM ingredients WHERE id IN (",
            INGREDIENT_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<Ingredient>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Adds an ingredient with an opening stock level.
    ///
    /// A positive opening level is logged as a receiving movement.
    pub async fn insert(
        &self,
        name: &str,
        unit: &str,
        opening: Quantity,
        low_stock_threshold: Quantity,
    ) -> CoreResult<Ingredient> {
        validate_name("name", name)?;
        validate_name("unit", unit)?;
        validate_stock_level("opening stock", opening)?;
        validate_stock_level("low_stock_threshold", low_stock_threshold)?;

        let now = Utc::now();
        let ingredient = Ingredient {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            unit: unit.trim().to_string(),
            quantity_milli: opening.milli(),
            low_stock_threshold_milli: low_stock_threshold.milli(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %ingredient.id, name = %ingredient.name, "Inserting ingredient");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sqlx::query(
            r#"
            INSERT INTO ingredients (
                id, name, unit, quantity_milli, low_stock_threshold_milli, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(&ingredient.unit)
        .bind(ingredient.quantity_milli)
        .bind(ingredient.low_stock_threshold_milli)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if opening.is_positive() {
            record_movement(
                &mut tx,
                &ingredient.id,
                MovementKind::Receiving,
                opening,
                None,
                Some("opening stock"),
                now,
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(ingredient)
    }

    /// Changes the low-stock threshold.
    pub async fn set_low_stock_threshold(&self, id: &str, threshold: Quantity) -> CoreResult<()> {
        validate_stock_level("low_stock_threshold", threshold)?;

        let result = sqlx::query(
            "UPDATE ingredients SET low_stock_threshold_milli = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(threshold.milli())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::IngredientNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Credits a delivery. Returns the new quantity on hand.
    ///
    /// The quantity on hand never passes [`MAX_STOCK_MILLI`].
    pub async fn receive(&self, id: &str, amount: Quantity, note: &str) -> CoreResult<Quantity> {
        validate_stock_delta(amount)?;
        let note = validate_reason("note", note)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if !credit_within(&mut tx, id, amount, Quantity::from_milli(MAX_STOCK_MILLI)).await? {
            let on_hand = fetch_quantity(&mut tx, id)
                .await?
                .ok_or_else(|| CoreError::IngredientNotFound(id.to_string()))?;
            warn!(ingredient_id = %id, received = %amount, on_hand = %on_hand, "Delivery exceeds stock ceiling");
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_STOCK_MILLI - on_hand.milli(),
            }
            .into());
        }
        record_movement(&mut tx, id, MovementKind::Receiving, amount, None, Some(note.as_str()), Utc::now()).await?;
        let on_hand = fetch_quantity(&mut tx, id).await?.unwrap_or(Quantity::ZERO);

        tx.commit().await.map_err(DbError::from)?;

        info!(ingredient_id = %id, received = %amount, on_hand = %on_hand, "Stock received");
        Ok(on_hand)
    }

    /// Debits spoilage, spills or staff use. Never takes stock below zero.
    ///
    /// Returns the new quantity on hand.
    pub async fn pull_out(&self, id: &str, amount: Quantity, reason: &str) -> CoreResult<Quantity> {
        validate_stock_delta(amount)?;
        let reason = validate_reason("reason", reason)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if !debit(&mut tx, id, amount).await? {
            let on_hand = fetch_quantity(&mut tx, id)
                .await?
                .ok_or_else(|| CoreError::IngredientNotFound(id.to_string()))?;
            let name: String = sqlx::query_scalar("SELECT name FROM ingredients WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::from)?;

            warn!(ingredient_id = %id, requested = %amount, on_hand = %on_hand, "Pullout exceeds stock");
            return Err(CoreError::InsufficientStock {
                item_id: id.to_string(),
                shortfalls: vec![Shortfall {
                    ingredient_id: id.to_string(),
                    ingredient_name: name,
                    required: amount,
                    on_hand,
                    missing: amount - on_hand,
                }],
            });
        }
        record_movement(&mut tx, id, MovementKind::Pullout, -amount, None, Some(reason.as_str()), Utc::now()).await?;
        let on_hand = fetch_quantity(&mut tx, id).await?.unwrap_or(Quantity::ZERO);

        tx.commit().await.map_err(DbError::from)?;

        info!(ingredient_id = %id, pulled = %amount, on_hand = %on_hand, "Stock pulled out");
        Ok(on_hand)
    }

    /// Most recent movements of one ingredient, newest first.
    pub async fn movements(&self, ingredient_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {} FROM stock_movements WHERE ingredient_id = ?1 ORDER BY id DESC LIMIT ?2",
            MOVEMENT_COLUMNS
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(ingredient_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Every movement caused by a sale (its checkout debits and void credits).
    pub async fn movements_for_sale(&self, sale_id: i64) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {} FROM stock_movements WHERE sale_id = ?1 ORDER BY id",
            MOVEMENT_COLUMNS
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
