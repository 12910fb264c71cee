//! # Sale Journal
//!
//! Append-mostly store of committed sales; the source of truth for reporting.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  Draft (in memory, never stored)                                       │
//! │     │                                                                   │
//! │     │ checkout: append()        sales + sale_items + sale_consumption  │
//! │     ▼                                                                   │
//! │  Committed                                                             │
//! │     │                                                                   │
//! │     │ void: apply_void()        voided, void_reason, voided_at only    │
//! │     ▼                                                                   │
//! │  Voided                                                                │
//! │                                                                         │
//! │  Rows are never deleted and, apart from the void fields, never         │
//! │  updated.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes happen inside the checkout and void transactions through the
//! connection-level [`append`] and [`apply_void`]. The repository itself is
//! read-only.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use cafe_core::{
    CategoryTotal, ConsumptionLine, ConsumptionMap, DailyTotal, DraftLine, PaymentMethod, Sale, SaleItem,
    SalesSummary, VoidPatch,
};

use crate::error::DbResult;

// =============================================================================
// Rows
// =============================================================================

/// A sale as handed to the journal by checkout, before it has an id.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub cashier_id: String,
    pub terminal_id: String,
    pub payment_method: PaymentMethod,
    pub cash_tendered_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub lines: Vec<DraftLine>,
    pub consumption: ConsumptionMap,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SaleHeader {
    id: i64,
    cashier_id: String,
    terminal_id: String,
    payment_method: PaymentMethod,
    cash_tendered_cents: Option<i64>,
    change_cents: Option<i64>,
    subtotal_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    created_at: DateTime<Utc>,
    voided: bool,
    void_reason: Option<String>,
    voided_at: Option<DateTime<Utc>>,
}

impl SaleHeader {
    fn into_sale(self, items: Vec<SaleItem>, consumption: Vec<ConsumptionLine>) -> Sale {
        Sale {
            id: self.id,
            cashier_id: self.cashier_id,
            terminal_id: self.terminal_id,
            payment_method: self.payment_method,
            cash_tendered_cents: self.cash_tendered_cents,
            change_cents: self.change_cents,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            created_at: self.created_at,
            voided: self.voided,
            void_reason: self.void_reason,
            voided_at: self.voided_at,
            items,
            consumption,
        }
    }
}

const HEADER_COLUMNS: &str = r#"
    id, cashier_id, terminal_id, payment_method,
    cash_tendered_cents, change_cents,
    subtotal_cents, tax_cents, total_cents,
    created_at, voided, void_reason, voided_at
"#;

// =============================================================================
// Transaction building blocks
// =============================================================================

/// Appends a committed sale with its lines and consumption snapshot.
///
/// The `sales` insert is the first statement, so inside a fresh
/// transaction it takes the write lock before anything else runs.
pub async fn append(conn: &mut SqliteConnection, new_sale: NewSale) -> DbResult<Sale> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales (
            cashier_id, terminal_id, payment_method,
            cash_tendered_cents, change_cents,
            subtotal_cents, tax_cents, total_cents,
            created_at, voided
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)
        "#,
    )
    .bind(&new_sale.cashier_id)
    .bind(&new_sale.terminal_id)
    .bind(new_sale.payment_method)
    .bind(new_sale.cash_tendered_cents)
    .bind(new_sale.change_cents)
    .bind(new_sale.subtotal_cents)
    .bind(new_sale.tax_cents)
    .bind(new_sale.total_cents)
    .bind(new_sale.created_at)
    .execute(&mut *conn)
    .await?;

    let sale_id = result.last_insert_rowid();
    debug!(sale_id, lines = new_sale.lines.len(), "Appending sale");

    let mut items = Vec::with_capacity(new_sale.lines.len());
    for (line_no, line) in new_sale.lines.iter().enumerate() {
        let item = SaleItem {
            item_id: line.item_id.clone(),
            name_snapshot: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            line_subtotal_cents: line.subtotal().cents(),
        };

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, line_no, item_id, name_snapshot, category_snapshot,
                quantity, unit_price_cents, line_subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(sale_id)
        .bind(line_no as i64)
        .bind(&item.item_id)
        .bind(&item.name_snapshot)
        .bind(&line.category)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.line_subtotal_cents)
        .execute(&mut *conn)
        .await?;

        items.push(item);
    }

    let consumption = new_sale.consumption.to_lines();
    for line in &consumption {
        sqlx::query(
            r#"
            INSERT INTO sale_consumption (sale_id, ingredient_id, quantity_milli)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(sale_id)
        .bind(&line.ingredient_id)
        .bind(line.quantity_milli)
        .execute(&mut *conn)
        .await?;
    }

    Ok(Sale {
        id: sale_id,
        cashier_id: new_sale.cashier_id,
        terminal_id: new_sale.terminal_id,
        payment_method: new_sale.payment_method,
        cash_tendered_cents: new_sale.cash_tendered_cents,
        change_cents: new_sale.change_cents,
        subtotal_cents: new_sale.subtotal_cents,
        tax_cents: new_sale.tax_cents,
        total_cents: new_sale.total_cents,
        created_at: new_sale.created_at,
        voided: false,
        void_reason: None,
        voided_at: None,
        items,
        consumption,
    })
}

/// Applies a void patch to a committed sale.
///
/// The only update the journal permits. Returns `false` when the sale does
/// not exist or is already voided; the guard makes a second void a no-op.
pub async fn apply_void(conn: &mut SqliteConnection, sale_id: i64, patch: &VoidPatch) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sales
        SET
            voided = 1,
            void_reason = ?2,
            voided_at = ?3
        WHERE id = ?1 AND voided = 0
        "#,
    )
    .bind(sale_id)
    .bind(&patch.reason)
    .bind(patch.voided_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Loads a sale with its lines and consumption snapshot.
pub async fn fetch_sale(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", HEADER_COLUMNS);
    let header = sqlx::query_as::<_, SaleHeader>(&sql)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT item_id, name_snapshot, quantity, unit_price_cents, line_subtotal_cents
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    let consumption = sqlx::query_as::<_, ConsumptionLine>(
        r#"
        SELECT ingredient_id, quantity_milli
        FROM sale_consumption
        WHERE sale_id = ?1
        ORDER BY ingredient_id
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(header.into_sale(items, consumption)))
}

// =============================================================================
// Repository (reads)
// =============================================================================

/// Read side of the journal. Date ranges are half-open: `[from, to)`.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn get_by_id(&self, sale_id: i64) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, sale_id).await
    }

    /// Sales committed in the range, voided ones included, oldest first.
    pub async fn list_by_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM sales WHERE created_at >= ?1 AND created_at < ?2 ORDER BY id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&mut *conn)
        .await?;

        let mut sales = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(sale) = fetch_sale(&mut conn, id).await? {
                sales.push(sale);
            }
        }

        debug!(count = sales.len(), "Listed sales by date range");
        Ok(sales)
    }

    /// Counts and money totals. Voided sales are counted but excluded from
    /// the amounts.
    pub async fn summarize(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN voided = 0 THEN 1 ELSE 0 END), 0) AS committed_count,
                COALESCE(SUM(CASE WHEN voided = 1 THEN 1 ELSE 0 END), 0) AS voided_count,
                COALESCE(SUM(CASE WHEN voided = 0 THEN subtotal_cents ELSE 0 END), 0) AS gross_cents,
                COALESCE(SUM(CASE WHEN voided = 0 THEN tax_cents ELSE 0 END), 0) AS tax_cents,
                COALESCE(SUM(CASE WHEN voided = 0 THEN total_cents ELSE 0 END), 0) AS net_cents
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Non-voided totals per UTC calendar day.
    pub async fn daily_totals(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<DailyTotal>> {
        let totals = sqlx::query_as::<_, DailyTotal>(
            r#"
            SELECT
                substr(created_at, 1, 10) AS day,
                COUNT(*) AS sale_count,
                SUM(total_cents) AS total_cents
            FROM sales
            WHERE voided = 0 AND created_at >= ?1 AND created_at < ?2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Non-voided units and revenue per menu category, best sellers first.
    pub async fn category_breakdown(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<CategoryTotal>> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT
                si.category_snapshot AS category,
                SUM(si.quantity) AS quantity,
                SUM(si.line_subtotal_cents) AS subtotal_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE s.voided = 0 AND s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY si.category_snapshot
            ORDER BY subtotal_cents DESC, category
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
