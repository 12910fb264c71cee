//! # Menu Repository
//!
//! Sellable items: what the register shows and what a draft line prices.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use cafe_core::validation::{validate_name, validate_price_cents, validate_sku};
use cafe_core::{CoreError, CoreResult, MenuItem, Money};

use crate::error::{DbError, DbResult};

const MENU_COLUMNS: &str = r#"
    id, sku, name, category, price_cents, is_active, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let sql = format!("SELECT {} FROM menu_items WHERE id = ?1", MENU_COLUMNS);
        let item = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<MenuItem>> {
        let sql = format!("SELECT {} FROM menu_items WHERE sku = ?1", MENU_COLUMNS);
        let item = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Active items grouped by category, for the register's menu grid.
    pub async fn list_active(&self) -> DbResult<Vec<MenuItem>> {
        let sql = format!(
            "SELECT {} FROM menu_items WHERE is_active = 1 ORDER BY category, name",
            MENU_COLUMNS
        );
        let items = sqlx::query_as::<_, MenuItem>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn insert(&self, sku: &str, name: &str, category: &str, price: Money) -> CoreResult<MenuItem> {
        validate_sku(sku)?;
        validate_name("name", name)?;
        validate_name("category", category)?;
        validate_price_cents(price.cents())?;

        let now = Utc::now();
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            sku: sku.trim().to_string(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            price_cents: price.cents(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, sku = %item.sku, "Inserting menu item");

        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, sku, name, category, price_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(item)
    }

    /// Takes an item off (or back onto) the menu. Past sales are unaffected.
    pub async fn set_active(&self, id: &str, active: bool) -> CoreResult<()> {
        let result = sqlx::query("UPDATE menu_items SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(id.to_string()));
        }
        Ok(())
    }

    /// New price for future draft lines. Lines already in a draft keep theirs.
    pub async fn update_price(&self, id: &str, price: Money) -> CoreResult<()> {
        validate_price_cents(price.cents())?;

        let result = sqlx::query("UPDATE menu_items SET price_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price.cents())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();

        let latte = menu.insert("LATTE-12", "Latte 12oz", "Coffee", Money::from_cents(450)).await.unwrap();
        menu.insert("WATER", "Bottled Water", "Drinks", Money::from_cents(150)).await.unwrap();

        let found = menu.get_by_sku("LATTE-12").await.unwrap().unwrap();
        assert_eq!(found.id, latte.id);
        assert_eq!(found.price(), Money::from_cents(450));

        let names: Vec<_> = menu.list_active().await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Latte 12oz", "Bottled Water"]);
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_menu() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();
        let seasonal = menu.insert("PUMPKIN", "Pumpkin Latte", "Coffee", Money::from_cents(550)).await.unwrap();

        menu.set_active(&seasonal.id, false).await.unwrap();

        assert!(menu.list_active().await.unwrap().is_empty());
        assert!(!menu.get_by_id(&seasonal.id).await.unwrap().unwrap().is_active);
        assert!(matches!(
            menu.set_active("ghost", false).await,
            Err(CoreError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();
        menu.insert("LATTE-12", "Latte", "Coffee", Money::from_cents(450)).await.unwrap();

        let err = menu.insert("LATTE-12", "Latte again", "Coffee", Money::from_cents(450)).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
