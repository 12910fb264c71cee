//! # Recipe Catalog
//!
//! Maps a menu item to the ingredients one unit of it consumes.
//!
//! ```text
//!   menu_items ──┐
//!                ├──► recipe_lines (item_id, ingredient_id, milli per unit)
//!  ingredients ──┘
//!
//!   no rows for an item  ⇒  externally sourced, never touches the ledger
//! ```
//!
//! Recipes can change at any time. Sales are unaffected because every sale
//! stores its own consumption snapshot at commit.

use std::collections::HashSet;

use sqlx::SqlitePool;
use tracing::{debug, info};

use cafe_core::validation::validate_recipe_quantity;
use cafe_core::{CoreError, CoreResult, Quantity, RecipeLine, ValidationError};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    /// Recipe lines for one unit of an item. Empty for externally sourced
    /// items (and for unknown ids).
    pub async fn expand_recipe(&self, item_id: &str) -> DbResult<Vec<RecipeLine>> {
        let lines = sqlx::query_as::<_, RecipeLine>(
            r#"
            SELECT item_id, ingredient_id, quantity_milli_per_unit
            FROM recipe_lines
            WHERE item_id = ?1
            ORDER BY ingredient_id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(item_id = %item_id, lines = lines.len(), "Expanded recipe");
        Ok(lines)
    }

    /// Replaces an item's recipe in one transaction.
    ///
    /// An empty `lines` makes the item externally sourced.
    pub async fn set_recipe(&self, item_id: &str, lines: &[(String, Quantity)]) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for (ingredient_id, per_unit) in lines {
            validate_recipe_quantity(*per_unit)?;
            if !seen.insert(ingredient_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "ingredient_id".to_string(),
                    value: ingredient_id.clone(),
                }
                .into());
            }
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sqlx::query("DELETE FROM recipe_lines WHERE item_id = ?1")
            .bind(item_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let item_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items WHERE id = ?1")
            .bind(item_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        if item_exists == 0 {
            return Err(CoreError::ItemNotFound(item_id.to_string()));
        }

        for (ingredient_id, per_unit) in lines {
            let ingredient_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredients WHERE id = ?1")
                .bind(ingredient_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::from)?;
            if ingredient_exists == 0 {
                return Err(CoreError::IngredientNotFound(ingredient_id.clone()));
            }

            sqlx::query(
                r#"
                INSERT INTO recipe_lines (item_id, ingredient_id, quantity_milli_per_unit)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(item_id)
            .bind(ingredient_id)
            .bind(per_unit.milli())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(item_id = %item_id, lines = lines.len(), "Recipe replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use cafe_core::Money;

    #[tokio::test]
    async fn test_set_and_expand_recipe() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let milk = db.ingredients().insert("Milk", "L", Quantity::from_units(5), Quantity::ZERO).await.unwrap();
        let beans = db.ingredients().insert("Beans", "g", Quantity::from_units(500), Quantity::ZERO).await.unwrap();
        let latte = db.menu().insert("LATTE", "Latte", "Coffee", Money::from_cents(450)).await.unwrap();

        db.recipes()
            .set_recipe(
                &latte.id,
                &[
                    (milk.id.clone(), Quantity::from_milli(240)),
                    (beans.id.clone(), Quantity::from_units(18)),
                ],
            )
            .await
            .unwrap();

        let recipe = db.recipes().expand_recipe(&latte.id).await.unwrap();
        assert_eq!(recipe.len(), 2);
        let milk_line = recipe.iter().find(|l| l.ingredient_id == milk.id).unwrap();
        assert_eq!(milk_line.quantity_per_unit(), Quantity::from_milli(240));

        // Replacing drops the old lines.
        db.recipes()
            .set_recipe(&latte.id, &[(milk.id.clone(), Quantity::from_milli(300))])
            .await
            .unwrap();
        let recipe = db.recipes().expand_recipe(&latte.id).await.unwrap();
        assert_eq!(recipe.len(), 1);
        assert_eq!(recipe[0].quantity_milli_per_unit, 300);
    }

    #[tokio::test]
    async fn test_externally_sourced_has_no_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let water = db.menu().insert("WATER", "Water", "Drinks", Money::from_cents(150)).await.unwrap();

        assert!(db.recipes().expand_recipe(&water.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_recipe_keeps_old_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let milk = db.ingredients().insert("Milk", "L", Quantity::from_units(5), Quantity::ZERO).await.unwrap();
        let latte = db.menu().insert("LATTE", "Latte", "Coffee", Money::from_cents(450)).await.unwrap();
        db.recipes()
            .set_recipe(&latte.id, &[(milk.id.clone(), Quantity::from_units(1))])
            .await
            .unwrap();

        let err = db
            .recipes()
            .set_recipe(
                &latte.id,
                &[
                    (milk.id.clone(), Quantity::from_units(1)),
                    ("ghost".to_string(), Quantity::from_units(1)),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::IngredientNotFound(_)));

        let err = db
            .recipes()
            .set_recipe(
                &latte.id,
                &[
                    (milk.id.clone(), Quantity::from_units(1)),
                    (milk.id.clone(), Quantity::from_units(2)),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));

        assert_eq!(db.recipes().expand_recipe(&latte.id).await.unwrap().len(), 1);
    }
}
