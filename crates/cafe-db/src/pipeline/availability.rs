//! # Availability
//!
//! Answers "can the store make N of this item right now?" from the recipe
//! and the current ledger levels.
//!
//! ```text
//!  item_id ──► recipe_lines ──► per-ingredient demand ──┐
//!                                                       ├──► Availability
//!  ingredient ids ──► ledger snapshot (one IN query) ───┘
//! ```
//!
//! Verdicts are advisory. Nothing is reserved; checkout checks again.

use sqlx::SqlitePool;
use tracing::debug;

use cafe_core::{
    check_availability, Availability, CoreError, CoreResult, MenuItem, RecipeLine, StockSnapshot, ValidationError,
};

use crate::repository::ingredient::IngredientRepository;
use crate::repository::menu::MenuRepository;
use crate::repository::recipe::RecipeRepository;

#[derive(Debug, Clone)]
pub struct AvailabilityService {
    menu: MenuRepository,
    recipes: RecipeRepository,
    ingredients: IngredientRepository,
}

impl AvailabilityService {
    pub fn new(pool: SqlitePool) -> Self {
        AvailabilityService {
            menu: MenuRepository::new(pool.clone()),
            recipes: RecipeRepository::new(pool.clone()),
            ingredients: IngredientRepository::new(pool),
        }
    }

    /// Verdict for `quantity` units of an item.
    ///
    /// Externally sourced items (no recipe) are always available and report
    /// no upper bound.
    pub async fn check_availability(&self, item_id: &str, quantity: i64) -> CoreResult<Availability> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let item = self.load_item(item_id).await?;
        let (recipe, stock) = self.load_context(&item).await?;
        let verdict = check_availability(&item.id, &recipe, &stock, quantity);

        debug!(
            item_id = %item.id,
            quantity,
            available = verdict.available,
            available_quantity = ?verdict.available_quantity,
            "Availability checked"
        );
        Ok(verdict)
    }

    /// Availability of every active menu item for one unit, for greying out
    /// buttons on the register.
    pub async fn menu_availability(&self) -> CoreResult<Vec<Availability>> {
        let items = self.menu.list_active().await?;
        let mut verdicts = Vec::with_capacity(items.len());
        for item in &items {
            let (recipe, stock) = self.load_context(item).await?;
            verdicts.push(check_availability(&item.id, &recipe, &stock, 1));
        }
        Ok(verdicts)
    }

    pub(crate) async fn load_item(&self, item_id: &str) -> CoreResult<MenuItem> {
        self.menu
            .get_by_id(item_id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    /// Recipe of `item` plus a ledger snapshot of exactly its ingredients.
    pub(crate) async fn load_context(&self, item: &MenuItem) -> CoreResult<(Vec<RecipeLine>, StockSnapshot)> {
        let recipe = self.recipes.expand_recipe(&item.id).await?;
        if recipe.is_empty() {
            return Ok((recipe, StockSnapshot::new()));
        }

        let ids: Vec<String> = recipe.iter().map(|line| line.ingredient_id.clone()).collect();
        let stock = self.ingredients.snapshot(&ids).await?;
        Ok((recipe, stock))
    }
}
