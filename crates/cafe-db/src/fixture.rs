//! Shared test setup: a small cafe with one ingredient, one made-to-order
//! item and one externally sourced item.

use chrono::{Duration, Utc};

use cafe_core::{Ingredient, MenuItem, Money, Quantity, SalesSummary};

use crate::pool::{Database, DbConfig};

pub(crate) struct Cafe {
    pub db: Database,
    pub milk: Ingredient,
    /// One unit consumes one unit of milk.
    pub latte: MenuItem,
    /// No recipe.
    pub water: MenuItem,
}

/// Milk 5, Latte = 1 Milk, Bottled Water with no recipe.
pub(crate) async fn cafe() -> Cafe {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    seed(db).await
}

/// Same cafe on a temporary file so several connections can race.
pub(crate) async fn cafe_on_disk(dir: &std::path::Path) -> Cafe {
    let db = Database::new(DbConfig::new(dir.join("cafe.db")).max_connections(4))
        .await
        .unwrap();
    seed(db).await
}

async fn seed(db: Database) -> Cafe {
    let milk = db
        .ingredients()
        .insert("Milk", "L", Quantity::from_units(5), Quantity::from_units(1))
        .await
        .unwrap();
    let latte = db
        .menu()
        .insert("LATTE", "Latte", "Coffee", Money::from_cents(450))
        .await
        .unwrap();
    let water = db
        .menu()
        .insert("WATER", "Bottled Water", "Drinks", Money::from_cents(150))
        .await
        .unwrap();
    db.recipes()
        .set_recipe(&latte.id, &[(milk.id.clone(), Quantity::from_units(1))])
        .await
        .unwrap();

    Cafe { db, milk, latte, water }
}

impl Cafe {
    pub async fn milk_on_hand(&self) -> Quantity {
        self.db.ingredients().get_quantity(&self.milk.id).await.unwrap()
    }

    /// Summary over a window wide enough to hold every sale a test makes.
    pub async fn sales_summary(&self) -> SalesSummary {
        let now = Utc::now();
        self.db
            .sales()
            .summarize(now - Duration::days(1), now + Duration::days(1))
            .await
            .unwrap()
    }
}
