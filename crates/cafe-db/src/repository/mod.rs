//! # Repository Module
//!
//! Database repositories for the cafe engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Repository            Tables                     Writes               │
//! │                                                                         │
//! │  IngredientRepository  ingredients,               receive, pull_out,   │
//! │  (Stock Ledger)        stock_movements            insert               │
//! │                                                                         │
//! │  MenuRepository        menu_items                 insert, set_active,  │
//! │                                                   update_price         │
//! │                                                                         │
//! │  RecipeRepository      recipe_lines               set_recipe           │
//! │  (Recipe Catalog)                                                      │
//! │                                                                         │
//! │  SaleRepository        sales, sale_items,         none (reads only)    │
//! │  (Sale Journal)        sale_consumption                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger and journal also expose connection-level functions
//! (`ingredient::debit`, `sale::append`, ...) that take a
//! `&mut SqliteConnection`. The checkout and void pipelines call them inside
//! one transaction so that stock and sales change together or not at all.

pub mod ingredient;
pub mod menu;
pub mod recipe;
pub mod sale;
