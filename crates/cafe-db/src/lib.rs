//! # cafe-db: Storage and Pipelines for the Cafe Engine
//!
//! SQLite storage (through sqlx) for the stock ledger, menu, recipe catalog
//! and sale journal, plus the pipelines that move stock and sales together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cafe Engine Data Flow                            │
//! │                                                                         │
//! │  Register UI (add item, checkout, void)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cafe-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Pipelines   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ Availability  │───►│ Ingredient    │    │              │  │   │
//! │  │   │ DraftOrder    │    │ Menu          │    │ 001_initial  │  │   │
//! │  │   │ Checkout      │    │ Recipe        │    │ _schema.sql  │  │   │
//! │  │   │ Void          │    │ Sale          │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   cafe-core (pure rules: money, quantities, draft orders)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Engine settings (`engine.toml` + environment)
//! - [`engine`] - One handle for the register: config + database
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Ledger, menu, recipe and journal storage
//! - [`pipeline`] - Availability, draft order, checkout and void
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cafe_db::{Engine, EngineConfig};
//! use cafe_core::PaymentRequest;
//!
//! let engine = Engine::open(EngineConfig::load(None)?).await?;
//!
//! let mut order = engine.new_order();
//! engine.add_line(&mut order, &latte_id, 2).await?;
//! let receipt = engine.checkout(&mut order, "cashier-7", PaymentRequest::card()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pipeline;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod fixture;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use pipeline::{AvailabilityService, CheckoutPipeline, DraftOrderService, VoidPipeline};

// Repository re-exports for convenience
pub use repository::ingredient::IngredientRepository;
pub use repository::menu::MenuRepository;
pub use repository::recipe::RecipeRepository;
pub use repository::sale::SaleRepository;
