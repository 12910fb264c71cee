//! # Pipelines
//!
//! The operations the register calls. Each one composes the repositories
//! with the pure rules in `cafe-core`.
//!
//! ```text
//!  add / set line ──► DraftOrderService ──► AvailabilityService ──► ledger read
//!                                                                  (advisory)
//!
//!  checkout ────────► CheckoutPipeline ─┐
//!                                       ├──► one SQLite transaction
//!  void ────────────► VoidPipeline ─────┘    ledger + journal + movements
//! ```
//!
//! Availability verdicts are advisory: stock can move between a verdict and
//! the commit. The checkout transaction re-checks with conditional debits,
//! so the ledger never goes negative whatever the interleaving.

pub mod availability;
pub mod checkout;
pub mod draft;
pub mod void;

pub use availability::AvailabilityService;
pub use checkout::CheckoutPipeline;
pub use draft::DraftOrderService;
pub use void::VoidPipeline;
