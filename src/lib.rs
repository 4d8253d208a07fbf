//! # bopp-pricing
//!
//! Pricing engine for BOPP packaging tape, backed by a versioned rate table.
//!
//! Given tape dimensions, a print type, a paste type and the current rate
//! table, the engine computes per-piece, per-width and per-batch prices.
//! Every change to the rate table archives the previous table first, so
//! any two consecutive versions can be compared.
//!
//! ## Architecture
//!
//! - **rates** — Rate keys, print/paste selectors, snapshots, history diffing
//! - **engine** — Input validation, the formula pipeline, result record, rate card
//! - **store** — `RateStore` trait and its SQLite implementation
//! - **service** — Joins engine and store; admin checks for writes and history
//! - **identity** — Actor and role supplied by the session layer

pub mod engine;
pub mod identity;
pub mod rates;
pub mod service;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::engine::{calculate, BoppCalculator, CalculationResult, CalculatorInputs, RateCard};
    pub use crate::identity::{Actor, Role};
    pub use crate::rates::history::{diff_snapshots, RateDifference, SnapshotDiff};
    pub use crate::rates::key::{PasteType, PrintType, RateKey};
    pub use crate::rates::snapshot::RateSnapshot;
    pub use crate::service::{PricingError, PricingService, Quote};
    pub use crate::store::{RateStore, SqliteRateStore, StoreError};
}
