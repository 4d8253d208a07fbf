//! Durable, versioned storage of the rate table.
//!
//! A write always archives the current table into the history log before
//! applying the revision, inside one transaction. Callers hold an explicit
//! store handle; nothing here is global.

pub mod sqlite;

use crate::rates::history::RateHistoryEntry;
use crate::rates::key::RateKey;
use crate::rates::snapshot::RateSnapshot;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use sqlite::SqliteRateStore;

/// Errors arising from rate storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rate store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
    #[error("rate store connection poisoned by a panicked writer")]
    Poisoned,
    #[error("corrupt stored record `{record}`: {reason}")]
    Corrupt { record: String, reason: String },
    #[error("rate `{key}` must be non-negative, got {value}")]
    NegativeRate { key: RateKey, value: Decimal },
    #[error("no rate history entry with id {0}")]
    HistoryEntryNotFound(Uuid),
}

/// Versioned key-value store of pricing rates.
pub trait RateStore {
    /// All current rates.
    ///
    /// Seeds the default table on first access to an empty store, and pads
    /// the returned snapshot with defaults for any default key the stored
    /// table lacks. The pad is not persisted.
    fn current_rates(&self) -> Result<RateSnapshot, StoreError>;

    /// Archive the current table into history, then merge `new_rates` over
    /// it key by key. Either both steps happen or neither does.
    fn update_rates(
        &self,
        new_rates: &RateSnapshot,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<(), StoreError>;

    /// Up to `limit` history entries, newest first.
    fn history(&self, limit: usize) -> Result<Vec<RateHistoryEntry>, StoreError>;

    fn history_entry(&self, id: Uuid) -> Result<RateHistoryEntry, StoreError>;
}

impl<S: RateStore + ?Sized> RateStore for Arc<S> {
    fn current_rates(&self) -> Result<RateSnapshot, StoreError> {
        (**self).current_rates()
    }

    fn update_rates(
        &self,
        new_rates: &RateSnapshot,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<(), StoreError> {
        (**self).update_rates(new_rates, actor_id, actor_name)
    }

    fn history(&self, limit: usize) -> Result<Vec<RateHistoryEntry>, StoreError> {
        (**self).history(limit)
    }

    fn history_entry(&self, id: Uuid) -> Result<RateHistoryEntry, StoreError> {
        (**self).history_entry(id)
    }
}
