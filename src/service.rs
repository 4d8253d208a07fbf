//! The pricing service: the one place that joins the pure engine to a rate
//! store and applies the admin-only rules for writes and history.

use crate::engine::calculator::BoppCalculator;
use crate::engine::inputs::CalculatorInputs;
use crate::engine::result::CalculationResult;
use crate::engine::validation::ValidationError;
use crate::identity::Actor;
use crate::rates::history::{diff_snapshots, history_timeline, HistoryItem, RateDifference};
use crate::rates::snapshot::RateSnapshot;
use crate::store::{RateStore, StoreError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("rate table is empty; nothing to price against")]
    RatesUnavailable,
    #[error("{actor_id} is not allowed to {operation}")]
    Forbidden {
        actor_id: String,
        operation: &'static str,
    },
}

/// A calculation result with the rate snapshot it was priced against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub result: CalculationResult,
    pub rates: RateSnapshot,
}

/// Front door for the presentation layer.
///
/// Holds the store handle explicitly; the engine it calls stays pure.
pub struct PricingService<S: RateStore> {
    store: S,
}

impl<S: RateStore> PricingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Price `inputs` against the current rate table.
    pub fn calculate(&self, inputs: &CalculatorInputs) -> Result<Quote, PricingError> {
        let rates = self.store.current_rates()?;
        if rates.is_empty() {
            return Err(PricingError::RatesUnavailable);
        }
        let result = BoppCalculator::calculate(inputs, &rates)?;
        debug!(
            "priced {} x {} at {:.2} per piece",
            inputs.print_label(),
            inputs.paste_label(),
            result.cost_per_piece
        );
        Ok(Quote { result, rates })
    }

    pub fn current_rates(&self) -> Result<RateSnapshot, PricingError> {
        Ok(self.store.current_rates()?)
    }

    /// Apply `proposed` on behalf of an admin.
    pub fn update_rates(&self, actor: &Actor, proposed: &RateSnapshot) -> Result<(), PricingError> {
        self.require_admin(actor, "update rates")?;
        self.store.update_rates(proposed, &actor.id, &actor.name)?;
        Ok(())
    }

    /// The newest `limit` history entries, each paired with its diff
    /// against the next-older entry.
    pub fn history(&self, actor: &Actor, limit: usize) -> Result<Vec<HistoryItem>, PricingError> {
        self.require_admin(actor, "view rate history")?;
        let entries = self.store.history(limit)?;
        Ok(history_timeline(entries))
    }

    /// What `proposed` would change if applied now. Writes nothing.
    ///
    /// Values are compared at stored precision, so a digit below it is not
    /// reported as a change.
    pub fn preview_changes(&self, proposed: &RateSnapshot) -> Result<Vec<RateDifference>, PricingError> {
        let current = self.store.current_rates()?;
        let after = current.merged_with(&proposed.rounded());
        Ok(diff_snapshots(Some(&current), &after).differences().to_vec())
    }

    fn require_admin(&self, actor: &Actor, operation: &'static str) -> Result<(), PricingError> {
        if actor.is_admin() {
            return Ok(());
        }
        warn!("{} denied: {}", operation, actor);
        Err(PricingError::Forbidden {
            actor_id: actor.id.clone(),
            operation,
        })
    }
}
