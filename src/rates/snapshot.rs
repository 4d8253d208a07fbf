use crate::rates::key::{RateGroup, RateKey, DEFAULT_RATE_TABLE};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of decimal places a stored rate keeps.
pub const RATE_DECIMAL_PLACES: u32 = 4;

/// A single named rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub key: RateKey,
    pub value: Decimal,
}

impl Rate {
    pub fn new(key: impl Into<RateKey>, value: Decimal) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// The complete rate table at one instant.
///
/// This is both the store's current state and the unit archived in every
/// history entry. Key order carries no meaning; iteration is sorted by key
/// so that listings and serialized snapshots are stable.
///
/// Serialized as a list of `{ "key": ..., "value": ... }` records.
///
/// # Examples
///
/// ```
/// use bopp_pricing::rates::snapshot::RateSnapshot;
/// use rust_decimal_macros::dec;
///
/// let current = RateSnapshot::defaults();
/// let revised: RateSnapshot = [("profit", dec!(12))].into_iter().collect();
///
/// let merged = current.merged_with(&revised);
/// assert_eq!(merged.get("profit"), Some(dec!(12)));
/// assert_eq!(merged.get("packing_cost"), Some(dec!(220)));
/// assert_eq!(merged.len(), 19);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Rate>", into = "Vec<Rate>")]
pub struct RateSnapshot {
    rates: BTreeMap<RateKey, Decimal>,
}

impl RateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed 19-key table used to bootstrap an empty store.
    pub fn defaults() -> Self {
        DEFAULT_RATE_TABLE
            .iter()
            .map(|(key, value)| (RateKey::new(*key), Decimal::from(*value)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.rates.get(&RateKey::new(key)).copied()
    }

    /// Rate value as a float for the formula pipeline.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.to_f64())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rates.contains_key(&RateKey::new(key))
    }

    /// Insert or overwrite a rate.
    pub fn set(&mut self, key: impl Into<RateKey>, value: Decimal) {
        self.rates.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RateKey, &Decimal)> {
        self.rates.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RateKey> {
        self.rates.keys()
    }

    /// All rates as owned records, sorted by key.
    pub fn rates(&self) -> Vec<Rate> {
        self.rates
            .iter()
            .map(|(key, value)| Rate::new(key.clone(), *value))
            .collect()
    }

    /// Apply `revision` over this snapshot key by key.
    ///
    /// Keys present in `revision` overwrite (or are inserted); keys absent
    /// from it are left untouched. Nothing is ever removed.
    pub fn merged_with(&self, revision: &RateSnapshot) -> RateSnapshot {
        let mut merged = self.clone();
        for (key, value) in revision.iter() {
            merged.rates.insert(key.clone(), *value);
        }
        merged
    }

    /// Fill in default values for any default key missing from this snapshot.
    ///
    /// Returns the keys that were padded.
    pub fn pad_with_defaults(&mut self) -> Vec<RateKey> {
        let mut padded = Vec::new();
        for (key, value) in DEFAULT_RATE_TABLE {
            let key = RateKey::new(key);
            if !self.rates.contains_key(&key) {
                self.rates.insert(key.clone(), Decimal::from(value));
                padded.push(key);
            }
        }
        padded
    }

    /// Copy with every value rounded to the stored precision.
    pub fn rounded(&self) -> RateSnapshot {
        self.rates
            .iter()
            .map(|(key, value)| (key.clone(), value.round_dp(RATE_DECIMAL_PLACES)))
            .collect()
    }

    /// Rates whose value is below zero.
    pub fn negative_rates(&self) -> Vec<Rate> {
        self.rates
            .iter()
            .filter(|(_, value)| value.is_sign_negative() && !value.is_zero())
            .map(|(key, value)| Rate::new(key.clone(), *value))
            .collect()
    }

    /// Rates arranged for an editor: the four groups in order, each in its
    /// declared key order, followed by any ungrouped keys under `None`.
    /// Empty sections are omitted.
    pub fn grouped(&self) -> Vec<(Option<RateGroup>, Vec<Rate>)> {
        let mut sections = Vec::new();
        for group in RateGroup::ALL {
            let rates: Vec<Rate> = group
                .keys()
                .into_iter()
                .filter_map(|key| self.get(key).map(|value| Rate::new(key, value)))
                .collect();
            if !rates.is_empty() {
                sections.push((Some(group), rates));
            }
        }

        let ungrouped: Vec<Rate> = self
            .rates
            .iter()
            .filter(|(key, _)| RateGroup::of(key).is_none())
            .map(|(key, value)| Rate::new(key.clone(), *value))
            .collect();
        if !ungrouped.is_empty() {
            sections.push((None, ungrouped));
        }
        sections
    }
}

impl From<Vec<Rate>> for RateSnapshot {
    fn from(rates: Vec<Rate>) -> Self {
        rates.into_iter().collect()
    }
}

impl From<RateSnapshot> for Vec<Rate> {
    fn from(snapshot: RateSnapshot) -> Self {
        snapshot.rates()
    }
}

impl FromIterator<Rate> for RateSnapshot {
    fn from_iter<I: IntoIterator<Item = Rate>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|r| (r.key, r.value)).collect(),
        }
    }
}

impl<K: Into<RateKey>> FromIterator<(K, Decimal)> for RateSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
