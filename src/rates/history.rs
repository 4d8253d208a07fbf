//! Rate history entries and snapshot diffing.
//!
//! Each history entry carries a full copy of the rate table as it stood
//! immediately before a write. Comparing an entry with the next-older one
//! therefore shows exactly the delta introduced by the write that produced
//! the newer entry.

use crate::rates::key::RateKey;
use crate::rates::snapshot::{Rate, RateSnapshot};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An archived snapshot plus who archived it and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistoryEntry {
    pub id: Uuid,
    pub changed_at: DateTime<Utc>,
    pub changed_by_id: String,
    pub changed_by_name: String,
    pub rates_snapshot: RateSnapshot,
}

impl RateHistoryEntry {
    /// Archive `snapshot` on behalf of an actor, stamped now.
    pub fn archive(
        snapshot: RateSnapshot,
        changed_by_id: impl Into<String>,
        changed_by_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            changed_at: Utc::now(),
            changed_by_id: changed_by_id.into(),
            changed_by_name: changed_by_name.into(),
            rates_snapshot: snapshot,
        }
    }
}

/// Direction of a single rate change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Increased,
    Decreased,
    Added,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ChangeKind::Increased => "increased",
            ChangeKind::Decreased => "decreased",
            ChangeKind::Added => "added",
        };
        f.write_str(tag)
    }
}

/// One key whose value differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateDifference {
    pub key: RateKey,
    /// `None` when the key did not exist in the older snapshot.
    pub old_value: Option<Decimal>,
    pub new_value: Decimal,
    pub change: ChangeKind,
}

/// Outcome of comparing a snapshot with its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rates", rename_all = "snake_case")]
pub enum SnapshotDiff {
    /// No predecessor: the snapshot is listed as-is.
    Absolute(Vec<Rate>),
    /// A predecessor exists and every value matches.
    Unchanged,
    /// Keys that were added or changed value, sorted by key.
    Changed(Vec<RateDifference>),
}

impl SnapshotDiff {
    /// Differences reported, empty for `Absolute` and `Unchanged`.
    pub fn differences(&self) -> &[RateDifference] {
        match self {
            SnapshotDiff::Changed(diffs) => diffs,
            _ => &[],
        }
    }
}

/// Compare `after` with an optional `before`.
///
/// Only keys present in `after` are considered; a key that disappears is
/// not reported. Decimal comparison is exact.
pub fn diff_snapshots(before: Option<&RateSnapshot>, after: &RateSnapshot) -> SnapshotDiff {
    let Some(before) = before else {
        return SnapshotDiff::Absolute(after.rates());
    };

    let mut differences = Vec::new();
    for (key, new_value) in after.iter() {
        match before.get(key.as_str()) {
            None => differences.push(RateDifference {
                key: key.clone(),
                old_value: None,
                new_value: *new_value,
                change: ChangeKind::Added,
            }),
            Some(old_value) if old_value != *new_value => differences.push(RateDifference {
                key: key.clone(),
                old_value: Some(old_value),
                new_value: *new_value,
                change: if *new_value > old_value {
                    ChangeKind::Increased
                } else {
                    ChangeKind::Decreased
                },
            }),
            Some(_) => {}
        }
    }

    if differences.is_empty() {
        SnapshotDiff::Unchanged
    } else {
        SnapshotDiff::Changed(differences)
    }
}

/// A history entry together with its diff against the next-older entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub entry: RateHistoryEntry,
    pub diff: SnapshotDiff,
}

/// Pair each entry of a newest-first history list with the one after it.
///
/// The last (oldest) entry has no predecessor in the list and is rendered
/// as an absolute listing.
pub fn history_timeline(entries: Vec<RateHistoryEntry>) -> Vec<HistoryItem> {
    let diffs: Vec<SnapshotDiff> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let older = entries.get(i + 1).map(|e| &e.rates_snapshot);
            diff_snapshots(older, &entry.rates_snapshot)
        })
        .collect();

    entries
        .into_iter()
        .zip(diffs)
        .map(|(entry, diff)| HistoryItem { entry, diff })
        .collect()
}

impl fmt::Display for SnapshotDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotDiff::Absolute(rates) => {
                writeln!(f, "{:<28} {:>14}", "Rate Key", "Value")?;
                for rate in rates {
                    writeln!(
                        f,
                        "{:<28} {:>14.4}",
                        rate.key.display_name(),
                        rate.value
                    )?;
                }
                Ok(())
            }
            SnapshotDiff::Unchanged => {
                writeln!(f, "No changes in this snapshot compared to the previous one.")
            }
            SnapshotDiff::Changed(diffs) => {
                writeln!(
                    f,
                    "{:<28} {:>14} {:>14}  {}",
                    "Rate Key", "Old Value", "New Value", "Change"
                )?;
                for diff in diffs {
                    let old = diff
                        .old_value
                        .map(|v| format!("{:.4}", v))
                        .unwrap_or_else(|| "N/A".to_string());
                    writeln!(
                        f,
                        "{:<28} {:>14} {:>14.4}  {}",
                        diff.key.display_name(),
                        old,
                        diff.new_value,
                        diff.change
                    )?;
                }
                Ok(())
            }
        }
    }
}
