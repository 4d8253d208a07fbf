//! SQLite-backed rate store.
//!
//! RULE: only this file talks to the database.

use crate::rates::history::RateHistoryEntry;
use crate::rates::snapshot::RateSnapshot;
use crate::store::{RateStore, StoreError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

/// How long a writer waits for another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const HISTORY_COLUMNS: &str =
    "id, changed_at, changed_by_id, changed_by_name, rates_snapshot";

/// Rate store persisted in a single SQLite database.
///
/// One connection is shared behind a mutex, so writes from this process
/// are serialized. Writes also run in `IMMEDIATE` transactions, which
/// serializes them against other processes using the same file.
pub struct SqliteRateStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteRateStore {
    /// Open (or create) the rate database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrate(&conn)?;
        debug!("opened rate store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file, `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(include_str!("../../migrations/001_rates.sql"))?;
    Ok(())
}

fn stored_rate_count(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM bopp_rates", [], |row| row.get(0))?)
}

/// Insert the default table if no rate exists yet. Returns whether it did.
fn seed_if_empty(conn: &Connection) -> Result<bool, StoreError> {
    if stored_rate_count(conn)? > 0 {
        return Ok(false);
    }
    let defaults = RateSnapshot::defaults();
    for (key, value) in defaults.iter() {
        conn.execute(
            "INSERT OR IGNORE INTO bopp_rates (key, value) VALUES (?1, ?2)",
            params![key.as_str(), value.to_string()],
        )?;
    }
    info!("seeded {} default rates", defaults.len());
    Ok(true)
}

fn load_rates(conn: &Connection) -> Result<RateSnapshot, StoreError> {
    let mut stmt = conn.prepare("SELECT key, value FROM bopp_rates ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut snapshot = RateSnapshot::new();
    for (key, raw) in rows {
        let value = Decimal::from_str(&raw).map_err(|e| StoreError::Corrupt {
            record: key.clone(),
            reason: e.to_string(),
        })?;
        snapshot.set(key, value);
    }
    Ok(snapshot)
}

fn upsert_rates(conn: &Connection, rates: &RateSnapshot) -> Result<(), StoreError> {
    for (key, value) in rates.iter() {
        conn.execute(
            "INSERT INTO bopp_rates (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key.as_str(), value.to_string()],
        )?;
    }
    Ok(())
}

fn insert_history(conn: &Connection, entry: &RateHistoryEntry) -> Result<(), StoreError> {
    let snapshot = serde_json::to_string(&entry.rates_snapshot).map_err(|e| {
        StoreError::Corrupt {
            record: entry.id.to_string(),
            reason: e.to_string(),
        }
    })?;
    conn.execute(
        "INSERT INTO bopp_rate_history
             (id, changed_at, changed_by_id, changed_by_name, rates_snapshot)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.id.to_string(),
            entry.changed_at.to_rfc3339(),
            entry.changed_by_id,
            entry.changed_by_name,
            snapshot,
        ],
    )?;
    Ok(())
}

/// History row as stored, before parsing.
struct HistoryRow {
    id: String,
    changed_at: String,
    changed_by_id: String,
    changed_by_name: String,
    rates_snapshot: String,
}

impl HistoryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            changed_at: row.get(1)?,
            changed_by_id: row.get(2)?,
            changed_by_name: row.get(3)?,
            rates_snapshot: row.get(4)?,
        })
    }

    fn into_entry(self) -> Result<RateHistoryEntry, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            record: self.id.clone(),
            reason,
        };
        let id = Uuid::parse_str(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let changed_at = DateTime::parse_from_rfc3339(&self.changed_at)
            .map_err(|e| corrupt(e.to_string()))?
            .with_timezone(&Utc);
        let rates_snapshot: RateSnapshot =
            serde_json::from_str(&self.rates_snapshot).map_err(|e| corrupt(e.to_string()))?;

        Ok(RateHistoryEntry {
            id,
            changed_at,
            changed_by_id: self.changed_by_id,
            changed_by_name: self.changed_by_name,
            rates_snapshot,
        })
    }
}

impl RateStore for SqliteRateStore {
    fn current_rates(&self) -> Result<RateSnapshot, StoreError> {
        let mut conn = self.lock()?;

        if stored_rate_count(&conn)? == 0 {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            seed_if_empty(&tx)?;
            tx.commit()?;
        }

        let mut rates = load_rates(&conn)?;
        let padded = rates.pad_with_defaults();
        if !padded.is_empty() {
            debug!("padded {} missing default rates for read", padded.len());
        }
        Ok(rates)
    }

    fn update_rates(
        &self,
        new_rates: &RateSnapshot,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<(), StoreError> {
        if let Some(rate) = new_rates.negative_rates().into_iter().next() {
            warn!("rejected negative rate {} = {} from {}", rate.key, rate.value, actor_id);
            return Err(StoreError::NegativeRate {
                key: rate.key,
                value: rate.value,
            });
        }
        let revision = new_rates.rounded();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        seed_if_empty(&tx)?;
        let before = load_rates(&tx)?;
        let entry = RateHistoryEntry::archive(before, actor_id, actor_name);
        insert_history(&tx, &entry)?;
        upsert_rates(&tx, &revision)?;
        tx.commit()?;

        info!(
            "{} ({}) updated {} rates; archived snapshot {}",
            actor_name,
            actor_id,
            revision.len(),
            entry.id
        );
        Ok(())
    }

    fn history(&self, limit: usize) -> Result<Vec<RateHistoryEntry>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bopp_rate_history ORDER BY seq DESC LIMIT ?1",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![limit], HistoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(HistoryRow::into_entry).collect()
    }

    fn history_entry(&self, id: Uuid) -> Result<RateHistoryEntry, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM bopp_rate_history WHERE id = ?1",
                    HISTORY_COLUMNS
                ),
                params![id.to_string()],
                HistoryRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => row.into_entry(),
            None => Err(StoreError::HistoryEntryNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stored_history_count(store: &SqliteRateStore) -> i64 {
        store
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM bopp_rate_history", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_seeds_once() {
        let store = SqliteRateStore::in_memory().unwrap();
        let first = store.current_rates().unwrap();
        let second = store.current_rates().unwrap();

        assert_eq!(first.len(), 19);
        assert_eq!(first, second);
        assert_eq!(stored_rate_count(&store.lock().unwrap()).unwrap(), 19);
    }

    #[test]
    fn test_update_archives_pre_image() {
        let store = SqliteRateStore::in_memory().unwrap();
        let s0 = store.current_rates().unwrap();

        let revision: RateSnapshot = [("profit", dec!(12))].into_iter().collect();
        store.update_rates(&revision, "u1", "Alice").unwrap();

        let history = store.history(5).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rates_snapshot, s0);
        assert_eq!(history[0].changed_by_id, "u1");
        assert_eq!(history[0].changed_by_name, "Alice");

        let current = store.current_rates().unwrap();
        assert_eq!(current, s0.merged_with(&revision));
    }

    #[test]
    fn test_update_on_empty_store_seeds_first() {
        let store = SqliteRateStore::in_memory().unwrap();
        let revision: RateSnapshot = [("packing_cost", dec!(230))].into_iter().collect();
        store.update_rates(&revision, "u1", "Alice").unwrap();

        let history = store.history(1).unwrap();
        assert_eq!(history[0].rates_snapshot, RateSnapshot::defaults());
        assert_eq!(store.current_rates().unwrap().get("packing_cost"), Some(dec!(230)));
    }

    #[test]
    fn test_failed_write_leaves_no_trace() {
        let store = SqliteRateStore::in_memory().unwrap();
        let before = store.current_rates().unwrap();
        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_poison BEFORE INSERT ON bopp_rates
                 WHEN NEW.key = 'poison'
                 BEGIN SELECT RAISE(ABORT, 'poisoned rate'); END;",
            )
            .unwrap();

        let revision: RateSnapshot = [("profit", dec!(50)), ("poison", dec!(1))]
            .into_iter()
            .collect();
        let err = store.update_rates(&revision, "u1", "Alice").unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(stored_history_count(&store), 0);
        assert_eq!(store.current_rates().unwrap(), before);
    }

    #[test]
    fn test_negative_rate_rejected_before_write() {
        let store = SqliteRateStore::in_memory().unwrap();
        let revision: RateSnapshot = [("profit", dec!(-3))].into_iter().collect();

        let err = store.update_rates(&revision, "u1", "Alice").unwrap_err();
        assert!(matches!(err, StoreError::NegativeRate { .. }));
        assert_eq!(stored_history_count(&store), 0);
    }

    #[test]
    fn test_values_stored_to_four_places() {
        let store = SqliteRateStore::in_memory().unwrap();
        let revision: RateSnapshot = [("coating_exp", dec!(61.123449))].into_iter().collect();
        store.update_rates(&revision, "u1", "Alice").unwrap();
        assert_eq!(
            store.current_rates().unwrap().get("coating_exp"),
            Some(dec!(61.1234))
        );
    }

    #[test]
    fn test_missing_default_is_padded_but_not_persisted() {
        let store = SqliteRateStore::in_memory().unwrap();
        store.current_rates().unwrap();
        store
            .lock()
            .unwrap()
            .execute("DELETE FROM bopp_rates WHERE key = 'full_print'", [])
            .unwrap();

        let rates = store.current_rates().unwrap();
        assert_eq!(rates.get("full_print"), Some(dec!(1000)));
        assert_eq!(stored_rate_count(&store.lock().unwrap()).unwrap(), 18);
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let store = SqliteRateStore::in_memory().unwrap();
        let revision: RateSnapshot = [("metallic_finish", dec!(42.5))].into_iter().collect();
        store.update_rates(&revision, "u1", "Alice").unwrap();

        let rates = store.current_rates().unwrap();
        assert_eq!(rates.get("metallic_finish"), Some(dec!(42.5)));
        assert_eq!(rates.len(), 20);
    }

    #[test]
    fn test_history_order_and_limit() {
        let store = SqliteRateStore::in_memory().unwrap();
        for profit in [11, 12, 13] {
            let revision: RateSnapshot = [("profit", Decimal::from(profit))].into_iter().collect();
            store.update_rates(&revision, "u1", "Alice").unwrap();
        }

        let history = store.history(2).unwrap();
        assert_eq!(history.len(), 2);
        // Newest entry holds the state before the last write.
        assert_eq!(history[0].rates_snapshot.get("profit"), Some(dec!(12)));
        assert_eq!(history[1].rates_snapshot.get("profit"), Some(dec!(11)));
        assert!(store.history(0).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRateStore::open(dir.path().join("rates.db")).unwrap();
        let mode: String = store
            .lock()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_load_rates_keeps_stored_keys() {
        let store = SqliteRateStore::in_memory().unwrap();
        store.current_rates().unwrap();
        let loaded = load_rates(&store.lock().unwrap()).unwrap();
        assert_eq!(loaded, RateSnapshot::defaults());
    }

    #[test]
    fn test_empty_history_is_not_an_error() {
        let store = SqliteRateStore::in_memory().unwrap();
        assert!(store.history(5).unwrap().is_empty());
    }

    #[test]
    fn test_history_entry_lookup() {
        let store = SqliteRateStore::in_memory().unwrap();
        let revision: RateSnapshot = [("profit", dec!(12))].into_iter().collect();
        store.update_rates(&revision, "u1", "Alice").unwrap();

        let listed = store.history(1).unwrap().remove(0);
        assert_eq!(store.history_entry(listed.id).unwrap(), listed);

        let missing = Uuid::new_v4();
        assert!(matches!(
            store.history_entry(missing),
            Err(StoreError::HistoryEntryNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn test_corrupt_value_is_reported() {
        let store = SqliteRateStore::in_memory().unwrap();
        store.current_rates().unwrap();
        store
            .lock()
            .unwrap()
            .execute("UPDATE bopp_rates SET value = 'lots' WHERE key = 'profit'", [])
            .unwrap();

        match store.current_rates() {
            Err(StoreError::Corrupt { record, .. }) => assert_eq!(record, "profit"),
            other => panic!("expected corrupt record, got {:?}", other),
        }
    }
}
