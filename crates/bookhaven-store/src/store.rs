//! # Record Store
//!
//! In-memory typed tables with a uniform query surface, persisted as one
//! JSON snapshot after every mutation.
//!
//! ## Query Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RecordStore Operations                            │
//! │                                                                         │
//! │  select::<R>(criteria)        ──► matching records (no ordering)       │
//! │  insert::<R>(record)          ──► stored record (id + timestamps set)  │
//! │  update::<R>(patch, criteria) ──► updated records (empty on no match)  │
//! │  delete(table, criteria)      ──► () (select first to see removals)    │
//! │                                                                         │
//! │  Every mutation re-serializes the whole table set to the backend.      │
//! │  A failed save is logged and the in-memory mutation stands.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Generation
//! Inserted records carrying an empty `id` receive `{prefix}-{seq}` where
//! the per-table sequence starts at 1000 and reseeds past the highest
//! existing suffix when a snapshot is loaded, so identities keep moving
//! forward across restarts.
//!
//! ## Concurrency
//! One `Mutex` guards the table set. There is a single logical writer; the
//! lock just makes each operation run to completion atomically, which is
//! what gives read-your-own-writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::criteria::Criteria;
use crate::error::{StoreError, StoreResult};
use crate::snapshot::{SnapshotBackend, STORE_KEY};
use crate::table::{Record, Table};

/// Lowest generated identity suffix.
const SEQ_FLOOR: i64 = 1000;

/// One stored row: a flat JSON object of record attributes.
pub type Row = Map<String, Value>;

// =============================================================================
// Table Set
// =============================================================================

#[derive(Debug)]
struct TableSet {
    rows: HashMap<Table, Vec<Row>>,
    next_seq: HashMap<Table, i64>,
}

impl TableSet {
    fn empty() -> Self {
        let mut rows = HashMap::new();
        let mut next_seq = HashMap::new();
        for table in Table::ALL {
            rows.insert(table, Vec::new());
            next_seq.insert(table, SEQ_FLOOR);
        }
        TableSet { rows, next_seq }
    }

    /// Decodes a snapshot payload. Unknown keys are ignored; a known
    /// table key must hold an array of objects.
    fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(payload)?;
        let mut set = TableSet::empty();

        if let Value::Object(tables) = value {
            for table in Table::ALL {
                if let Some(Value::Array(entries)) = tables.get(table.name()) {
                    let rows: Vec<Row> = entries
                        .iter()
                        .filter_map(|entry| entry.as_object().cloned())
                        .collect();
                    set.rows.insert(table, rows);
                }
            }
        }

        set.reseed_sequences();
        Ok(set)
    }

    /// Encodes the full table set as the snapshot payload, tables in
    /// their fixed order.
    fn encode(&self) -> String {
        let mut snapshot = Map::new();
        for table in Table::ALL {
            let entries: Vec<Value> = self.rows[&table]
                .iter()
                .map(|row| Value::Object(row.clone()))
                .collect();
            snapshot.insert(table.name().to_string(), Value::Array(entries));
        }
        Value::Object(snapshot).to_string()
    }

    /// Moves each table's sequence past the highest generated suffix
    /// already present, so reloaded stores keep producing fresh ids.
    fn reseed_sequences(&mut self) {
        for table in Table::ALL {
            let prefix = format!("{}-", table.id_prefix());
            let highest = self.rows[&table]
                .iter()
                .filter_map(|row| row.get("id").and_then(Value::as_str))
                .filter_map(|id| id.strip_prefix(&prefix))
                .filter_map(|suffix| suffix.parse::<i64>().ok())
                .max();
            let next = highest.map(|h| h + 1).unwrap_or(SEQ_FLOOR).max(SEQ_FLOOR);
            self.next_seq.insert(table, next);
        }
    }

    fn take_next_id(&mut self, table: Table) -> String {
        let seq = self.next_seq.get_mut(&table).expect("table seeded");
        let id = format!("{}-{}", table.id_prefix(), *seq);
        *seq += 1;
        id
    }

    /// Keeps the sequence ahead of an explicitly supplied identity.
    fn observe_id(&mut self, table: Table, id: &str) {
        let prefix = format!("{}-", table.id_prefix());
        if let Some(suffix) = id.strip_prefix(&prefix).and_then(|s| s.parse::<i64>().ok()) {
            let seq = self.next_seq.get_mut(&table).expect("table seeded");
            if suffix >= *seq {
                *seq = suffix + 1;
            }
        }
    }
}

// =============================================================================
// Record Store
// =============================================================================

/// The record store: every table, one snapshot, one lock.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use bookhaven_store::{Criteria, MemoryBackend, RecordStore};
///
/// let store = RecordStore::open(Arc::new(MemoryBackend::new()));
/// assert!(store
///     .select::<bookhaven_core::Book>(&Criteria::All)
///     .unwrap()
///     .is_empty());
/// ```
#[derive(Debug)]
pub struct RecordStore {
    backend: Arc<dyn SnapshotBackend>,
    key: String,
    tables: Mutex<TableSet>,
}

impl RecordStore {
    /// Opens the store against a backend, loading the snapshot stored
    /// under the default key ([`STORE_KEY`]).
    ///
    /// A missing snapshot starts empty; a corrupt one is logged and also
    /// starts empty (the storefront must come up regardless).
    pub fn open(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self::open_with_key(backend, STORE_KEY)
    }

    /// Opens the store under an explicit snapshot key.
    pub fn open_with_key(backend: Arc<dyn SnapshotBackend>, key: impl Into<String>) -> Self {
        let key = key.into();
        let tables = match backend.load(&key) {
            Ok(Some(payload)) => match TableSet::decode(&payload) {
                Ok(set) => set,
                Err(e) => {
                    warn!(key = %key, error = %e, "corrupt snapshot, starting empty");
                    TableSet::empty()
                }
            },
            Ok(None) => TableSet::empty(),
            Err(e) => {
                warn!(key = %key, error = %e, "snapshot unreadable, starting empty");
                TableSet::empty()
            }
        };

        RecordStore {
            backend,
            key,
            tables: Mutex::new(tables),
        }
    }

    /// Returns all records of `R`'s table matching `criteria`.
    ///
    /// No ordering is guaranteed; callers sort when they care.
    pub fn select<R: Record>(&self, criteria: &Criteria) -> StoreResult<Vec<R>> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        tables.rows[&R::TABLE]
            .iter()
            .filter(|row| criteria.matches(row))
            .map(|row| decode_row::<R>(row))
            .collect()
    }

    /// Returns matching raw rows, for callers that join or project
    /// without a typed record.
    pub fn select_rows(&self, table: Table, criteria: &Criteria) -> Vec<Row> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        tables.rows[&table]
            .iter()
            .filter(|row| criteria.matches(row))
            .cloned()
            .collect()
    }

    /// Number of records currently in `table`.
    pub fn count(&self, table: Table) -> usize {
        let tables = self.tables.lock().expect("store mutex poisoned");
        tables.rows[&table].len()
    }

    /// Inserts a record, assigning identity and creation timestamp where
    /// absent, and returns the stored record.
    ///
    /// An empty `id` means "assign one"; an explicit id is kept and the
    /// table's sequence skips past it.
    pub fn insert<R: Record>(&self, record: R) -> StoreResult<R> {
        let table = R::TABLE;
        let mut row = encode_row(&record, table)?;

        let mut tables = self.tables.lock().expect("store mutex poisoned");

        let explicit = row
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        match explicit {
            Some(id) => tables.observe_id(table, &id),
            None => {
                let id = tables.take_next_id(table);
                row.insert("id".to_string(), Value::String(id));
            }
        }

        let now = Value::String(Utc::now().to_rfc3339());
        if let Some(field) = table.created_field() {
            if field_is_unset(&row, field) {
                row.insert(field.to_string(), now.clone());
            }
        }
        if table.tracks_updated_at() && field_is_unset(&row, "updated_at") {
            row.insert("updated_at".to_string(), now);
        }

        let stored = decode_row::<R>(&row)?;
        debug!(
            table = %table,
            id = row.get("id").and_then(|v| v.as_str()).unwrap_or(""),
            "insert"
        );
        tables.rows.get_mut(&table).expect("table seeded").push(row);

        self.persist(&tables);
        Ok(stored)
    }

    /// Shallow-merges a JSON-object `patch` onto every record matching
    /// `criteria`, refreshing `updated_at` where the table tracks one,
    /// and returns the updated records.
    ///
    /// Zero matches is not an error; the result is simply empty.
    pub fn update<R: Record>(&self, patch: Value, criteria: &Criteria) -> StoreResult<Vec<R>> {
        let table = R::TABLE;
        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::InvalidPatch {
                    table: table.name(),
                })
            }
        };

        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let now = Value::String(Utc::now().to_rfc3339());
        let mut updated = Vec::new();

        for row in tables.rows.get_mut(&table).expect("table seeded") {
            if !criteria.matches(row) {
                continue;
            }
            for (field, value) in &patch {
                row.insert(field.clone(), value.clone());
            }
            if table.tracks_updated_at() {
                row.insert("updated_at".to_string(), now.clone());
            }
            updated.push(decode_row::<R>(row)?);
        }

        if !updated.is_empty() {
            debug!(table = %table, count = updated.len(), "update");
            self.persist(&tables);
        }
        Ok(updated)
    }

    /// Removes every record matching `criteria`.
    ///
    /// Callers needing the removed records select them first.
    pub fn delete(&self, table: Table, criteria: &Criteria) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let rows = tables.rows.get_mut(&table).expect("table seeded");
        let before = rows.len();
        rows.retain(|row| !criteria.matches(row));
        let removed = before - rows.len();

        if removed > 0 {
            debug!(table = %table, count = removed, "delete");
            self.persist(&tables);
        }
    }

    /// Serializes the whole table set to the backend.
    ///
    /// Failure is logged, never raised: the in-memory state has already
    /// advanced and stays authoritative for the rest of the session.
    fn persist(&self, tables: &TableSet) {
        let payload = tables.encode();
        if let Err(e) = self.backend.save(&self.key, &payload) {
            warn!(key = %self.key, error = %e, "snapshot persist failed; continuing in memory");
        }
    }
}

// =============================================================================
// Row Codec Helpers
// =============================================================================

fn encode_row<R: Record>(record: &R, table: Table) -> StoreResult<Row> {
    match serde_json::to_value(record) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(_) => Err(StoreError::InvalidRecord {
            table: table.name(),
        }),
        Err(source) => Err(StoreError::Encode {
            table: table.name(),
            source,
        }),
    }
}

fn decode_row<R: Record>(row: &Row) -> StoreResult<R> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|source| StoreError::Decode {
        table: R::TABLE.name(),
        source,
    })
}

fn field_is_unset(row: &Row, field: &str) -> bool {
    match row.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemoryBackend;
    use bookhaven_core::types::{Category, Role, User};
    use std::collections::HashSet;

    fn memory_store() -> (Arc<MemoryBackend>, RecordStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = RecordStore::open(backend.clone());
        (backend, store)
    }

    fn new_user(email: &str) -> User {
        User {
            id: String::new(),
            name: "Test User".to_string(),
            email: email.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_assigns_prefixed_monotonic_ids() {
        let (_, store) = memory_store();

        let a = store.insert(new_user("a@example.com")).unwrap();
        let b = store.insert(new_user("b@example.com")).unwrap();

        assert_eq!(a.id, "usr-1000");
        assert_eq!(b.id, "usr-1001");
    }

    #[test]
    fn test_insert_keeps_explicit_id_and_skips_sequence() {
        let (_, store) = memory_store();

        let mut user = new_user("seeded@example.com");
        user.id = "usr-2000".to_string();
        let stored = store.insert(user).unwrap();
        assert_eq!(stored.id, "usr-2000");

        let next = store.insert(new_user("next@example.com")).unwrap();
        assert_eq!(next.id, "usr-2001");
    }

    #[test]
    fn test_select_with_criteria() {
        let (_, store) = memory_store();
        store.insert(new_user("a@example.com")).unwrap();
        store.insert(new_user("b@example.com")).unwrap();

        let all: Vec<User> = store.select(&Criteria::All).unwrap();
        assert_eq!(all.len(), 2);

        let matched: Vec<User> = store
            .select(&Criteria::eq("email", "b@example.com"))
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].email, "b@example.com");
    }

    #[test]
    fn test_update_merges_patch_and_returns_updated() {
        let (_, store) = memory_store();
        let user = store.insert(new_user("a@example.com")).unwrap();

        let updated: Vec<User> = store
            .update(
                serde_json::json!({"name": "Renamed"}),
                &Criteria::eq("id", user.id.clone()),
            )
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].name, "Renamed");
        assert_eq!(updated[0].email, "a@example.com");

        // Zero matches is not an error
        let none: Vec<User> = store
            .update(
                serde_json::json!({"name": "X"}),
                &Criteria::eq("id", "usr-9999"),
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_update_rejects_non_object_patch() {
        let (_, store) = memory_store();
        let result: StoreResult<Vec<User>> =
            store.update(serde_json::json!(42), &Criteria::All);
        assert!(matches!(result, Err(StoreError::InvalidPatch { .. })));
    }

    #[test]
    fn test_delete_removes_matches_only() {
        let (_, store) = memory_store();
        store.insert(new_user("keep@example.com")).unwrap();
        store.insert(new_user("drop@example.com")).unwrap();

        store.delete(Table::Users, &Criteria::eq("email", "drop@example.com"));

        let remaining: Vec<User> = store.select(&Criteria::All).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].email, "keep@example.com");
    }

    #[test]
    fn test_snapshot_round_trip_reproduces_tables() {
        let (backend, store) = memory_store();
        store.insert(new_user("a@example.com")).unwrap();
        store.insert(new_user("b@example.com")).unwrap();
        store
            .insert(Category {
                id: String::new(),
                name: "Fiction".to_string(),
            })
            .unwrap();

        // Reopen against the same backend: per-table contents must match
        // as sets (ordering is not part of the contract).
        let reloaded = RecordStore::open(backend);
        let original_emails: HashSet<String> = store
            .select::<User>(&Criteria::All)
            .unwrap()
            .into_iter()
            .map(|u| u.email)
            .collect();
        let reloaded_emails: HashSet<String> = reloaded
            .select::<User>(&Criteria::All)
            .unwrap()
            .into_iter()
            .map(|u| u.email)
            .collect();
        assert_eq!(original_emails, reloaded_emails);
        assert_eq!(reloaded.count(Table::BookCategories), 1);

        // Sequences continue past reloaded rows
        let next = reloaded.insert(new_user("c@example.com")).unwrap();
        assert_eq!(next.id, "usr-1002");
    }

    #[test]
    fn test_persist_failure_keeps_in_memory_state() {
        let backend = Arc::new(MemoryBackend::failing());
        let store = RecordStore::open(backend.clone());

        // The write "fails" at the backend but the operation succeeds
        let user = store.insert(new_user("a@example.com")).unwrap();
        assert_eq!(user.id, "usr-1000");

        // Subsequent reads observe the mutation
        let all: Vec<User> = store.select(&Criteria::All).unwrap();
        assert_eq!(all.len(), 1);

        // Nothing reached the backend
        assert!(backend.load(STORE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.save(STORE_KEY, "not json at all {{{").unwrap();

        let store = RecordStore::open(backend);
        assert_eq!(store.count(Table::Users), 0);
    }

    #[test]
    fn test_category_insert_has_no_timestamp_fields() {
        let (_, store) = memory_store();
        store
            .insert(Category {
                id: String::new(),
                name: "History".to_string(),
            })
            .unwrap();

        let rows = store.select_rows(Table::BookCategories, &Criteria::All);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("created_at"));
        assert!(!rows[0].contains_key("updated_at"));
    }
}
