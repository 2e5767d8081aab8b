//! Local JSON-file backend
//!
//! Keeps every table in memory behind one `RwLock` and persists a table to
//! `<dir>/<table>.json` after each mutation that touches it. An in-memory
//! variant (no directory) is used by tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::file_io::{read_json, write_json_atomic};
use super::{Backend, Filter, Query, Row, Table};
use crate::error::{LaplataError, LaplataResult};
use crate::models::Money;

/// Serializable table file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TableData {
    rows: Vec<Row>,
}

/// Backend storing tables as JSON files
pub struct LocalBackend {
    dir: Option<PathBuf>,
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

impl LocalBackend {
    /// A backend that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Open (or create) a backend rooted at `dir`, loading every table
    pub fn open(dir: impl Into<PathBuf>) -> LaplataResult<Self> {
        let dir = dir.into();
        let mut tables = HashMap::new();
        for table in Table::all() {
            let data: TableData = read_json(table_path(&dir, table))?;
            tables.insert(table, data.rows);
        }
        debug!(dir = %dir.display(), "opened local backend");
        Ok(Self {
            dir: Some(dir),
            tables: RwLock::new(tables),
        })
    }

    /// Directory holding the table files, if persistent
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn read(&self) -> LaplataResult<RwLockReadGuard<'_, HashMap<Table, Vec<Row>>>> {
        self.tables
            .read()
            .map_err(|e| LaplataError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> LaplataResult<RwLockWriteGuard<'_, HashMap<Table, Vec<Row>>>> {
        self.tables
            .write()
            .map_err(|e| LaplataError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Apply `change` to a copy of `table` under the write lock. The copy
    /// replaces the live rows only once it is on disk; `change` reports
    /// whether anything needs writing.
    fn stage<T>(
        &self,
        table: Table,
        change: impl FnOnce(&mut Vec<Row>) -> LaplataResult<(T, bool)>,
    ) -> LaplataResult<T> {
        let mut tables = self.write()?;
        let mut staged = tables.get(&table).cloned().unwrap_or_default();
        let (output, changed) = change(&mut staged)?;
        if changed {
            self.persist(table, &staged)?;
            tables.insert(table, staged);
        }
        Ok(output)
    }

    fn persist(&self, table: Table, rows: &[Row]) -> LaplataResult<()> {
        if let Some(dir) = &self.dir {
            let data = TableData {
                rows: rows.to_vec(),
            };
            write_json_atomic(table_path(dir, table), &data)?;
        }
        Ok(())
    }
}

fn table_path(dir: &Path, table: Table) -> PathBuf {
    dir.join(format!("{}.json", table.name()))
}

fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

impl Backend for LocalBackend {
    fn select(&self, table: Table, query: &Query) -> LaplataResult<Vec<Row>> {
        let tables = self.read()?;
        let rows = tables.get(&table).cloned().unwrap_or_default();
        Ok(query.apply(rows))
    }

    fn insert(&self, table: Table, rows: Vec<Row>) -> LaplataResult<Vec<Row>> {
        self.stage(table, |stored| {
            let mut inserted = Vec::with_capacity(rows.len());
            for mut row in rows {
                if !row.contains_key("id") {
                    row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
                }
                let duplicate = stored.iter().any(|existing| existing.get("id") == row.get("id"));
                if duplicate {
                    return Err(LaplataError::Backend {
                        message: format!(
                            "duplicate key value violates unique constraint on {}",
                            table
                        ),
                        code: Some("23505".into()),
                    });
                }
                stored.push(row.clone());
                inserted.push(row);
            }
            let changed = !inserted.is_empty();
            Ok((inserted, changed))
        })
    }

    fn update(&self, table: Table, filters: &[Filter], patch: Row) -> LaplataResult<Vec<Row>> {
        self.stage(table, |stored| {
            let mut updated = Vec::new();
            for row in stored.iter_mut().filter(|row| matches_all(filters, row)) {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(row.clone());
            }
            let changed = !updated.is_empty();
            Ok((updated, changed))
        })
    }

    fn delete(&self, table: Table, filters: &[Filter]) -> LaplataResult<Vec<Row>> {
        self.stage(table, |stored| {
            let (deleted, kept): (Vec<Row>, Vec<Row>) = std::mem::take(stored)
                .into_iter()
                .partition(|row| matches_all(filters, row));
            *stored = kept;
            let changed = !deleted.is_empty();
            Ok((deleted, changed))
        })
    }

    fn increment(
        &self,
        table: Table,
        filters: &[Filter],
        column: &str,
        delta: Money,
    ) -> LaplataResult<Row> {
        self.stage(table, |stored| {
            let mut matching = stored.iter_mut().filter(|row| matches_all(filters, row));
            let row = match (matching.next(), matching.next()) {
                (Some(row), None) => row,
                (None, _) => {
                    return Err(LaplataError::Backend {
                        message: format!("no {} row matched the increment", table),
                        code: Some("P0002".into()),
                    })
                }
                (Some(_), Some(_)) => {
                    return Err(LaplataError::Backend {
                        message: format!("more than one {} row matched the increment", table),
                        code: Some("P0003".into()),
                    })
                }
            };

            let current: Money = match row.get(column) {
                Some(value) => serde_json::from_value(value.clone())?,
                None => Money::zero(),
            };
            let next = current + delta;
            row.insert(column.to_string(), serde_json::to_value(next)?);
            if row.contains_key("updated_at") {
                row.insert("updated_at".into(), serde_json::to_value(Utc::now())?);
            }
            Ok((row.clone(), true))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_insert_and_select() {
        let backend = LocalBackend::in_memory();
        backend
            .insert(
                Table::Wallets,
                vec![
                    row(json!({"id": "a", "owner_id": "u1", "name": "Main"})),
                    row(json!({"id": "b", "owner_id": "u2", "name": "Other"})),
                ],
            )
            .unwrap();

        let rows = backend
            .select(Table::Wallets, &Query::new().eq("owner_id", "u1"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Main");
    }

    #[test]
    fn test_insert_assigns_missing_id() {
        let backend = LocalBackend::in_memory();
        let rows = backend
            .insert(Table::Categories, vec![row(json!({"name": "Salud"}))])
            .unwrap();
        assert!(rows[0]["id"].as_str().is_some());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let backend = LocalBackend::in_memory();
        backend
            .insert(Table::Wallets, vec![row(json!({"id": "a"}))])
            .unwrap();
        let err = backend
            .insert(Table::Wallets, vec![row(json!({"id": "a"}))])
            .unwrap_err();
        assert!(matches!(err, LaplataError::Backend { .. }));
    }

    #[test]
    fn test_update_and_delete() {
        let backend = LocalBackend::in_memory();
        backend
            .insert(Table::Wallets, vec![row(json!({"id": "a", "name": "Old"}))])
            .unwrap();

        let updated = backend
            .update(
                Table::Wallets,
                &[Filter::eq("id", "a")],
                row(json!({"name": "New"})),
            )
            .unwrap();
        assert_eq!(updated[0]["name"], "New");

        let deleted = backend
            .delete(Table::Wallets, &[Filter::eq("id", "a")])
            .unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(backend
            .select(Table::Wallets, &Query::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_increment() {
        let backend = LocalBackend::in_memory();
        backend
            .insert(
                Table::Wallets,
                vec![row(json!({"id": "a", "balance": 100, "updated_at": "2025-01-01T00:00:00Z"}))],
            )
            .unwrap();

        let out = backend
            .increment(
                Table::Wallets,
                &[Filter::eq("id", "a")],
                "balance",
                Money::from_cents(-3050),
            )
            .unwrap();
        assert_eq!(out["balance"], json!(69.5));
        assert_ne!(out["updated_at"], json!("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn test_increment_missing_row_fails() {
        let backend = LocalBackend::in_memory();
        let err = backend
            .increment(
                Table::Wallets,
                &[Filter::eq("id", "nope")],
                "balance",
                Money::from_units(1),
            )
            .unwrap_err();
        assert!(matches!(err, LaplataError::Backend { .. }));
    }

    #[test]
    fn test_persists_across_open() {
        let temp_dir = TempDir::new().unwrap();
        {
            let backend = LocalBackend::open(temp_dir.path()).unwrap();
            backend
                .insert(Table::Expenses, vec![row(json!({"id": "e1", "amount": 30}))])
                .unwrap();
        }
        assert!(temp_dir.path().join("expenses.json").exists());

        let backend = LocalBackend::open(temp_dir.path()).unwrap();
        let rows = backend.select(Table::Expenses, &Query::new()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["amount"], json!(30));
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::open(temp_dir.path()).unwrap();
        backend
            .insert(Table::Wallets, vec![row(json!({"id": "a", "balance": 10}))])
            .unwrap();

        // A directory where the temp file should go makes every write fail
        let blocker = temp_dir.path().join("wallets.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(backend
            .insert(Table::Wallets, vec![row(json!({"id": "b"}))])
            .is_err());
        assert!(backend
            .increment(
                Table::Wallets,
                &[Filter::eq("id", "a")],
                "balance",
                Money::from_units(5),
            )
            .is_err());
        assert!(backend
            .delete(Table::Wallets, &[Filter::eq("id", "a")])
            .is_err());

        let rows = backend.select(Table::Wallets, &Query::new()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["balance"], json!(10));

        std::fs::remove_dir(&blocker).unwrap();
        backend
            .insert(Table::Wallets, vec![row(json!({"id": "b"}))])
            .unwrap();
        let reopened = LocalBackend::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.select(Table::Wallets, &Query::new()).unwrap().len(), 2);
    }
}
