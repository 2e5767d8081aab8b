//! Backend wrappers that inject failures and delays in tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::{Backend, Filter, LocalBackend, Query, Row, Table};
use crate::error::{LaplataError, LaplataResult};
use crate::models::Money;

/// Backend operation, for targeting injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
    Increment,
}

/// Wraps an in-memory backend and fails chosen operations
pub struct FlakyBackend {
    inner: LocalBackend,
    failing: Mutex<HashSet<(Op, Table)>>,
    delays: Mutex<Vec<(Table, Duration)>>,
}

impl FlakyBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: LocalBackend::in_memory(),
            failing: Mutex::new(HashSet::new()),
            delays: Mutex::new(Vec::new()),
        })
    }

    pub fn fail(&self, op: Op, table: Table) {
        self.failing.lock().unwrap().insert((op, table));
    }

    pub fn heal(&self, op: Op, table: Table) {
        self.failing.lock().unwrap().remove(&(op, table));
    }

    /// Delay every select on `table`
    pub fn slow(&self, table: Table, delay: Duration) {
        self.delays.lock().unwrap().push((table, delay));
    }

    fn check(&self, op: Op, table: Table) -> LaplataResult<()> {
        if self.failing.lock().unwrap().contains(&(op, table)) {
            return Err(LaplataError::Backend {
                message: format!("injected {:?} failure on {}", op, table),
                code: Some("TEST".into()),
            });
        }
        Ok(())
    }
}

impl Backend for FlakyBackend {
    fn select(&self, table: Table, query: &Query) -> LaplataResult<Vec<Row>> {
        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.check(Op::Select, table)?;
        self.inner.select(table, query)
    }

    fn insert(&self, table: Table, rows: Vec<Row>) -> LaplataResult<Vec<Row>> {
        self.check(Op::Insert, table)?;
        self.inner.insert(table, rows)
    }

    fn update(&self, table: Table, filters: &[Filter], patch: Row) -> LaplataResult<Vec<Row>> {
        self.check(Op::Update, table)?;
        self.inner.update(table, filters, patch)
    }

    fn delete(&self, table: Table, filters: &[Filter]) -> LaplataResult<Vec<Row>> {
        self.check(Op::Delete, table)?;
        self.inner.delete(table, filters)
    }

    fn increment(
        &self,
        table: Table,
        filters: &[Filter],
        column: &str,
        delta: Money,
    ) -> LaplataResult<Row> {
        self.check(Op::Increment, table)?;
        self.inner.increment(table, filters, column, delta)
    }
}
