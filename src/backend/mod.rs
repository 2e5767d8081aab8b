//! Backend capability
//!
//! All persistence goes through a [`Backend`]: a table-oriented CRUD surface
//! (`select` with filter/order/limit, `insert`, `update`, `delete`) plus an
//! atomic `increment` used for wallet balances. Rows are JSON objects, which is
//! what the hosted provider speaks; services convert them to typed models with
//! [`to_row`] and [`from_row`].
//!
//! A backend instance is constructed explicitly and shared as
//! `Arc<dyn Backend>`; nothing here is process-global.

pub mod file_io;
pub mod local;
pub mod rest;

#[cfg(test)]
pub(crate) mod testing;

pub use local::LocalBackend;
pub use rest::RestBackend;

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{LaplataError, LaplataResult};
use crate::models::{Money, TransactionKind};

/// A table row
pub type Row = serde_json::Map<String, Value>;

/// Tables consumed by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Wallets,
    Categories,
    Incomes,
    Expenses,
}

impl Table {
    /// Table name on the backend
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wallets => "wallets",
            Self::Categories => "categories",
            Self::Incomes => "incomes",
            Self::Expenses => "expenses",
        }
    }

    pub fn all() -> [Table; 4] {
        [Self::Wallets, Self::Categories, Self::Incomes, Self::Expenses]
    }

    /// Table holding transactions of the given kind
    pub fn for_kind(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => Self::Incomes,
            TransactionKind::Expense => Self::Expenses,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Comparison used by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    /// PostgREST operator prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gte => "gte",
            Self::Lte => "lte",
        }
    }
}

/// A column predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Lte,
            value: value.into(),
        }
    }

    /// Whether `row` satisfies this predicate; a missing column never matches
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        let ord = compare_values(actual, &self.value);
        match self.op {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Gte => ord != Ordering::Less,
            FilterOp::Lte => ord != Ordering::Greater,
        }
    }

    /// Filter value rendered for a query string
    pub fn value_text(&self) -> String {
        value_text(&self.value)
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Select parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an arbitrary filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::gte(column, value))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::lte(column, value))
    }

    /// Append a sort key; earlier keys take precedence
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply this query to in-memory rows
    pub fn apply(&self, rows: impl IntoIterator<Item = Row>) -> Vec<Row> {
        let mut rows: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .collect();

        if !self.order.is_empty() {
            rows.sort_by(|a, b| {
                for key in &self.order {
                    let ord = compare_values(
                        a.get(&key.column).unwrap_or(&Value::Null),
                        b.get(&key.column).unwrap_or(&Value::Null),
                    );
                    let ord = if key.ascending { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

/// The persistence capability
pub trait Backend: Send + Sync {
    /// Rows of `table` matching `query`
    fn select(&self, table: Table, query: &Query) -> LaplataResult<Vec<Row>>;

    /// Insert rows, returning them as stored
    fn insert(&self, table: Table, rows: Vec<Row>) -> LaplataResult<Vec<Row>>;

    /// Merge `patch` into every matching row, returning the updated rows
    fn update(&self, table: Table, filters: &[Filter], patch: Row) -> LaplataResult<Vec<Row>>;

    /// Delete matching rows, returning the deleted rows
    fn delete(&self, table: Table, filters: &[Filter]) -> LaplataResult<Vec<Row>>;

    /// Atomically add `delta` to a numeric `column` of the single matching row
    ///
    /// Fails when zero or several rows match.
    fn increment(
        &self,
        table: Table,
        filters: &[Filter],
        column: &str,
        delta: Money,
    ) -> LaplataResult<Row>;
}

/// Serialize a model into a row
pub fn to_row<T: Serialize>(value: &T) -> LaplataResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(LaplataError::Json(format!(
            "expected an object row, got {}",
            other
        ))),
    }
}

/// Deserialize a row into a model
pub fn from_row<T: DeserializeOwned>(row: Row) -> LaplataResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Deserialize many rows
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> LaplataResult<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

/// Total order over JSON values as the backend compares them
///
/// Numbers compare numerically, RFC 3339 timestamps chronologically, other
/// strings lexically (ISO dates sort correctly that way). Null sorts first.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::<FixedOffset>::parse_from_rfc3339(x),
                DateTime::<FixedOffset>::parse_from_rfc3339(y),
            ) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => value_text(a).cmp(&value_text(b)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
