//! Category model
//!
//! A category ("categoría") is a label of kind income or expense used to group
//! transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, UserId};

/// Label used for transactions without a category
pub const UNCATEGORIZED: &str = "Sin categoría";

/// Accepted category name length, in characters
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 50;

/// Starter categories seeded for a new user
pub const DEFAULT_CATEGORIES: &[(&str, CategoryKind)] = &[
    ("Salario", CategoryKind::Income),
    ("Freelance", CategoryKind::Income),
    ("Inversiones", CategoryKind::Income),
    ("Otros ingresos", CategoryKind::Income),
    ("Alimentación", CategoryKind::Expense),
    ("Transporte", CategoryKind::Expense),
    ("Vivienda", CategoryKind::Expense),
    ("Entretenimiento", CategoryKind::Expense),
    ("Salud", CategoryKind::Expense),
    ("Educación", CategoryKind::Expense),
    ("Servicios", CategoryKind::Expense),
    ("Otros gastos", CategoryKind::Expense),
];

/// Whether a category labels incomes or expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    /// Value stored in the `kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parse a kind from user input (English or Spanish)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "ingreso" | "ingresos" => Some(Self::Income),
            "expense" | "gasto" | "gastos" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Ingreso"),
            Self::Expense => write!(f, "Gasto"),
        }
    }
}

/// A category owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Owner of the category
    pub owner_id: UserId,

    /// Category name
    pub name: String,

    /// Income or expense
    pub kind: CategoryKind,

    /// When the category was created
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category
    pub fn new(owner_id: UserId, name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: CategoryId::new(),
            owner_id,
            name: name.into(),
            kind,
            created_at: Utc::now(),
        }
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if name.chars().count() < MIN_NAME_LEN {
            return Err(CategoryValidationError::NameTooShort);
        }

        if name.chars().count() > MAX_NAME_LEN {
            return Err(CategoryValidationError::NameTooLong(name.chars().count()));
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooShort,
    NameTooLong(usize),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooShort => write!(f, "Category name must be at least 2 characters"),
            Self::NameTooLong(len) => {
                write!(f, "Category name too long ({} chars, max 50)", len)
            }
        }
    }
}

impl std::error::Error for CategoryValidationError {}
