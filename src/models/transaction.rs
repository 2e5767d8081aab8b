//! Transaction model
//!
//! Incomes ("ingresos") and expenses ("gastos") share one shape: a dated,
//! positive amount posted against a wallet, optionally categorized. The
//! [`TransactionKind`] decides the sign of the wallet adjustment.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::{CategoryKind, UNCATEGORIZED};
use super::ids::{CategoryId, TransactionId, UserId, WalletId};
use super::money::Money;

/// Income or expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// +1 for incomes, -1 for expenses
    pub fn sign(&self) -> i64 {
        match self {
            Self::Income => 1,
            Self::Expense => -1,
        }
    }

    /// Wallet balance change caused by posting `amount`
    pub fn balance_effect(&self, amount: Money) -> Money {
        Money::from_cents(amount.cents() * self.sign())
    }

    /// Kind of category that may label this transaction
    pub fn category_kind(&self) -> CategoryKind {
        match self {
            Self::Income => CategoryKind::Income,
            Self::Expense => CategoryKind::Expense,
        }
    }

    /// Entity name used in errors and audit entries
    pub fn entity_name(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Ingreso"),
            Self::Expense => write!(f, "Gasto"),
        }
    }
}

/// A stored income or expense row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Owner of the transaction
    pub owner_id: UserId,

    /// Wallet the amount is posted against
    pub wallet_id: WalletId,

    /// Optional category
    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// Positive amount
    pub amount: Money,

    /// Optional free-text description
    #[serde(default)]
    pub description: Option<String>,

    /// Transaction date
    pub date: NaiveDate,

    /// When the row was created
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction row
    pub fn new(owner_id: UserId, wallet_id: WalletId, amount: Money, date: NaiveDate) -> Self {
        Self {
            id: TransactionId::new(),
            owner_id,
            wallet_id,
            category_id: None,
            amount,
            description: None,
            date,
            created_at: Utc::now(),
        }
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount);
        }

        if let Some(desc) = &self.description {
            if desc.len() > 500 {
                return Err(TransactionValidationError::DescriptionTooLong(desc.len()));
            }
        }

        Ok(())
    }
}

/// A transaction joined with the display names of its wallet and category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,

    /// Wallet name, if the wallet still exists
    pub wallet_name: Option<String>,

    /// Category name, if a category is set and still exists
    pub category_name: Option<String>,
}

impl TransactionView {
    /// Category name, or the uncategorized label
    pub fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount,
    DescriptionTooLong(usize),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Amount must be greater than zero"),
            Self::DescriptionTooLong(len) => {
                write!(f, "Description too long ({} chars, max 500)", len)
            }
        }
    }
}

impl std::error::Error for TransactionValidationError {}
