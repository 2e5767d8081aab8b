//! Wallet model
//!
//! A wallet ("cartera") is a named money container with a cached running
//! balance. The balance is denormalized: incomes and expenses adjust it as
//! they are created, edited and deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{UserId, WalletId};
use super::money::Money;

/// Shortest accepted wallet name, in characters
pub const MIN_NAME_LEN: usize = 2;

/// A wallet owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier
    pub id: WalletId,

    /// Owner of the wallet
    pub owner_id: UserId,

    /// Display name (e.g., "Main")
    pub name: String,

    /// Running balance
    pub balance: Money,

    /// When the wallet was created
    pub created_at: DateTime<Utc>,

    /// When the wallet was last modified
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet with an initial balance
    pub fn new(owner_id: UserId, name: impl Into<String>, balance: Money) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            owner_id,
            name: name.into(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the wallet
    pub fn validate(&self) -> Result<(), WalletValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(WalletValidationError::EmptyName);
        }

        if name.chars().count() < MIN_NAME_LEN {
            return Err(WalletValidationError::NameTooShort);
        }

        if name.len() > 100 {
            return Err(WalletValidationError::NameTooLong(name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.balance)
    }
}

/// Validation errors for wallets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletValidationError {
    EmptyName,
    NameTooShort,
    NameTooLong(usize),
    NegativeBalance,
}

impl fmt::Display for WalletValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Wallet name cannot be empty"),
            Self::NameTooShort => write!(f, "Wallet name must be at least 2 characters"),
            Self::NameTooLong(len) => {
                write!(f, "Wallet name too long ({} chars, max 100)", len)
            }
            Self::NegativeBalance => write!(f, "Initial balance cannot be negative"),
        }
    }
}

impl std::error::Error for WalletValidationError {}
