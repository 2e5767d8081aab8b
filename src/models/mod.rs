//! Core data models for LaPlata
//!
//! This module contains the data structures of the finance domain: wallets,
//! categories, incomes/expenses, users and the derived dashboard statistics.

pub mod category;
pub mod ids;
pub mod money;
pub mod period;
pub mod stats;
pub mod transaction;
pub mod user;
pub mod wallet;

pub use category::{Category, CategoryKind, DEFAULT_CATEGORIES, UNCATEGORIZED};
pub use ids::{CategoryId, TransactionId, UserId, WalletId};
pub use money::Money;
pub use period::{days_in_month, MonthPeriod};
pub use stats::{
    Alert, AlertLevel, CategoryTotal, DashboardStats, MetricComparison, MonthlySummary,
    PerformanceMetrics, TransactionStats,
};
pub use transaction::{Transaction, TransactionKind, TransactionView};
pub use user::{Session, User};
pub use wallet::Wallet;
