//! Derived, non-persisted statistics
//!
//! Every value here is recomputed on request from the current wallets,
//! categories and transactions. Defaults are the zero/empty values used when a
//! source cannot be read.

use serde::Serialize;

use super::category::Category;
use super::money::Money;
use super::transaction::TransactionView;
use super::wallet::Wallet;

/// Sum of transactions under one category label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    /// Share of the grouped total, 0..=100
    pub percentage: f64,
}

/// Statistics for one transaction kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionStats {
    pub total: Money,
    pub current_month: Money,
    pub previous_month: Money,
    /// Month-over-month change in percent; 0 when the previous month is 0
    pub percent_change: f64,
    pub by_category: Vec<CategoryTotal>,
}

/// Aggregate dashboard snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_balance: Money,
    pub total_income: Money,
    pub total_expense: Money,
    pub income_month: Money,
    pub expense_month: Money,
    /// income_month - expense_month
    pub monthly_balance: Money,
    /// Income share of the month's movement, 0 when there was none
    pub income_share: f64,
    /// Expense share of the month's movement, 0 when there was none
    pub expense_share: f64,
    pub wallets: Vec<Wallet>,
    pub categories: Vec<Category>,
    pub recent_expenses: Vec<TransactionView>,
    pub income_by_category: Vec<CategoryTotal>,
    pub expense_by_category: Vec<CategoryTotal>,
    /// Names of sources that failed or timed out and were replaced by defaults
    pub degraded_sources: Vec<&'static str>,
}

/// Severity of a dashboard alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Success,
    Warning,
    Danger,
}

/// A derived dashboard notice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub title: &'static str,
    pub message: String,
}

/// Totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// "YYYY-MM"
    pub period: String,
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
    /// max(balance, 0)
    pub savings: Money,
}

/// Current vs previous month for one figure
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricComparison {
    pub current: Money,
    pub previous: Money,
    pub percent_change: f64,
}

/// Month-over-month performance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub income: MetricComparison,
    pub expense: MetricComparison,
    pub savings: MetricComparison,
    /// Savings as a share of monthly income, 0 when there was no income
    pub savings_ratio: f64,
}
