//! Aggregation helpers for LaPlata
//!
//! Pure functions over already-fetched transactions: per-category breakdowns,
//! month totals and month-over-month comparisons. Services and the dashboard
//! call these after reading from the backend.

pub mod breakdown;
pub mod monthly;

pub use breakdown::category_breakdown;
pub use monthly::{
    financial_summary, month_total, percent_change, performance_metrics, savings_change, share,
};
