//! Display formatting for terminal output
//!
//! Plain-text renderings of wallets, categories, transactions and dashboard
//! figures. Amounts are formatted with the configured currency symbol.

pub mod category;
pub mod dashboard;
pub mod report;
pub mod transaction;
pub mod wallet;

pub use category::format_category_list;
pub use dashboard::{
    format_alerts, format_breakdown, format_dashboard, format_financial_summary,
    format_performance_metrics,
};
pub use transaction::{
    format_transaction_details, format_transaction_list, format_transaction_stats,
};
pub use wallet::{format_wallet_details, format_wallet_list};
