//! Per-category breakdown
//!
//! Groups transactions by category display name. Transactions without a
//! category (or whose category no longer exists) fall under the
//! uncategorized label rather than being dropped.

use std::collections::HashMap;

use crate::models::{CategoryTotal, Money, TransactionView};

use super::monthly::share;

/// Sum `views` by category label, largest total first
///
/// Each entry carries its share of the grouped total; ties are ordered by
/// label so the output is stable.
pub fn category_breakdown<'a, I>(views: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a TransactionView>,
{
    let mut grouped: HashMap<&str, Money> = HashMap::new();
    for view in views {
        *grouped.entry(view.category_label()).or_default() += view.transaction.amount;
    }

    let total: Money = grouped.values().copied().sum();

    let mut rows: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(label, amount)| CategoryTotal {
            category: label.to_string(),
            total: amount,
            percentage: share(amount, total),
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    rows
}
