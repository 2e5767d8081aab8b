//! Month totals and month-over-month comparisons

use crate::models::{
    MetricComparison, Money, MonthPeriod, MonthlySummary, PerformanceMetrics, TransactionStats,
    TransactionView,
};

/// `part` as a percentage of `whole`; 0 when `whole` is zero
pub fn share(part: Money, whole: Money) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    part.cents() as f64 / whole.cents() as f64 * 100.0
}

/// Change from `previous` to `current` in percent; 0 when `previous` is zero
pub fn percent_change(current: Money, previous: Money) -> f64 {
    if previous.is_zero() {
        return 0.0;
    }
    (current - previous).cents() as f64 / previous.cents() as f64 * 100.0
}

/// Like [`percent_change`] but relative to `|previous|`, since savings can be negative
pub fn savings_change(current: Money, previous: Money) -> f64 {
    if previous.is_zero() {
        return 0.0;
    }
    (current - previous).cents() as f64 / previous.abs().cents() as f64 * 100.0
}

/// Sum of the transactions dated within `period`
pub fn month_total<'a, I>(views: I, period: MonthPeriod) -> Money
where
    I: IntoIterator<Item = &'a TransactionView>,
{
    views
        .into_iter()
        .filter(|v| period.contains(v.transaction.date))
        .map(|v| v.transaction.amount)
        .sum()
}

/// Income, expense, balance and savings for each month in `periods`
pub fn financial_summary(
    incomes: &[TransactionView],
    expenses: &[TransactionView],
    periods: &[MonthPeriod],
) -> Vec<MonthlySummary> {
    periods
        .iter()
        .map(|&period| {
            let income = month_total(incomes, period);
            let expense = month_total(expenses, period);
            let balance = income - expense;
            MonthlySummary {
                period: period.to_string(),
                income,
                expense,
                balance,
                savings: if balance.is_negative() {
                    Money::zero()
                } else {
                    balance
                },
            }
        })
        .collect()
}

/// Current vs previous month for income, expense and savings
pub fn performance_metrics(
    income: &TransactionStats,
    expense: &TransactionStats,
) -> PerformanceMetrics {
    let savings_current = income.current_month - expense.current_month;
    let savings_previous = income.previous_month - expense.previous_month;

    PerformanceMetrics {
        income: MetricComparison {
            current: income.current_month,
            previous: income.previous_month,
            percent_change: income.percent_change,
        },
        expense: MetricComparison {
            current: expense.current_month,
            previous: expense.previous_month,
            percent_change: expense.percent_change,
        },
        savings: MetricComparison {
            current: savings_current,
            previous: savings_previous,
            percent_change: savings_change(savings_current, savings_previous),
        },
        savings_ratio: share(savings_current, income.current_month),
    }
}
