//! Dashboard display formatting
//!
//! Breakdowns and monthly summaries are rendered with `tabled`.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::report::{format_bar, format_change, format_percentage, money, separator};
use crate::models::{
    Alert, AlertLevel, CategoryTotal, DashboardStats, Money, MonthlySummary, PerformanceMetrics,
};

const BAR_WIDTH: usize = 20;

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Categoría")]
    category: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "%")]
    share: String,
    #[tabled(rename = "")]
    bar: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Mes")]
    period: String,
    #[tabled(rename = "Ingresos")]
    income: String,
    #[tabled(rename = "Gastos")]
    expense: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Ahorro")]
    savings: String,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Category totals with their share and a bar
pub fn format_breakdown(totals: &[CategoryTotal], currency: &str) -> String {
    if totals.is_empty() {
        return "Sin movimientos.".to_string();
    }
    let rows = totals
        .iter()
        .map(|t| BreakdownRow {
            category: t.category.clone(),
            total: money(t.total, currency),
            share: format_percentage(t.percentage),
            bar: format_bar(t.percentage, 100.0, BAR_WIDTH),
        })
        .collect();
    render::<BreakdownRow>(rows)
}

pub fn format_financial_summary(months: &[MonthlySummary], currency: &str) -> String {
    let rows = months
        .iter()
        .map(|m| SummaryRow {
            period: m.period.clone(),
            income: money(m.income, currency),
            expense: money(m.expense, currency),
            balance: money(m.balance, currency),
            savings: money(m.savings, currency),
        })
        .collect();
    render::<SummaryRow>(rows)
}

pub fn format_performance_metrics(metrics: &PerformanceMetrics, currency: &str) -> String {
    let line = |label: &str, current: Money, previous: Money, change: f64| {
        format!(
            "  {:<10} {:>14} {:>14} {:>9}\n",
            label,
            money(current, currency),
            money(previous, currency),
            format_change(change),
        )
    };

    let mut output = String::new();
    output.push_str(&format!(
        "  {:<10} {:>14} {:>14} {:>9}\n",
        "", "Este mes", "Mes anterior", "Cambio"
    ));
    output.push_str(&line(
        "Ingresos",
        metrics.income.current,
        metrics.income.previous,
        metrics.income.percent_change,
    ));
    output.push_str(&line(
        "Gastos",
        metrics.expense.current,
        metrics.expense.previous,
        metrics.expense.percent_change,
    ));
    output.push_str(&line(
        "Ahorro",
        metrics.savings.current,
        metrics.savings.previous,
        metrics.savings.percent_change,
    ));
    output.push_str(&format!(
        "\n  Tasa de ahorro: {}\n",
        format_percentage(metrics.savings_ratio)
    ));
    output
}

pub fn format_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "Sin alertas.\n".to_string();
    }
    let mut output = String::new();
    for alert in alerts {
        let icon = match alert.level {
            AlertLevel::Success => "✓",
            AlertLevel::Warning => "!",
            AlertLevel::Danger => "✗",
        };
        output.push_str(&format!("{} {}: {}\n", icon, alert.title, alert.message));
    }
    output
}

/// The full dashboard snapshot
pub fn format_dashboard(stats: &DashboardStats, alerts: &[Alert], currency: &str) -> String {
    let mut output = String::new();
    output.push_str("Resumen\n");
    output.push_str(&separator(40));
    output.push('\n');
    output.push_str(&format!(
        "  Saldo total:     {}\n",
        money(stats.total_balance, currency)
    ));
    output.push_str(&format!(
        "  Ingresos (mes):  {}  ({})\n",
        money(stats.income_month, currency),
        format_percentage(stats.income_share)
    ));
    output.push_str(&format!(
        "  Gastos (mes):    {}  ({})\n",
        money(stats.expense_month, currency),
        format_percentage(stats.expense_share)
    ));
    output.push_str(&format!(
        "  Balance (mes):   {}\n",
        money(stats.monthly_balance, currency)
    ));
    output.push_str(&format!(
        "  Carteras: {}   Categorías: {}\n",
        stats.wallets.len(),
        stats.categories.len()
    ));

    output.push('\n');
    output.push_str(&format_alerts(alerts));

    if !stats.recent_expenses.is_empty() {
        output.push_str("\nÚltimos gastos\n");
        for view in &stats.recent_expenses {
            output.push_str(&format!(
                "  {}  {:<18} {:>12}\n",
                view.transaction.date,
                view.category_label(),
                money(view.transaction.amount, currency)
            ));
        }
    }

    if !stats.expense_by_category.is_empty() {
        output.push_str("\nGastos por categoría\n");
        output.push_str(&format_breakdown(&stats.expense_by_category, currency));
        output.push('\n');
    }

    if !stats.degraded_sources.is_empty() {
        output.push_str(&format!(
            "\nDatos incompletos: {}\n",
            stats.degraded_sources.join(", ")
        ));
    }
    output
}
