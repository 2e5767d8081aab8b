//! Income and expense display formatting

use super::dashboard::format_breakdown;
use super::report::{format_change, money, truncate};
use crate::models::{TransactionKind, TransactionStats, TransactionView};

/// One register line
fn format_row(view: &TransactionView, currency: &str, date_format: &str) -> String {
    let t = &view.transaction;
    format!(
        "{:<12} {:<10} {:<18} {:<18} {:>12}  {}",
        t.id.to_string(),
        t.date.format(date_format),
        truncate(view.wallet_name.as_deref().unwrap_or("?"), 18),
        truncate(view.category_label(), 18),
        money(t.amount, currency),
        t.description.as_deref().unwrap_or(""),
    )
}

/// Format transactions as a register, newest first as given
pub fn format_transaction_list(
    kind: TransactionKind,
    views: &[TransactionView],
    currency: &str,
    date_format: &str,
) -> String {
    if views.is_empty() {
        return match kind {
            TransactionKind::Income => "No hay ingresos.\n".to_string(),
            TransactionKind::Expense => "No hay gastos.\n".to_string(),
        };
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<10} {:<18} {:<18} {:>12}  {}\n",
        "ID", "Fecha", "Cartera", "Categoría", "Monto", "Descripción"
    ));
    output.push_str(&"-".repeat(90));
    output.push('\n');

    for view in views {
        output.push_str(&format_row(view, currency, date_format));
        output.push('\n');
    }
    output
}

pub fn format_transaction_details(
    kind: TransactionKind,
    view: &TransactionView,
    currency: &str,
    date_format: &str,
) -> String {
    let t = &view.transaction;
    let title = match kind {
        TransactionKind::Income => "Ingreso",
        TransactionKind::Expense => "Gasto",
    };

    let mut output = String::new();
    output.push_str(&format!("{}: {}\n", title, t.id));
    output.push_str(&format!("  Fecha:       {}\n", t.date.format(date_format)));
    output.push_str(&format!("  Monto:       {}\n", money(t.amount, currency)));
    output.push_str(&format!(
        "  Cartera:     {}\n",
        view.wallet_name.as_deref().unwrap_or("?")
    ));
    output.push_str(&format!("  Categoría:   {}\n", view.category_label()));
    if let Some(description) = &t.description {
        output.push_str(&format!("  Descripción: {}\n", description));
    }
    output
}

pub fn format_transaction_stats(
    kind: TransactionKind,
    stats: &TransactionStats,
    currency: &str,
) -> String {
    let title = match kind {
        TransactionKind::Income => "Ingresos",
        TransactionKind::Expense => "Gastos",
    };

    let mut output = String::new();
    output.push_str(&format!("{}\n", title));
    output.push_str(&format!("  Total:          {}\n", money(stats.total, currency)));
    output.push_str(&format!(
        "  Este mes:       {}\n",
        money(stats.current_month, currency)
    ));
    output.push_str(&format!(
        "  Mes anterior:   {}\n",
        money(stats.previous_month, currency)
    ));
    output.push_str(&format!(
        "  Variación:      {}\n",
        format_change(stats.percent_change)
    ));
    if !stats.by_category.is_empty() {
        output.push('\n');
        output.push_str(&format_breakdown(&stats.by_category, currency));
        output.push('\n');
    }
    output
}
