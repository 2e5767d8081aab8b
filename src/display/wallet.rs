//! Wallet display formatting

use super::report::money;
use crate::models::{Money, Wallet};

/// Format wallets as a table with a total row
pub fn format_wallet_list(wallets: &[Wallet], currency: &str) -> String {
    if wallets.is_empty() {
        return "No hay carteras.\n\nCrea una con 'laplata wallet add <nombre>'.".to_string();
    }

    let name_width = wallets
        .iter()
        .map(|w| w.name.chars().count())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:>14}\n",
        "ID",
        "Nombre",
        "Saldo",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:->14}\n",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for wallet in wallets {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {:>14}\n",
            wallet.id.to_string(),
            wallet.name,
            money(wallet.balance, currency),
            name_width = name_width,
        ));
    }

    let total: Money = wallets.iter().map(|w| w.balance).sum();
    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:->14}\n",
        "",
        "",
        "",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:>14}\n",
        "TOTAL",
        "",
        money(total, currency),
        name_width = name_width,
    ));

    output
}

/// Format a single wallet's details
pub fn format_wallet_details(wallet: &Wallet, currency: &str, date_format: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Cartera: {}\n", wallet.name));
    output.push_str(&format!("  ID:          {}\n", wallet.id));
    output.push_str(&format!("  Saldo:       {}\n", money(wallet.balance, currency)));
    output.push_str(&format!(
        "  Creada:      {}\n",
        wallet.created_at.format(date_format)
    ));
    output.push_str(&format!(
        "  Modificada:  {}\n",
        wallet.updated_at.format(date_format)
    ));
    output
}
