//! Wallet CLI commands

use std::time::Instant;

use clap::Subcommand;

use super::{fail, not_found, saved, CommandFailure, CommandResult};
use crate::app::App;
use crate::config::Settings;
use crate::display::{format_wallet_details, format_wallet_list};
use crate::forms::WalletForm;
use crate::i18n::{Action, Subject};
use crate::models::Wallet;

/// Wallet subcommands
#[derive(Subcommand)]
pub enum WalletCommands {
    /// List wallets, newest first
    List,
    /// Create a wallet
    Add {
        /// Wallet name
        name: String,
        /// Starting balance (e.g. "1000.00" or "1000")
        #[arg(short, long, default_value = "0")]
        balance: String,
    },
    /// Show wallet details
    Show {
        /// Wallet name or ID
        wallet: String,
    },
    /// Rename a wallet or correct its balance
    Edit {
        /// Wallet name or ID
        wallet: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        balance: Option<String>,
    },
    /// Delete a wallet together with its incomes and expenses
    Delete {
        /// Wallet name or ID
        wallet: String,
        /// Skip the confirmation notice
        #[arg(short, long)]
        yes: bool,
    },
    /// Sum of all wallet balances
    Total,
}

fn lookup(app: &App, identifier: &str) -> Result<Wallet, CommandFailure> {
    app.wallets
        .find(identifier)
        .map_err(fail(Subject::Wallet, Action::Load))?
        .ok_or_else(|| not_found("la cartera", identifier))
}

pub fn handle_wallet_command(app: &App, settings: &Settings, cmd: WalletCommands) -> CommandResult {
    let currency = settings.currency_symbol.as_str();

    match cmd {
        WalletCommands::List => {
            let wallets = app
                .wallets
                .list()
                .map_err(fail(Subject::Wallet, Action::Load))?;
            print!("{}", format_wallet_list(&wallets, currency));
        }

        WalletCommands::Add { name, balance } => {
            let mut form = WalletForm::create();
            form.name = name;
            form.balance = balance;
            if let Some(wallet) = saved(form.submit(&app.wallets, Instant::now()))? {
                println!("Cartera creada: {}", wallet.name);
                println!("  Saldo: {}", wallet.balance.format_with_symbol(currency));
                println!("  ID: {}", wallet.id);
            }
        }

        WalletCommands::Show { wallet } => {
            let found = lookup(app, &wallet)?;
            print!(
                "{}",
                format_wallet_details(&found, currency, &settings.date_format)
            );
        }

        WalletCommands::Edit {
            wallet,
            name,
            balance,
        } => {
            if name.is_none() && balance.is_none() {
                println!("Sin cambios. Usa --name o --balance.");
                return Ok(());
            }
            let found = lookup(app, &wallet)?;
            let mut form = WalletForm::edit(&found);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(balance) = balance {
                form.balance = balance;
            }
            if let Some(updated) = saved(form.submit(&app.wallets, Instant::now()))? {
                println!(
                    "Cartera actualizada: {} ({})",
                    updated.name,
                    updated.balance.format_with_symbol(currency)
                );
            }
        }

        WalletCommands::Delete { wallet, yes } => {
            let found = lookup(app, &wallet)?;
            if !yes {
                println!(
                    "Se eliminará '{}' junto con sus ingresos y gastos. Repite con --yes para confirmar.",
                    found.name
                );
                return Ok(());
            }
            let mut form = WalletForm::edit(&found);
            form.request_delete();
            saved(form.confirm_delete(&app.wallets, Instant::now()))?;
            println!("Cartera eliminada: {}", found.name);
        }

        WalletCommands::Total => {
            let total = app
                .wallets
                .total_balance()
                .map_err(fail(Subject::Wallet, Action::Load))?;
            println!("Saldo total: {}", total.format_with_symbol(currency));
        }
    }

    Ok(())
}
