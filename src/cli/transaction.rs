//! Income and expense CLI commands
//!
//! `laplata income` and `laplata expense` share these subcommands; the
//! handler is told which kind it is working on.

use std::time::Instant;

use chrono::NaiveDate;
use clap::Subcommand;

use super::{fail, not_found, parse_date, saved, CommandFailure, CommandResult};
use crate::app::App;
use crate::config::Settings;
use crate::display::{
    format_breakdown, format_transaction_details, format_transaction_list,
    format_transaction_stats,
};
use crate::forms::TransactionForm;
use crate::i18n::{Action, Subject};
use crate::models::{CategoryId, TransactionKind, TransactionView, WalletId};
use crate::services::transaction::DEFAULT_RECENT_LIMIT;
use crate::services::TransactionService;

/// Income / expense subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// List entries, newest first
    List {
        /// Only entries on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Only entries on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Record an entry
    Add {
        /// Wallet name or ID
        wallet: String,
        /// Amount (e.g. "30.50")
        amount: String,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Entry date (YYYY-MM-DD), today by default
        #[arg(short, long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one entry
    Show {
        /// Entry ID
        id: String,
    },
    /// Change an entry; the wallet balances follow
    Edit {
        /// Entry ID
        id: String,
        /// Move to another wallet
        #[arg(short, long)]
        wallet: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long, conflicts_with = "no_category")]
        category: Option<String>,
        /// Remove the category
        #[arg(long)]
        no_category: bool,
        #[arg(short, long)]
        date: Option<String>,
        /// New description; an empty value clears it
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an entry and reverse its effect on the wallet
    Delete {
        /// Entry ID
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Totals and month-over-month change
    Stats,
    /// Latest entries
    Recent {
        #[arg(short, long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Totals grouped by category
    ByCategory {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
}

fn noun(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => "el ingreso",
        TransactionKind::Expense => "el gasto",
    }
}

fn lookup(
    service: &TransactionService,
    identifier: &str,
) -> Result<TransactionView, CommandFailure> {
    let kind = service.kind();
    service
        .find(identifier)
        .map_err(fail(Subject::from(kind), Action::Load))?
        .ok_or_else(|| not_found(noun(kind), identifier))
}

fn resolve_wallet(app: &App, identifier: &str) -> Result<WalletId, CommandFailure> {
    app.wallets
        .find(identifier)
        .map_err(fail(Subject::Wallet, Action::Load))?
        .map(|w| w.id)
        .ok_or_else(|| not_found("la cartera", identifier))
}

/// Only categories of the entry's kind can be picked
fn resolve_category(
    app: &App,
    kind: TransactionKind,
    identifier: &str,
) -> Result<CategoryId, CommandFailure> {
    app.categories
        .find(identifier, Some(kind.category_kind()))
        .map_err(fail(Subject::Category, Action::Load))?
        .map(|c| c.id)
        .ok_or_else(|| not_found("la categoría", identifier))
}

fn parse_range(
    from: Option<String>,
    to: Option<String>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), CommandFailure> {
    let from = from.as_deref().map(parse_date).transpose()?;
    let to = to.as_deref().map(parse_date).transpose()?;
    Ok((from, to))
}

pub fn handle_transaction_command(
    app: &App,
    settings: &Settings,
    kind: TransactionKind,
    cmd: TransactionCommands,
) -> CommandResult {
    let service = app.transactions(kind);
    let subject = Subject::from(kind);
    let currency = settings.currency_symbol.as_str();
    let date_format = settings.date_format.as_str();

    match cmd {
        TransactionCommands::List { from, to } => {
            let views = match parse_range(from, to)? {
                (Some(from), Some(to)) => service.list_by_date_range(from, to),
                (from, to) => service.list().map(|views| {
                    views
                        .into_iter()
                        .filter(|v| from.map_or(true, |f| v.transaction.date >= f))
                        .filter(|v| to.map_or(true, |t| v.transaction.date <= t))
                        .collect::<Vec<_>>()
                }),
            }
            .map_err(fail(subject, Action::Load))?;
            print!(
                "{}",
                format_transaction_list(kind, &views, currency, date_format)
            );
        }

        TransactionCommands::Add {
            wallet,
            amount,
            category,
            date,
            description,
        } => {
            let mut form = TransactionForm::create(kind);
            form.wallet_id = Some(resolve_wallet(app, &wallet)?);
            form.amount = amount;
            if let Some(category) = category {
                form.category_id = Some(resolve_category(app, kind, &category)?);
            }
            if let Some(date) = date {
                form.date = Some(parse_date(&date)?);
            }
            form.description = description.unwrap_or_default();

            if let Some(view) = saved(form.submit(service, Instant::now()))? {
                let title = match kind {
                    TransactionKind::Income => "Ingreso registrado",
                    TransactionKind::Expense => "Gasto registrado",
                };
                println!(
                    "{}: {} en {}",
                    title,
                    view.transaction.amount.format_with_symbol(currency),
                    view.wallet_name.as_deref().unwrap_or("?")
                );
                println!("  ID: {}", view.transaction.id);
            }
        }

        TransactionCommands::Show { id } => {
            let view = lookup(service, &id)?;
            print!(
                "{}",
                format_transaction_details(kind, &view, currency, date_format)
            );
        }

        TransactionCommands::Edit {
            id,
            wallet,
            amount,
            category,
            no_category,
            date,
            description,
        } => {
            let view = lookup(service, &id)?;
            let mut form = TransactionForm::edit(kind, &view);
            if let Some(wallet) = wallet {
                form.wallet_id = Some(resolve_wallet(app, &wallet)?);
            }
            if let Some(amount) = amount {
                form.amount = amount;
            }
            if no_category {
                form.category_id = None;
            } else if let Some(category) = category {
                form.category_id = Some(resolve_category(app, kind, &category)?);
            }
            if let Some(date) = date {
                form.date = Some(parse_date(&date)?);
            }
            if let Some(description) = description {
                form.description = description;
            }

            if let Some(updated) = saved(form.submit(service, Instant::now()))? {
                println!(
                    "Actualizado: {} en {}",
                    updated.transaction.amount.format_with_symbol(currency),
                    updated.wallet_name.as_deref().unwrap_or("?")
                );
            }
        }

        TransactionCommands::Delete { id, yes } => {
            let view = lookup(service, &id)?;
            if !yes {
                println!(
                    "Se eliminará {} de {}. Repite con --yes para confirmar.",
                    noun(kind),
                    view.transaction.amount.format_with_symbol(currency)
                );
                return Ok(());
            }
            let mut form = TransactionForm::edit(kind, &view);
            form.request_delete();
            saved(form.confirm_delete(service, Instant::now()))?;
            println!("Eliminado: {}", view.transaction.id);
        }

        TransactionCommands::Stats => {
            let stats = service.stats().map_err(fail(subject, Action::Load))?;
            print!("{}", format_transaction_stats(kind, &stats, currency));
        }

        TransactionCommands::Recent { limit } => {
            let views = service.recent(limit).map_err(fail(subject, Action::Load))?;
            print!(
                "{}",
                format_transaction_list(kind, &views, currency, date_format)
            );
        }

        TransactionCommands::ByCategory { from, to } => {
            let (from, to) = parse_range(from, to)?;
            let totals = service
                .by_category(from, to)
                .map_err(fail(subject, Action::Load))?;
            println!("{}", format_breakdown(&totals, currency));
        }
    }

    Ok(())
}
