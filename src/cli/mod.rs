//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the clap
//! argument parsing with the forms and services. Handlers print their own
//! output and report failures as a [`CommandFailure`] whose text is already
//! meant for the user.

pub mod auth;
pub mod category;
pub mod config;
pub mod dashboard;
pub mod history;
pub mod transaction;
pub mod wallet;

pub use auth::{handle_auth_command, AuthCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use dashboard::{handle_dashboard_command, DashboardCommands};
pub use history::handle_history_command;
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use wallet::{handle_wallet_command, WalletCommands};

use chrono::NaiveDate;
use thiserror::Error;

use crate::error::LaplataError;
use crate::forms::FormOutcome;
use crate::i18n::{describe_failure, Action, Subject};
use crate::models::Money;

/// A failed command; the message is ready to print
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CommandFailure(pub String);

pub type CommandResult = Result<(), CommandFailure>;

/// Map a service error to the message for `subject`/`action`
pub(crate) fn fail(subject: Subject, action: Action) -> impl FnOnce(LaplataError) -> CommandFailure {
    move |err| CommandFailure(describe_failure(subject, action, &err))
}

/// Unwrap a saved form or turn its errors into one failure
pub(crate) fn saved<T>(outcome: FormOutcome<T>) -> Result<Option<T>, CommandFailure> {
    match outcome {
        FormOutcome::Saved(value) => Ok(Some(value)),
        FormOutcome::Deleted => Ok(None),
        other => Err(CommandFailure(other.messages().join("\n"))),
    }
}

pub(crate) fn not_found(what: &str, identifier: &str) -> CommandFailure {
    CommandFailure(format!("No se encontró {}: {}", what, identifier))
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, CommandFailure> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CommandFailure(format!(
            "Fecha inválida: '{}'. Usa el formato AAAA-MM-DD",
            value
        ))
    })
}

pub(crate) fn parse_amount(value: &str) -> Result<Money, CommandFailure> {
    Money::parse(value).map_err(|_| {
        CommandFailure(format!(
            "Monto inválido: '{}'. Usa un formato como '1000.00' o '1000'",
            value
        ))
    })
}
