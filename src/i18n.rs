//! User-facing failure messages
//!
//! Backend and transport errors are never shown raw: each operation has one
//! fixed Spanish message and the underlying error goes to the log. Validation
//! and session errors are already meant for the user and pass through.

use tracing::error;

use crate::error::LaplataError;
use crate::models::TransactionKind;

/// What an operation acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Wallet,
    Category,
    Income,
    Expense,
    Dashboard,
}

impl From<TransactionKind> for Subject {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => Self::Income,
            TransactionKind::Expense => Self::Expense,
        }
    }
}

/// What the operation tried to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Create,
    Update,
    Delete,
}

/// Fallback when nothing more specific applies
pub const UNEXPECTED: &str = "Error inesperado. Por favor, intenta nuevamente.";

/// The fixed message for a failed operation
pub fn failure_message(subject: Subject, action: Action) -> &'static str {
    use Action::*;
    use Subject::*;

    match (subject, action) {
        (Wallet, Load) => "Error al cargar las carteras. Inténtalo de nuevo.",
        (Wallet, Create) => "Error al crear la cartera. Inténtalo de nuevo.",
        (Wallet, Update) => "Error al actualizar la cartera. Inténtalo de nuevo.",
        (Wallet, Delete) => "Error al eliminar la cartera. Inténtalo de nuevo.",
        (Category, Load) => "Error al cargar las categorías. Por favor, inténtalo de nuevo.",
        (Category, Create) => "Error al crear la categoría. Por favor, inténtalo de nuevo.",
        (Category, Update) => "Error al actualizar la categoría. Por favor, inténtalo de nuevo.",
        (Category, Delete) => "Error al eliminar la categoría. Por favor, inténtalo de nuevo.",
        (Income, Load) => "Error al cargar los ingresos. Inténtalo de nuevo.",
        (Income, Create) => "Error al crear el ingreso. Por favor, inténtalo de nuevo.",
        (Income, Update) => "Error al actualizar el ingreso. Inténtalo de nuevo.",
        (Income, Delete) => "Error al eliminar el ingreso. Inténtalo de nuevo.",
        (Expense, Load) => "Error al cargar los gastos. Inténtalo de nuevo.",
        (Expense, Create) => "Error al crear el gasto. Por favor, inténtalo de nuevo.",
        (Expense, Update) => "Error al actualizar el gasto. Inténtalo de nuevo.",
        (Expense, Delete) => "Error al eliminar el gasto. Inténtalo de nuevo.",
        (Dashboard, Load) => "Error al cargar el panel. Inténtalo de nuevo.",
        (Dashboard, _) => UNEXPECTED,
    }
}

/// Message to show for `err`, logging whatever is replaced
pub fn describe_failure(subject: Subject, action: Action, err: &LaplataError) -> String {
    match err {
        LaplataError::Validation(message) => message.clone(),
        LaplataError::NotAuthenticated => err.to_string(),
        other => {
            error!(?subject, ?action, error = %other, "operation failed");
            failure_message(subject, action).to_string()
        }
    }
}
