//! Form models
//!
//! Each form holds the raw field values a UI collects, validates them, and
//! submits through the matching service. Forms shown in a modal drive a
//! [`Modal`] so the caller knows when to take the form down and which
//! completion event to react to.

pub mod auth;
pub mod category;
pub mod details;
pub mod modal;
pub mod transaction;
pub mod wallet;

pub use auth::{LoginForm, RegisterForm};
pub use category::CategoryForm;
pub use details::DeleteConfirmation;
pub use modal::{Modal, ModalEvent, ModalState, CLOSE_DELAY};
pub use transaction::TransactionForm;
pub use wallet::WalletForm;

use std::fmt;
use std::time::Instant;

use crate::error::LaplataResult;
use crate::i18n::{describe_failure, Action, Subject};

/// A rule a field failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of submitting a form
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome<T> {
    /// The service accepted the input
    Saved(T),
    /// The record was deleted
    Deleted,
    /// Nothing was sent; fix these fields first
    Invalid(Vec<FieldError>),
    /// The service call failed; the message is ready to show
    Failed(String),
}

impl<T> FormOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// Errors for display, one line each
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Invalid(errors) => errors.iter().map(|e| e.message.clone()).collect(),
            Self::Failed(message) => vec![message.clone()],
            Self::Saved(_) | Self::Deleted => Vec::new(),
        }
    }
}

/// Collect the errors of several checks into one result
pub(crate) fn collect_errors(errors: Vec<Option<FieldError>>) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = errors.into_iter().flatten().collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Turn a service result into an outcome, completing the modal on success
pub(crate) fn settle<T>(
    result: LaplataResult<T>,
    subject: Subject,
    action: Action,
    modal: &mut Modal,
    now: Instant,
) -> FormOutcome<T> {
    match result {
        Ok(saved) => {
            let event = match action {
                Action::Create => ModalEvent::Created,
                Action::Delete => ModalEvent::Deleted,
                Action::Update | Action::Load => ModalEvent::Updated,
            };
            modal.complete(event, now);
            FormOutcome::Saved(saved)
        }
        Err(e) => FormOutcome::Failed(describe_failure(subject, action, &e)),
    }
}

/// Decimal text for an amount field
pub(crate) fn amount_text(amount: crate::models::Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    format!("{}{}.{:02}", sign, amount.units().abs(), amount.cents_part())
}
