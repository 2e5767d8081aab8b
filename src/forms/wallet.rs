//! Wallet create / edit form

use std::time::Instant;

use super::{
    amount_text, collect_errors, settle, DeleteConfirmation, FieldError, FormOutcome, Modal,
};
use crate::i18n::{Action, Subject};
use crate::models::wallet::MIN_NAME_LEN;
use crate::models::{Money, Wallet};
use crate::services::{WalletService, WalletUpdate};

#[derive(Debug)]
pub struct WalletForm {
    pub name: String,
    /// Balance as typed, e.g. "1500" or "1500.50"
    pub balance: String,
    editing: Option<Wallet>,
    modal: Modal,
    delete: DeleteConfirmation,
}

impl WalletForm {
    /// Empty form for a new wallet
    pub fn create() -> Self {
        Self {
            name: String::new(),
            balance: "0".to_string(),
            editing: None,
            modal: Modal::new(),
            delete: DeleteConfirmation::default(),
        }
    }

    /// Form prefilled with an existing wallet
    pub fn edit(wallet: &Wallet) -> Self {
        Self {
            name: wallet.name.clone(),
            balance: amount_text(wallet.balance),
            editing: Some(wallet.clone()),
            modal: Modal::new(),
            delete: DeleteConfirmation::default(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// An edit may keep an overdrawn balance; only a newly typed one must
    /// be non-negative
    pub fn validate(&self) -> Result<(String, Money), Vec<FieldError>> {
        let name = self.name.trim().to_string();
        let balance = Money::parse(self.balance.trim());
        let unchanged = |b: &Money| self.editing.as_ref().is_some_and(|w| w.balance == *b);

        collect_errors(vec![
            (name.chars().count() < MIN_NAME_LEN).then(|| {
                FieldError::new("name", "El nombre debe tener al menos 2 caracteres")
            }),
            match &balance {
                Err(_) => Some(FieldError::new("balance", "El saldo debe ser un número válido")),
                Ok(b) if b.is_negative() && !unchanged(b) => {
                    Some(FieldError::new("balance", "El saldo no puede ser negativo"))
                }
                Ok(_) => None,
            },
        ])?;

        Ok((name, balance.unwrap_or_default()))
    }

    pub fn submit(&mut self, service: &WalletService, now: Instant) -> FormOutcome<Wallet> {
        let (name, balance) = match self.validate() {
            Ok(valid) => valid,
            Err(errors) => return FormOutcome::Invalid(errors),
        };

        match &self.editing {
            None => settle(
                service.create(&name, Some(balance)),
                Subject::Wallet,
                Action::Create,
                &mut self.modal,
                now,
            ),
            Some(wallet) => {
                let update = WalletUpdate {
                    name: Some(name),
                    balance: (balance != wallet.balance).then_some(balance),
                };
                settle(
                    service.update(wallet.id, update),
                    Subject::Wallet,
                    Action::Update,
                    &mut self.modal,
                    now,
                )
            }
        }
    }

    pub fn request_delete(&mut self) {
        if self.editing.is_some() {
            self.delete.request();
        }
    }

    pub fn cancel_delete(&mut self) {
        self.delete.cancel();
    }

    /// Delete the wallet being edited, with its incomes and expenses
    pub fn confirm_delete(&mut self, service: &WalletService, now: Instant) -> FormOutcome<Wallet> {
        let Some(wallet) = self.editing.as_ref() else {
            return FormOutcome::Invalid(vec![FieldError::new("delete", "Nada que eliminar")]);
        };
        let id = wallet.id;
        self.delete
            .confirm(Subject::Wallet, &mut self.modal, now, || service.delete(id).map(|_| ()))
    }

    pub fn cancel(&mut self, now: Instant) {
        self.modal.close(now);
    }

    /// Backdrop dismissal; ignored while the delete prompt is showing
    pub fn close(&mut self, now: Instant) {
        if !self.delete.is_requested() {
            self.modal.close(now);
        }
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut Modal {
        &mut self.modal
    }
}
