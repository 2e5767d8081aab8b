//! Income / expense create / edit form

use std::time::Instant;

use chrono::{Local, NaiveDate};

use super::{
    amount_text, collect_errors, settle, DeleteConfirmation, FieldError, FormOutcome, Modal,
};
use crate::error::LaplataResult;
use crate::i18n::{Action, Subject};
use crate::models::{Category, CategoryId, Money, TransactionKind, TransactionView, WalletId};
use crate::services::{NewTransaction, TransactionService, TransactionUpdate};

/// Smallest amount a transaction may carry
const MIN_AMOUNT: Money = Money::from_cents(1);

/// Validated field values
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInput {
    pub wallet_id: WalletId,
    pub category_id: Option<CategoryId>,
    pub amount: Money,
    pub description: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug)]
pub struct TransactionForm {
    kind: TransactionKind,
    pub wallet_id: Option<WalletId>,
    pub category_id: Option<CategoryId>,
    /// Amount as typed
    pub amount: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    editing: Option<TransactionView>,
    modal: Modal,
    delete: DeleteConfirmation,
}

impl TransactionForm {
    /// Empty form dated today
    pub fn create(kind: TransactionKind) -> Self {
        Self {
            kind,
            wallet_id: None,
            category_id: None,
            amount: String::new(),
            description: String::new(),
            date: Some(Local::now().date_naive()),
            editing: None,
            modal: Modal::new(),
            delete: DeleteConfirmation::default(),
        }
    }

    pub fn edit(kind: TransactionKind, view: &TransactionView) -> Self {
        let t = &view.transaction;
        Self {
            kind,
            wallet_id: Some(t.wallet_id),
            category_id: t.category_id,
            amount: amount_text(t.amount),
            description: t.description.clone().unwrap_or_default(),
            date: Some(t.date),
            editing: Some(view.clone()),
            modal: Modal::new(),
            delete: DeleteConfirmation::default(),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Categories a user may pick: only those of this form's kind
    pub fn category_options(
        &self,
        service: &crate::services::CategoryService,
    ) -> LaplataResult<Vec<Category>> {
        service.list_by_kind(self.kind.category_kind())
    }

    pub fn validate(&self) -> Result<TransactionInput, Vec<FieldError>> {
        let amount = Money::parse(self.amount.trim()).ok();

        collect_errors(vec![
            self.wallet_id
                .is_none()
                .then(|| FieldError::new("wallet", "Selecciona una cartera")),
            match amount {
                Some(a) if a >= MIN_AMOUNT => None,
                _ => Some(FieldError::new("amount", "El monto debe ser mayor a 0")),
            },
            self.date
                .is_none()
                .then(|| FieldError::new("date", "La fecha es obligatoria")),
        ])?;

        match (self.wallet_id, amount, self.date) {
            (Some(wallet_id), Some(amount), Some(date)) => Ok(TransactionInput {
                wallet_id,
                category_id: self.category_id,
                amount,
                description: Some(self.description.trim().to_string()).filter(|d| !d.is_empty()),
                date,
            }),
            _ => Err(vec![FieldError::new(
                "form",
                "Por favor, completa todos los campos requeridos",
            )]),
        }
    }

    pub fn submit(
        &mut self,
        service: &TransactionService,
        now: Instant,
    ) -> FormOutcome<TransactionView> {
        let input = match self.validate() {
            Ok(input) => input,
            Err(errors) => return FormOutcome::Invalid(errors),
        };
        let subject = Subject::from(self.kind);

        match &self.editing {
            None => {
                let new = NewTransaction {
                    wallet_id: input.wallet_id,
                    category_id: input.category_id,
                    amount: input.amount,
                    description: input.description,
                    date: Some(input.date),
                };
                settle(service.create(new), subject, Action::Create, &mut self.modal, now)
            }
            Some(view) => {
                let update = TransactionUpdate {
                    wallet_id: Some(input.wallet_id),
                    category_id: Some(input.category_id),
                    amount: Some(input.amount),
                    description: Some(input.description),
                    date: Some(input.date),
                };
                settle(
                    service.update(view.transaction.id, update),
                    subject,
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

    pub fn confirm_delete(
        &mut self,
        service: &TransactionService,
        now: Instant,
    ) -> FormOutcome<TransactionView> {
        let Some(view) = self.editing.as_ref() else {
            return FormOutcome::Invalid(vec![FieldError::new("delete", "Nada que eliminar")]);
        };
        let id = view.transaction.id;
        self.delete
            .confirm(Subject::from(self.kind), &mut self.modal, now, || {
                service.delete(id).map(|_| ())
            })
    }

    pub fn cancel(&mut self, now: Instant) {
        self.modal.close(now);
    }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryKind;
    use crate::services::testing::context;
    use crate::services::{CategoryService, WalletService};
    use std::sync::Arc;

    fn services() -> (Arc<WalletService>, Arc<CategoryService>, TransactionService) {
        let ctx = context();
        let wallets = Arc::new(WalletService::new(Arc::clone(&ctx)));
        let categories = Arc::new(CategoryService::new(Arc::clone(&ctx)));
        let expenses = TransactionService::new(
            TransactionKind::Expense,
            ctx,
            Arc::clone(&wallets),
            Arc::clone(&categories),
        );
        (wallets, categories, expenses)
    }

    #[test]
    fn test_required_fields() {
        let mut form = TransactionForm::create(TransactionKind::Expense);
        form.date = None;
        form.amount = "0".into();
        let fields: Vec<&str> = form
            .validate()
            .unwrap_err()
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["wallet", "amount", "date"]);
    }

    #[test]
    fn test_smallest_amount() {
        let mut form = TransactionForm::create(TransactionKind::Income);
        form.wallet_id = Some(WalletId::new());
        form.amount = "0.01".into();
        assert_eq!(form.validate().unwrap().amount, MIN_AMOUNT);
        form.amount = "0.00".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_submit_posts_expense() {
        let (wallets, categories, expenses) = services();
        let main = wallets.create("Main", Some(Money::from_units(100))).unwrap();
        categories.create("Salario", CategoryKind::Income).unwrap();
        categories.create("Comida", CategoryKind::Expense).unwrap();

        let mut form = TransactionForm::create(TransactionKind::Expense);
        let options = form.category_options(&categories).unwrap();
        assert_eq!(options.len(), 1);

        form.wallet_id = Some(main.id);
        form.category_id = Some(options[0].id);
        form.amount = "25.50".into();
        form.description = "  almuerzo ".into();

        match form.submit(&expenses, Instant::now()) {
            FormOutcome::Saved(view) => {
                assert_eq!(view.category_label(), "Comida");
                assert_eq!(view.transaction.description.as_deref(), Some("almuerzo"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            wallets.get(main.id).unwrap().balance,
            Money::from_cents(7450)
        );
    }

    #[test]
    fn test_edit_then_delete_restores_balance() {
        let (wallets, _categories, expenses) = services();
        let main = wallets.create("Main", Some(Money::from_units(100))).unwrap();

        let mut form = TransactionForm::create(TransactionKind::Expense);
        form.wallet_id = Some(main.id);
        form.amount = "30".into();
        let FormOutcome::Saved(view) = form.submit(&expenses, Instant::now()) else {
            panic!("expected saved");
        };

        let mut form = TransactionForm::edit(TransactionKind::Expense, &view);
        form.amount = "50".into();
        assert!(form.submit(&expenses, Instant::now()).is_saved());
        assert_eq!(wallets.get(main.id).unwrap().balance, Money::from_units(50));

        let mut form = TransactionForm::edit(TransactionKind::Expense, &view);
        form.request_delete();
        assert_eq!(
            form.confirm_delete(&expenses, Instant::now()),
            FormOutcome::Deleted
        );
        assert_eq!(wallets.get(main.id).unwrap().balance, Money::from_units(100));
    }
}
