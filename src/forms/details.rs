//! Delete confirmation shared by the edit forms

use std::time::Instant;

use super::{FieldError, FormOutcome, Modal, ModalEvent};
use crate::error::LaplataResult;
use crate::i18n::{describe_failure, Action, Subject};

/// Two-step delete: `request` shows the prompt, `confirm` performs it
#[derive(Debug, Default)]
pub struct DeleteConfirmation {
    requested: bool,
}

impl DeleteConfirmation {
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn cancel(&mut self) {
        self.requested = false;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Run `delete` if the prompt was shown. Success reports `Deleted` to the
    /// modal and closes it; failure hides the prompt again.
    pub fn confirm<T, F>(
        &mut self,
        subject: Subject,
        modal: &mut Modal,
        now: Instant,
        delete: F,
    ) -> FormOutcome<T>
    where
        F: FnOnce() -> LaplataResult<()>,
    {
        if !self.requested {
            return FormOutcome::Invalid(vec![FieldError::new(
                "delete",
                "Confirma la eliminación antes de continuar",
            )]);
        }
        self.requested = false;
        match delete() {
            Ok(()) => {
                modal.complete(ModalEvent::Deleted, now);
                FormOutcome::Deleted
            }
            Err(e) => FormOutcome::Failed(describe_failure(subject, Action::Delete, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LaplataError;

    #[test]
    fn test_confirm_requires_request() {
        let mut confirmation = DeleteConfirmation::default();
        let mut modal = Modal::new();
        let outcome: FormOutcome<()> =
            confirmation.confirm(Subject::Wallet, &mut modal, Instant::now(), || Ok(()));
        assert!(matches!(outcome, FormOutcome::Invalid(_)));
        assert!(modal.is_open());
    }

    #[test]
    fn test_failed_delete_hides_prompt() {
        let mut confirmation = DeleteConfirmation::default();
        let mut modal = Modal::new();
        confirmation.request();

        let outcome: FormOutcome<()> =
            confirmation.confirm(Subject::Wallet, &mut modal, Instant::now(), || {
                Err(LaplataError::backend("boom"))
            });
        assert_eq!(
            outcome,
            FormOutcome::Failed("Error al eliminar la cartera. Inténtalo de nuevo.".into())
        );
        assert!(!confirmation.is_requested());
        assert!(modal.is_open());
    }

    #[test]
    fn test_successful_delete_closes() {
        let mut confirmation = DeleteConfirmation::default();
        let mut modal = Modal::new();
        confirmation.request();

        let now = Instant::now();
        let outcome: FormOutcome<()> =
            confirmation.confirm(Subject::Category, &mut modal, now, || Ok(()));
        assert_eq!(outcome, FormOutcome::Deleted);
        assert!(!modal.is_open());
        assert_eq!(modal.take_events(), vec![ModalEvent::Deleted]);
    }
}
