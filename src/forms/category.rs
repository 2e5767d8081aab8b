//! Category create / edit form

use std::time::Instant;

use super::{collect_errors, settle, DeleteConfirmation, FieldError, FormOutcome, Modal};
use crate::i18n::{Action, Subject};
use crate::models::category::{MAX_NAME_LEN, MIN_NAME_LEN};
use crate::models::{Category, CategoryKind};
use crate::services::{CategoryService, CategoryUpdate};

#[derive(Debug)]
pub struct CategoryForm {
    pub name: String,
    pub kind: Option<CategoryKind>,
    editing: Option<Category>,
    modal: Modal,
    delete: DeleteConfirmation,
}

impl CategoryForm {
    pub fn create() -> Self {
        Self {
            name: String::new(),
            kind: None,
            editing: None,
            modal: Modal::new(),
            delete: DeleteConfirmation::default(),
        }
    }

    pub fn edit(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            kind: Some(category.kind),
            editing: Some(category.clone()),
            modal: Modal::new(),
            delete: DeleteConfirmation::default(),
        }
    }

    pub fn validate(&self) -> Result<(String, CategoryKind), Vec<FieldError>> {
        let name = self.name.trim().to_string();
        let len = name.chars().count();

        collect_errors(vec![
            (len < MIN_NAME_LEN)
                .then(|| FieldError::new("name", "El nombre debe tener al menos 2 caracteres")),
            (len > MAX_NAME_LEN)
                .then(|| FieldError::new("name", "El nombre no puede superar 50 caracteres")),
            self.kind
                .is_none()
                .then(|| FieldError::new("kind", "Selecciona un tipo de categoría")),
        ])?;

        match self.kind {
            Some(kind) => Ok((name, kind)),
            None => Err(vec![FieldError::new("kind", "Selecciona un tipo de categoría")]),
        }
    }

    pub fn submit(&mut self, service: &CategoryService, now: Instant) -> FormOutcome<Category> {
        let (name, kind) = match self.validate() {
            Ok(valid) => valid,
            Err(errors) => return FormOutcome::Invalid(errors),
        };

        match &self.editing {
            None => settle(
                service.create(&name, kind),
                Subject::Category,
                Action::Create,
                &mut self.modal,
                now,
            ),
            Some(category) => {
                let update = CategoryUpdate {
                    name: Some(name),
                    kind: Some(kind),
                };
                settle(
                    service.update(category.id, update),
                    Subject::Category,
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
        service: &CategoryService,
        now: Instant,
    ) -> FormOutcome<Category> {
        let Some(category) = self.editing.as_ref() else {
            return FormOutcome::Invalid(vec![FieldError::new("delete", "Nada que eliminar")]);
        };
        let id = category.id;
        self.delete.confirm(Subject::Category, &mut self.modal, now, || {
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
