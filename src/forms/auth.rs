//! Login and registration forms

use super::{collect_errors, FieldError, FormOutcome};
use crate::auth::{is_valid_email, Password, MIN_PASSWORD_LEN};
use crate::services::{AuthResponse, AuthService, RegisterData};

fn email_error(email: &str) -> Option<FieldError> {
    (!is_valid_email(email.trim())).then(|| FieldError::new("email", "Formato de email inválido"))
}

fn password_error(password: &str) -> Option<FieldError> {
    (password.chars().count() < MIN_PASSWORD_LEN).then(|| {
        FieldError::new(
            "password",
            "La contraseña debe tener al menos 6 caracteres",
        )
    })
}

/// Map a service response onto a form outcome
fn outcome(response: AuthResponse) -> FormOutcome<AuthResponse> {
    if response.success {
        FormOutcome::Saved(response)
    } else {
        FormOutcome::Failed(response.message)
    }
}

pub struct LoginForm {
    pub email: String,
    pub password: Password,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: Password::new(String::new()),
        }
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect_errors(vec![email_error(&self.email), password_error(&self.password)])
    }

    pub fn submit(&self, service: &AuthService) -> FormOutcome<AuthResponse> {
        if let Err(errors) = self.validate() {
            return FormOutcome::Invalid(errors);
        }
        outcome(service.login(&self.email, &self.password))
    }
}

pub struct RegisterForm {
    pub email: String,
    pub password: Password,
    pub confirm_password: Password,
    pub name: String,
    pub terms_accepted: bool,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: Password::new(String::new()),
            confirm_password: Password::new(String::new()),
            name: String::new(),
            terms_accepted: false,
        }
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        collect_errors(vec![
            email_error(&self.email),
            password_error(&self.password),
            (self.confirm_password.is_empty() || *self.password != *self.confirm_password).then(
                || FieldError::new("confirm_password", "Las contraseñas no coinciden"),
            ),
            self.name
                .trim()
                .is_empty()
                .then(|| FieldError::new("name", "El nombre es obligatorio")),
            (!self.terms_accepted).then(|| {
                FieldError::new("terms", "Debes aceptar los términos y condiciones")
            }),
        ])
    }

    pub fn submit(&self, service: &AuthService) -> FormOutcome<AuthResponse> {
        if let Err(errors) = self.validate() {
            return FormOutcome::Invalid(errors);
        }
        outcome(service.register(RegisterData {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            name: self.name.trim().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalAuth;
    use std::sync::Arc;

    fn pw(s: &str) -> Password {
        Password::new(s.to_string())
    }

    fn register_form() -> RegisterForm {
        RegisterForm {
            email: "ana@example.com".into(),
            password: pw("secret1"),
            confirm_password: pw("secret1"),
            name: "Ana".into(),
            terms_accepted: true,
        }
    }

    #[test]
    fn test_login_validation() {
        let form = LoginForm {
            email: "ana@example".into(),
            password: pw("12345"),
        };
        assert_eq!(form.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_register_validation() {
        assert!(register_form().validate().is_ok());

        let mut form = register_form();
        form.confirm_password = pw("secret2");
        form.terms_accepted = false;
        let fields: Vec<&str> = form
            .validate()
            .unwrap_err()
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["confirm_password", "terms"]);
    }

    #[test]
    fn test_register_then_login() {
        let service = AuthService::new(Arc::new(LocalAuth::in_memory()));
        assert!(register_form().submit(&service).is_saved());

        let again = register_form().submit(&service);
        assert_eq!(
            again,
            FormOutcome::Failed("El usuario ya está registrado".into())
        );

        let login = LoginForm {
            email: "ana@example.com".into(),
            password: pw("secret1"),
        };
        assert!(login.submit(&service).is_saved());
    }
}
