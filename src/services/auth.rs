//! Auth service
//!
//! Wraps an [`AuthProvider`] with user-facing responses: every operation
//! answers with an [`AuthResponse`] whose message is already localized.
//! Provider messages the app knows are translated; anything else passes
//! through. The current session is mirrored into an [`Observable`] that the
//! entity services read their owner from.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use crate::auth::{AuthProvider, Password, UserUpdate};
use crate::cache::{Observable, Subscription};
use crate::error::{LaplataError, LaplataResult};
use crate::models::{Session, User};

/// Outcome of an auth operation, ready to show
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip)]
    pub session: Option<Session>,
}

impl AuthResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            user: None,
            session: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            user: None,
            session: None,
        }
    }
}

/// Registration input
#[derive(Clone)]
pub struct RegisterData {
    pub email: String,
    pub password: Password,
    pub name: String,
}

const TRANSLATIONS: &[(&str, &str)] = &[
    (
        "Invalid login credentials",
        "Credenciales de inicio de sesión inválidas",
    ),
    (
        "Email not confirmed",
        "Email no confirmado. Por favor, verifica tu email",
    ),
    ("User already registered", "El usuario ya está registrado"),
    (
        "Password should be at least 6 characters",
        "La contraseña debe tener al menos 6 caracteres",
    ),
    (
        "Unable to validate email address: invalid format",
        "Formato de email inválido",
    ),
    (
        "Email rate limit exceeded",
        "Límite de emails excedido. Intenta más tarde",
    ),
    ("Signup is disabled", "El registro está deshabilitado"),
];

/// Localize a provider message; unknown ones pass through unchanged
pub fn translate_error(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return "Error desconocido".to_string();
    }
    TRANSLATIONS
        .iter()
        .find(|(raw, _)| *raw == message)
        .map(|(_, translated)| translated.to_string())
        .unwrap_or_else(|| message.to_string())
}

/// Map a failed call to a response: provider messages are translated, any
/// other failure is logged and replaced by `fallback`
fn failure(operation: &str, err: LaplataError, fallback: &str) -> AuthResponse {
    match err {
        LaplataError::Auth { message } => {
            debug!(operation, %message, "auth provider rejected request");
            AuthResponse::failed(translate_error(&message))
        }
        other => {
            error!(operation, error = %other, "auth operation failed");
            AuthResponse::failed(fallback)
        }
    }
}

pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    session: Observable<Option<Session>>,
    _changes: Subscription,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let session = Observable::new(None);
        let sink = session.clone();
        let changes = provider.on_auth_state_change(Box::new(move |state| {
            debug!(event = ?state.event, "auth state changed");
            sink.replace(state.session.clone());
        }));
        Self {
            provider,
            session,
            _changes: changes,
        }
    }

    /// Current session, updated on every auth state change
    pub fn session(&self) -> &Observable<Option<Session>> {
        &self.session
    }

    pub fn register(&self, data: RegisterData) -> AuthResponse {
        match self
            .provider
            .sign_up(data.email.trim(), &data.password, data.name.trim())
        {
            Ok(outcome) => {
                let message = if outcome.user.is_confirmed() {
                    "Registro exitoso. ¡Bienvenido!"
                } else {
                    "Registro exitoso. Por favor, verifica tu email para activar tu cuenta."
                };
                AuthResponse {
                    success: true,
                    message: message.to_string(),
                    user: Some(outcome.user),
                    session: outcome.session,
                }
            }
            Err(e) => failure("register", e, "Error inesperado durante el registro"),
        }
    }

    pub fn login(&self, email: &str, password: &Password) -> AuthResponse {
        match self.provider.sign_in_with_password(email.trim(), password) {
            Ok(session) => AuthResponse {
                success: true,
                message: "¡Inicio de sesión exitoso!".to_string(),
                user: Some(session.user.clone()),
                session: Some(session),
            },
            Err(e) => failure(
                "login",
                e,
                "Error inesperado durante el inicio de sesión",
            ),
        }
    }

    pub fn logout(&self) -> AuthResponse {
        match self.provider.sign_out() {
            Ok(()) => AuthResponse::ok("Sesión cerrada exitosamente"),
            Err(e) => failure("logout", e, "Error al cerrar sesión"),
        }
    }

    pub fn reset_password(&self, email: &str) -> AuthResponse {
        match self.provider.reset_password_for_email(email.trim()) {
            Ok(()) => AuthResponse::ok("Se ha enviado un enlace de recuperación a tu email"),
            Err(e) => failure(
                "reset_password",
                e,
                "Error al enviar email de recuperación",
            ),
        }
    }

    pub fn update_password(&self, new_password: Password) -> AuthResponse {
        let update = UserUpdate {
            password: Some(new_password),
            ..Default::default()
        };
        match self.provider.update_user(update) {
            Ok(user) => AuthResponse {
                user: Some(user),
                ..AuthResponse::ok("Contraseña actualizada exitosamente")
            },
            Err(e) => failure("update_password", e, "Error al actualizar contraseña"),
        }
    }

    pub fn update_profile(&self, name: Option<String>, email: Option<String>) -> AuthResponse {
        let update = UserUpdate {
            email,
            name,
            ..Default::default()
        };
        match self.provider.update_user(update) {
            Ok(user) => AuthResponse {
                user: Some(user),
                ..AuthResponse::ok("Perfil actualizado exitosamente")
            },
            Err(e) => failure("update_profile", e, "Error al actualizar perfil"),
        }
    }

    /// Ask the provider for the live session (refreshing it if needed)
    pub fn current_session(&self) -> LaplataResult<Option<Session>> {
        self.provider.get_session()
    }

    pub fn current_user(&self) -> LaplataResult<Option<User>> {
        Ok(self.current_session()?.map(|session| session.user))
    }

    /// Synchronous check against the mirrored session
    pub fn is_authenticated(&self) -> bool {
        self.session.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalAuth;

    fn pw(s: &str) -> Password {
        Password::new(s.to_string())
    }

    fn service() -> AuthService {
        AuthService::new(Arc::new(LocalAuth::in_memory()))
    }

    fn register(service: &AuthService, email: &str) -> AuthResponse {
        service.register(RegisterData {
            email: email.into(),
            password: pw("secret1"),
            name: "Ana".into(),
        })
    }

    #[test]
    fn test_translate_error() {
        assert_eq!(
            translate_error("Invalid login credentials"),
            "Credenciales de inicio de sesión inválidas"
        );
        assert_eq!(translate_error("Something odd"), "Something odd");
        assert_eq!(translate_error(""), "Error desconocido");
    }

    #[test]
    fn test_register_then_duplicate() {
        let service = service();
        let first = register(&service, "ana@example.com");
        assert!(first.success);
        assert_eq!(first.message, "Registro exitoso. ¡Bienvenido!");
        assert!(service.is_authenticated());

        let second = register(&service, "ana@example.com");
        assert!(!second.success);
        assert_eq!(second.message, "El usuario ya está registrado");
    }

    #[test]
    fn test_login_logout_track_session() {
        let service = service();
        register(&service, "ana@example.com");
        assert!(service.logout().success);
        assert!(!service.is_authenticated());
        assert!(service.current_user().unwrap().is_none());

        let bad = service.login("ana@example.com", &pw("wrong12"));
        assert_eq!(bad.message, "Credenciales de inicio de sesión inválidas");

        let good = service.login("ana@example.com", &pw("secret1"));
        assert!(good.success);
        assert_eq!(good.message, "¡Inicio de sesión exitoso!");
        assert!(service.is_authenticated());
        assert_eq!(
            service.current_user().unwrap().unwrap().email,
            "ana@example.com"
        );
    }

    #[test]
    fn test_update_profile_and_password() {
        let service = service();
        register(&service, "ana@example.com");

        let profile = service.update_profile(Some("Ana María".into()), None);
        assert_eq!(profile.message, "Perfil actualizado exitosamente");
        assert_eq!(
            service.session().get().unwrap().user.name.as_deref(),
            Some("Ana María")
        );

        let short = service.update_password(pw("123"));
        assert_eq!(short.message, "La contraseña debe tener al menos 6 caracteres");

        let ok = service.update_password(pw("better1"));
        assert!(ok.success);
    }

    #[test]
    fn test_reset_password_messages() {
        let service = service();
        assert_eq!(
            service.reset_password("ana@example.com").message,
            "Se ha enviado un enlace de recuperación a tu email"
        );
        assert_eq!(
            service.reset_password("ana").message,
            "Formato de email inválido"
        );
    }
}
