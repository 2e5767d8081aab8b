//! Auth capability
//!
//! An [`AuthProvider`] owns sign-up, sign-in, sign-out, password recovery and
//! profile updates, and reports session changes to listeners. Two providers
//! exist: [`LocalAuth`] keeps argon2 password hashes in a JSON file, and
//! [`RestAuth`] talks to a hosted GoTrue endpoint.
//!
//! Providers report failures as [`LaplataError::Auth`] carrying the provider's
//! raw message; translation to user-facing text happens in the auth service.
//!
//! [`LaplataError::Auth`]: crate::error::LaplataError::Auth

pub mod local;
pub mod rest;

pub use local::LocalAuth;
pub use rest::RestAuth;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, RwLock};

use regex::Regex;
use zeroize::Zeroizing;

use crate::backend::file_io::{read_json, remove_if_exists, write_json_atomic};
use crate::cache::{Observable, Subscription};
use crate::error::{LaplataError, LaplataResult};
use crate::models::{Session, User};

/// A password held in memory that is wiped on drop
pub type Password = Zeroizing<String>;

/// Minimum password length accepted by the providers
pub const MIN_PASSWORD_LEN: usize = 6;

/// Kind of session change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    UserUpdated,
    PasswordRecovery,
}

/// What listeners receive on every change
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// Result of a sign-up; `session` is `None` while the e-mail awaits confirmation
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: User,
    pub session: Option<Session>,
}

/// Fields to change on the signed-in user
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<Password>,
    pub name: Option<String>,
}

/// The auth capability
pub trait AuthProvider: Send + Sync {
    /// The current session, if any
    fn get_session(&self) -> LaplataResult<Option<Session>>;

    /// Register a listener for session changes
    ///
    /// The listener is called at once with [`AuthEvent::InitialSession`] and
    /// the current session.
    fn on_auth_state_change(
        &self,
        listener: Box<dyn Fn(&AuthState) + Send + Sync>,
    ) -> Subscription;

    fn sign_up(&self, email: &str, password: &Password, name: &str) -> LaplataResult<SignUpOutcome>;

    fn sign_in_with_password(&self, email: &str, password: &Password) -> LaplataResult<Session>;

    fn sign_out(&self) -> LaplataResult<()>;

    fn reset_password_for_email(&self, email: &str) -> LaplataResult<()>;

    fn update_user(&self, update: UserUpdate) -> LaplataResult<User>;
}

/// E-mail shape accepted by forms and the local provider
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// Session bookkeeping shared by the providers
///
/// Holds the live session, persists it to `session.json` when a path is given,
/// and fans changes out to listeners.
pub(crate) struct SessionState {
    path: Option<PathBuf>,
    current: RwLock<Option<Session>>,
    changes: Observable<AuthState>,
}

impl SessionState {
    pub(crate) fn in_memory() -> Self {
        Self::with_saved(None, None)
    }

    /// Load any saved session from `path`
    pub(crate) fn open(path: Option<PathBuf>) -> LaplataResult<Self> {
        let saved: Option<Session> = match &path {
            Some(path) => read_json(path)?,
            None => None,
        };
        Ok(Self::with_saved(path, saved))
    }

    fn with_saved(path: Option<PathBuf>, saved: Option<Session>) -> Self {
        Self {
            path,
            changes: Observable::new(AuthState {
                event: AuthEvent::InitialSession,
                session: saved.clone(),
            }),
            current: RwLock::new(saved),
        }
    }

    pub(crate) fn current(&self) -> Option<Session> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the session, persist it, and notify listeners
    pub(crate) fn set(&self, event: AuthEvent, session: Option<Session>) -> LaplataResult<()> {
        {
            let mut guard = self
                .current
                .write()
                .map_err(|e| LaplataError::Storage(format!("Failed to acquire write lock: {}", e)))?;
            *guard = session.clone();
        }
        if let Some(path) = &self.path {
            match &session {
                Some(session) => write_json_atomic(path, session)?,
                None => remove_if_exists(path)?,
            }
        }
        self.changes.replace(AuthState { event, session });
        Ok(())
    }

    pub(crate) fn subscribe(&self, listener: Box<dyn Fn(&AuthState) + Send + Sync>) -> Subscription {
        let first = AtomicBool::new(true);
        self.changes.subscribe(move |state| {
            if first.swap(false, Ordering::SeqCst) {
                listener(&AuthState {
                    event: AuthEvent::InitialSession,
                    session: state.session.clone(),
                });
            } else {
                listener(state);
            }
        })
    }

    /// Session or the provider's "missing session" error
    pub(crate) fn require(&self) -> LaplataResult<Session> {
        self.current()
            .ok_or_else(|| LaplataError::auth("Auth session missing!"))
    }
}
