//! Local auth provider
//!
//! Users live in `users.json` with argon2id password hashes; the live session
//! is saved to `session.json` so consecutive CLI invocations stay signed in.
//! Local accounts are confirmed on creation.

use std::path::PathBuf;
use std::sync::RwLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    is_valid_email, AuthEvent, AuthProvider, AuthState, Password, SessionState, SignUpOutcome,
    UserUpdate, MIN_PASSWORD_LEN,
};
use crate::backend::file_io::{read_json, write_json_atomic};
use crate::cache::Subscription;
use crate::error::{LaplataError, LaplataResult};
use crate::models::{Session, User, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UsersData {
    users: Vec<StoredUser>,
}

/// Auth backed by local files
pub struct LocalAuth {
    users_path: Option<PathBuf>,
    users: RwLock<Vec<StoredUser>>,
    session: SessionState,
}

impl LocalAuth {
    /// Auth that keeps everything in memory
    pub fn in_memory() -> Self {
        Self {
            users_path: None,
            users: RwLock::new(Vec::new()),
            session: SessionState::in_memory(),
        }
    }

    /// Open the user and session files
    pub fn open(users_path: PathBuf, session_path: PathBuf) -> LaplataResult<Self> {
        let data: UsersData = read_json(&users_path)?;
        Ok(Self {
            users_path: Some(users_path),
            users: RwLock::new(data.users),
            session: SessionState::open(Some(session_path))?,
        })
    }

    fn save_users(&self, users: &[StoredUser]) -> LaplataResult<()> {
        if let Some(path) = &self.users_path {
            let data = UsersData {
                users: users.to_vec(),
            };
            write_json_atomic(path, &data)?;
        }
        Ok(())
    }

    fn new_session(user: User) -> Session {
        Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: None,
            expires_at: None,
            user,
        }
    }
}

fn hash_password(password: &str) -> LaplataResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LaplataError::Storage(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn check_password(password: &str) -> LaplataResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LaplataError::auth(
            "Password should be at least 6 characters",
        ));
    }
    Ok(())
}

fn check_email(email: &str) -> LaplataResult<()> {
    if !is_valid_email(email) {
        return Err(LaplataError::auth(
            "Unable to validate email address: invalid format",
        ));
    }
    Ok(())
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthProvider for LocalAuth {
    fn get_session(&self) -> LaplataResult<Option<Session>> {
        Ok(self.session.current())
    }

    fn on_auth_state_change(
        &self,
        listener: Box<dyn Fn(&AuthState) + Send + Sync>,
    ) -> Subscription {
        self.session.subscribe(listener)
    }

    fn sign_up(&self, email: &str, password: &Password, name: &str) -> LaplataResult<SignUpOutcome> {
        let email = normalize(email);
        check_email(&email)?;
        check_password(password)?;

        let mut users = self
            .users
            .write()
            .map_err(|e| LaplataError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        if users.iter().any(|u| u.user.email == email) {
            return Err(LaplataError::auth("User already registered"));
        }

        let now = Utc::now();
        let name = name.trim();
        let user = User {
            id: UserId::new(),
            email,
            name: (!name.is_empty()).then(|| name.to_string()),
            email_confirmed_at: Some(now),
            created_at: now,
        };
        users.push(StoredUser {
            user: user.clone(),
            password_hash: hash_password(password)?,
        });
        self.save_users(&users)?;
        drop(users);

        info!(user = %user.id, "registered local user");
        let session = Self::new_session(user.clone());
        self.session.set(AuthEvent::SignedIn, Some(session.clone()))?;
        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    fn sign_in_with_password(&self, email: &str, password: &Password) -> LaplataResult<Session> {
        let email = normalize(email);
        let user = {
            let users = self
                .users
                .read()
                .map_err(|e| LaplataError::Storage(format!("Failed to acquire read lock: {}", e)))?;
            users
                .iter()
                .find(|u| u.user.email == email && verify_password(password, &u.password_hash))
                .map(|u| u.user.clone())
        };
        let user = user.ok_or_else(|| LaplataError::auth("Invalid login credentials"))?;

        debug!(user = %user.id, "signed in");
        let session = Self::new_session(user);
        self.session.set(AuthEvent::SignedIn, Some(session.clone()))?;
        Ok(session)
    }

    fn sign_out(&self) -> LaplataResult<()> {
        self.session.set(AuthEvent::SignedOut, None)
    }

    fn reset_password_for_email(&self, email: &str) -> LaplataResult<()> {
        check_email(&normalize(email))?;
        // Nothing can be mailed locally; the response is the same whether or
        // not the address is registered.
        info!("password recovery requested for a local account");
        Ok(())
    }

    fn update_user(&self, update: UserUpdate) -> LaplataResult<User> {
        let mut session = self.session.require()?;

        if let Some(email) = &update.email {
            check_email(&normalize(email))?;
        }
        if let Some(password) = &update.password {
            check_password(password)?;
        }

        let mut users = self
            .users
            .write()
            .map_err(|e| LaplataError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if let Some(email) = &update.email {
            let email = normalize(email);
            if users
                .iter()
                .any(|u| u.user.email == email && u.user.id != session.user.id)
            {
                return Err(LaplataError::auth(
                    "A user with this email address has already been registered",
                ));
            }
        }

        let stored = users
            .iter_mut()
            .find(|u| u.user.id == session.user.id)
            .ok_or_else(|| LaplataError::auth("User not found"))?;

        if let Some(email) = update.email {
            stored.user.email = normalize(&email);
        }
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            stored.user.name = (!name.is_empty()).then_some(name);
        }
        if let Some(password) = &update.password {
            stored.password_hash = hash_password(password)?;
        }
        let user = stored.user.clone();
        self.save_users(&users)?;
        drop(users);

        session.user = user.clone();
        self.session.set(AuthEvent::UserUpdated, Some(session))?;
        Ok(user)
    }
}
