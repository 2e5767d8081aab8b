//! Authenticated user and session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// An authenticated user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,

    /// Display name from the user's profile metadata
    #[serde(default)]
    pub name: Option<String>,

    /// Set once the user has confirmed their e-mail address
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to greet the user with: profile name, else e-mail local part
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name;
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local,
            _ => "Usuario",
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// A live session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    pub user: User,
}

impl Session {
    /// Whether the session has passed its expiry time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, name: Option<&str>) -> User {
        User {
            id: UserId::new(),
            email: email.into(),
            name: name.map(String::from),
            email_confirmed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(user("ana@example.com", Some("Ana")).display_name(), "Ana");
        assert_eq!(user("ana@example.com", None).display_name(), "ana");
        assert_eq!(user("", Some(" ")).display_name(), "Usuario");
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let mut session = Session {
            access_token: "t".into(),
            refresh_token: None,
            expires_at: None,
            user: user("a@b.co", None),
        };
        assert!(!session.is_expired(now));
        session.expires_at = Some(now - chrono::Duration::seconds(1));
        assert!(session.is_expired(now));
    }
}
