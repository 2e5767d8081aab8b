//! Hosted GoTrue auth provider

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::{
    AuthEvent, AuthProvider, AuthState, Password, SessionState, SignUpOutcome, UserUpdate,
};
use crate::backend::rest::http_client;
use crate::cache::Subscription;
use crate::error::{LaplataError, LaplataResult};
use crate::models::{Session, User, UserId};

/// User object as GoTrue returns it
#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

impl From<RemoteUser> for User {
    fn from(remote: RemoteUser) -> Self {
        let name = ["name", "display_name"]
            .iter()
            .find_map(|key| remote.user_metadata.get(*key).and_then(Value::as_str))
            .map(String::from);
        User {
            id: remote.id,
            email: remote.email.unwrap_or_default(),
            name,
            email_confirmed_at: remote.email_confirmed_at,
            created_at: remote.created_at,
        }
    }
}

/// Token grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: RemoteUser,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            user: token.user.into(),
        }
    }
}

/// Sign-up answers with a session when confirmation is off, else a bare user
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(RemoteUser),
}

/// GoTrue error body; the field carrying the text varies by endpoint
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Auth against `{url}/auth/v1`
pub struct RestAuth {
    base_url: String,
    anon_key: String,
    client: Client,
    session: SessionState,
}

impl RestAuth {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        session_path: Option<PathBuf>,
    ) -> LaplataResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(LaplataError::Config("remote auth url is not set".into()));
        }
        Ok(Self {
            base_url,
            anon_key: anon_key.into(),
            client: http_client()?,
            session: SessionState::open(session_path)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn post(&self, path: &str, body: &Value, token: Option<&str>) -> LaplataResult<Response> {
        let request = self
            .client
            .post(self.url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
            .json(body);
        check(request.send()?)
    }

    fn refresh(&self, refresh_token: &str) -> LaplataResult<Session> {
        let response = self.post(
            "token?grant_type=refresh_token",
            &json!({ "refresh_token": refresh_token }),
            None,
        )?;
        Ok(response.json::<TokenResponse>()?.into())
    }
}

fn check(response: Response) -> LaplataResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .msg
        .or(body.message)
        .or(body.error_description)
        .unwrap_or(text);
    Err(LaplataError::auth(message))
}

impl AuthProvider for RestAuth {
    fn get_session(&self) -> LaplataResult<Option<Session>> {
        let Some(session) = self.session.current() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        match session.refresh_token.as_deref() {
            Some(refresh_token) => match self.refresh(refresh_token) {
                Ok(fresh) => {
                    debug!("refreshed expired session");
                    self.session.set(AuthEvent::SignedIn, Some(fresh.clone()))?;
                    Ok(Some(fresh))
                }
                Err(e) => {
                    warn!(error = %e, "session refresh failed");
                    self.session.set(AuthEvent::SignedOut, None)?;
                    Ok(None)
                }
            },
            None => {
                self.session.set(AuthEvent::SignedOut, None)?;
                Ok(None)
            }
        }
    }

    fn on_auth_state_change(
        &self,
        listener: Box<dyn Fn(&AuthState) + Send + Sync>,
    ) -> Subscription {
        self.session.subscribe(listener)
    }

    fn sign_up(&self, email: &str, password: &Password, name: &str) -> LaplataResult<SignUpOutcome> {
        let body = json!({
            "email": email,
            "password": password.as_str(),
            "data": { "name": name, "display_name": name },
        });
        let response = self.post("signup", &body, None)?;

        match response.json::<SignUpResponse>()? {
            SignUpResponse::Session(token) => {
                let session: Session = token.into();
                self.session.set(AuthEvent::SignedIn, Some(session.clone()))?;
                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::User(user) => Ok(SignUpOutcome {
                user: user.into(),
                session: None,
            }),
        }
    }

    fn sign_in_with_password(&self, email: &str, password: &Password) -> LaplataResult<Session> {
        let body = json!({ "email": email, "password": password.as_str() });
        let response = self.post("token?grant_type=password", &body, None)?;
        let session: Session = response.json::<TokenResponse>()?.into();
        self.session.set(AuthEvent::SignedIn, Some(session.clone()))?;
        Ok(session)
    }

    fn sign_out(&self) -> LaplataResult<()> {
        if let Some(session) = self.session.current() {
            // A rejected token is already signed out on the server
            if let Err(e) = self.post("logout", &json!({}), Some(&session.access_token)) {
                warn!(error = %e, "remote logout failed");
            }
        }
        self.session.set(AuthEvent::SignedOut, None)
    }

    fn reset_password_for_email(&self, email: &str) -> LaplataResult<()> {
        self.post("recover", &json!({ "email": email }), None)?;
        Ok(())
    }

    fn update_user(&self, update: UserUpdate) -> LaplataResult<User> {
        let mut session = self.session.require()?;

        let mut body = Map::new();
        if let Some(email) = &update.email {
            body.insert("email".into(), json!(email));
        }
        if let Some(password) = &update.password {
            body.insert("password".into(), json!(password.as_str()));
        }
        if let Some(name) = &update.name {
            body.insert("data".into(), json!({ "name": name, "display_name": name }));
        }

        let response = self
            .client
            .put(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .json(&Value::Object(body))
            .send()?;
        let user: User = check(response)?.json::<RemoteUser>()?.into();

        session.user = user.clone();
        self.session.set(AuthEvent::UserUpdated, Some(session))?;
        Ok(user)
    }
}
