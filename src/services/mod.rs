//! Service layer for LaPlata
//!
//! Services sit between the UI layer and the backend: they scope every read
//! and write to the signed-in owner, validate input, keep wallet balances in
//! step with transactions, publish their collections through observable
//! caches, and record mutations in the audit log.

pub mod auth;
pub mod category;
pub mod dashboard;
pub mod transaction;
pub mod wallet;

pub use auth::{AuthResponse, AuthService, RegisterData};
pub use category::{CategoryService, CategoryUpdate};
pub use dashboard::{DashboardOptions, DashboardService};
pub use transaction::{NewTransaction, TransactionService, TransactionUpdate};
pub use wallet::{WalletService, WalletUpdate};

use std::sync::Arc;

use tracing::error;

use crate::audit::{AuditEntry, AuditLogger};
use crate::backend::{Backend, Filter};
use crate::cache::Observable;
use crate::error::{LaplataError, LaplataResult};
use crate::models::{Session, UserId};

/// What every entity service shares
pub struct ServiceContext {
    backend: Arc<dyn Backend>,
    session: Observable<Option<Session>>,
    audit: Arc<AuditLogger>,
}

impl ServiceContext {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Observable<Option<Session>>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            backend,
            session,
            audit,
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Id of the signed-in user
    pub fn owner(&self) -> LaplataResult<UserId> {
        self.session
            .get()
            .map(|session| session.user.id)
            .ok_or(LaplataError::NotAuthenticated)
    }

    /// Filter scoping a query to `owner`
    pub fn owner_filter(owner: UserId) -> Filter {
        Filter::eq("owner_id", owner.to_key())
    }

    /// Filters selecting one owned row
    pub fn row_filters(owner: UserId, id: String) -> [Filter; 2] {
        [Filter::eq("id", id), Self::owner_filter(owner)]
    }

    /// Append to the audit log; the mutation already happened, so a failure
    /// here is logged rather than returned
    pub fn record(&self, owner: UserId, entry: AuditEntry) {
        if let Err(e) = self.audit.log(&entry.owned_by(owner.to_key())) {
            error!(error = %e, "failed to write audit entry");
        }
    }

    pub fn audit_log(&self) -> &AuditLogger {
        &self.audit
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Service fixtures over an in-memory or fault-injecting backend

    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::backend::LocalBackend;
    use crate::models::User;

    pub fn session_for(owner: UserId) -> Session {
        Session {
            access_token: "test".into(),
            refresh_token: None,
            expires_at: None,
            user: User {
                id: owner,
                email: "ana@example.com".into(),
                name: Some("Ana".into()),
                email_confirmed_at: Some(Utc::now()),
                created_at: Utc::now(),
            },
        }
    }

    /// Context signed in as a fresh user
    pub fn context_with(backend: Arc<dyn Backend>) -> Arc<ServiceContext> {
        let session = Observable::new(Some(session_for(UserId::new())));
        Arc::new(ServiceContext::new(
            backend,
            session,
            Arc::new(AuditLogger::in_memory()),
        ))
    }

    pub fn context() -> Arc<ServiceContext> {
        context_with(Arc::new(LocalBackend::in_memory()))
    }

    /// Context with nobody signed in
    pub fn anonymous_context() -> Arc<ServiceContext> {
        Arc::new(ServiceContext::new(
            Arc::new(LocalBackend::in_memory()),
            Observable::new(None),
            Arc::new(AuditLogger::in_memory()),
        ))
    }
}
