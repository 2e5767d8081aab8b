//! Application wiring
//!
//! Builds the backend and auth provider the settings ask for and the services
//! on top of them. All services share one [`ServiceContext`], whose session is
//! the auth service's mirrored session.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::audit::AuditLogger;
use crate::auth::{AuthProvider, LocalAuth, RestAuth};
use crate::backend::{Backend, LocalBackend, RestBackend};
use crate::cache::Subscription;
use crate::config::{BackendKind, LaplataPaths, Settings};
use crate::error::LaplataResult;
use crate::models::TransactionKind;
use crate::services::{
    AuthService, CategoryService, DashboardOptions, DashboardService, ServiceContext,
    TransactionService, WalletService,
};

pub struct App {
    pub auth: AuthService,
    pub wallets: Arc<WalletService>,
    pub categories: Arc<CategoryService>,
    pub incomes: Arc<TransactionService>,
    pub expenses: Arc<TransactionService>,
    pub dashboard: DashboardService,
    ctx: Arc<ServiceContext>,
    /// Keeps the remote backend's bearer token in step with the session
    _token_sync: Option<Subscription>,
}

impl App {
    /// Open the configured backend under `paths`
    pub fn open(paths: &LaplataPaths, settings: &Settings) -> LaplataResult<Self> {
        paths.ensure_directories()?;
        let audit = Arc::new(AuditLogger::new(paths.audit_log()));
        let options = settings.dashboard_options();

        match settings.backend {
            BackendKind::Local => {
                let backend = Arc::new(LocalBackend::open(paths.tables_dir())?);
                let auth = Arc::new(LocalAuth::open(paths.users_file(), paths.session_file())?);
                debug!(dir = %paths.base_dir().display(), "opened local data");
                Ok(Self::assemble(backend, auth, audit, options, None))
            }
            BackendKind::Remote => {
                let (url, key) = settings.remote_credentials()?;
                let backend = Arc::new(RestBackend::new(url, key)?);
                let auth: Arc<dyn AuthProvider> =
                    Arc::new(RestAuth::new(url, key, Some(paths.session_file()))?);

                // Refresh a stale saved session before anything reads it
                if let Err(e) = auth.get_session() {
                    warn!(error = %e, "could not restore session");
                }

                let rest = Arc::clone(&backend);
                let auth_service = AuthService::new(Arc::clone(&auth));
                let sync = auth_service.session().subscribe(move |session| {
                    rest.set_access_token(session.as_ref().map(|s| s.access_token.clone()));
                });
                debug!(%url, "connected to remote backend");
                Ok(Self::with_auth(backend, auth_service, audit, options, Some(sync)))
            }
        }
    }

    /// Everything in memory, for tests and demos
    pub fn in_memory() -> Self {
        Self::assemble(
            Arc::new(LocalBackend::in_memory()),
            Arc::new(LocalAuth::in_memory()),
            Arc::new(AuditLogger::in_memory()),
            DashboardOptions::default(),
            None,
        )
    }

    fn assemble(
        backend: Arc<dyn Backend>,
        auth: Arc<dyn AuthProvider>,
        audit: Arc<AuditLogger>,
        options: DashboardOptions,
        token_sync: Option<Subscription>,
    ) -> Self {
        Self::with_auth(backend, AuthService::new(auth), audit, options, token_sync)
    }

    fn with_auth(
        backend: Arc<dyn Backend>,
        auth: AuthService,
        audit: Arc<AuditLogger>,
        options: DashboardOptions,
        token_sync: Option<Subscription>,
    ) -> Self {
        let ctx = Arc::new(ServiceContext::new(backend, auth.session().clone(), audit));
        let wallets = Arc::new(WalletService::new(Arc::clone(&ctx)));
        let categories = Arc::new(CategoryService::new(Arc::clone(&ctx)));
        let transactions = |kind| {
            Arc::new(TransactionService::new(
                kind,
                Arc::clone(&ctx),
                Arc::clone(&wallets),
                Arc::clone(&categories),
            ))
        };
        let incomes = transactions(TransactionKind::Income);
        let expenses = transactions(TransactionKind::Expense);
        let dashboard = DashboardService::new(
            Arc::clone(&ctx),
            Arc::clone(&wallets),
            Arc::clone(&categories),
            Arc::clone(&incomes),
            Arc::clone(&expenses),
            options,
        );

        Self {
            auth,
            wallets,
            categories,
            incomes,
            expenses,
            dashboard,
            ctx,
            _token_sync: token_sync,
        }
    }

    /// The income or expense service
    pub fn transactions(&self, kind: TransactionKind) -> &TransactionService {
        match kind {
            TransactionKind::Income => &self.incomes,
            TransactionKind::Expense => &self.expenses,
        }
    }

    pub fn audit_log(&self) -> &AuditLogger {
        self.ctx.audit_log()
    }
}
