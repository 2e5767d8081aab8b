//! Wallet service
//!
//! CRUD for wallets plus the balance adjustments the income and expense
//! services make. Every successful mutation re-reads the owner's wallets and
//! republishes them through [`WalletService::wallets`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::ServiceContext;
use crate::audit::{AuditEntry, EntityType};
use crate::backend::{from_row, from_rows, to_row, Filter, Query, Row, Table};
use crate::cache::Observable;
use crate::error::{LaplataError, LaplataResult};
use crate::models::wallet::WalletValidationError;
use crate::models::{Money, Wallet, WalletId};

/// Changes to apply to a wallet; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct WalletUpdate {
    pub name: Option<String>,
    pub balance: Option<Money>,
}

/// Service for wallet management
pub struct WalletService {
    ctx: Arc<ServiceContext>,
    wallets: Observable<Vec<Wallet>>,
}

impl WalletService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            wallets: Observable::default(),
        }
    }

    /// Latest wallet collection, newest first
    pub fn wallets(&self) -> &Observable<Vec<Wallet>> {
        &self.wallets
    }

    /// Owner's wallets without touching the cache
    pub(crate) fn fetch(&self) -> LaplataResult<Vec<Wallet>> {
        let owner = self.ctx.owner()?;
        let query = Query::new()
            .filter(ServiceContext::owner_filter(owner))
            .order_by("created_at", false);
        from_rows(self.ctx.backend().select(Table::Wallets, &query)?)
    }

    /// List wallets, newest first, and republish them
    pub fn list(&self) -> LaplataResult<Vec<Wallet>> {
        let wallets = self.fetch()?;
        self.wallets.replace(wallets.clone());
        Ok(wallets)
    }

    /// Get a wallet by ID
    pub fn get(&self, id: WalletId) -> LaplataResult<Wallet> {
        let owner = self.ctx.owner()?;
        let query = Query::new()
            .eq("id", id.to_key())
            .filter(ServiceContext::owner_filter(owner));
        let row = self
            .ctx
            .backend()
            .select(Table::Wallets, &query)?
            .into_iter()
            .next()
            .ok_or_else(|| LaplataError::wallet_not_found(id.to_string()))?;
        from_row(row)
    }

    /// Find a wallet by name (case-insensitive) or id
    pub fn find(&self, identifier: &str) -> LaplataResult<Option<Wallet>> {
        let wallets = self.fetch()?;
        let by_name = wallets
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(identifier.trim()));
        if let Some(wallet) = by_name {
            return Ok(Some(wallet.clone()));
        }
        Ok(wallets
            .into_iter()
            .find(|w| w.id.matches(identifier)))
    }

    /// Create a wallet with an initial balance (default 0)
    pub fn create(&self, name: &str, balance: Option<Money>) -> LaplataResult<Wallet> {
        let owner = self.ctx.owner()?;
        let balance = balance.unwrap_or_default();
        if balance.is_negative() {
            return Err(LaplataError::Validation(
                WalletValidationError::NegativeBalance.to_string(),
            ));
        }

        let wallet = Wallet::new(owner, name.trim(), balance);
        wallet
            .validate()
            .map_err(|e| LaplataError::Validation(e.to_string()))?;

        let stored = self
            .ctx
            .backend()
            .insert(Table::Wallets, vec![to_row(&wallet)?])?
            .into_iter()
            .next()
            .ok_or_else(|| LaplataError::backend("insert returned no wallet"))?;
        let wallet: Wallet = from_row(stored)?;
        debug!(wallet = %wallet.id, "created wallet");

        self.ctx.record(
            owner,
            AuditEntry::create(
                EntityType::Wallet,
                wallet.id.to_key(),
                Some(wallet.name.clone()),
                &wallet,
            ),
        );
        self.refresh();
        Ok(wallet)
    }

    /// Rename a wallet and/or overwrite its balance
    pub fn update(&self, id: WalletId, update: WalletUpdate) -> LaplataResult<Wallet> {
        let owner = self.ctx.owner()?;
        let before = self.get(id)?;

        let mut after = before.clone();
        let mut patch = Row::new();
        if let Some(name) = update.name {
            after.name = name.trim().to_string();
            patch.insert("name".into(), Value::String(after.name.clone()));
        }
        if let Some(balance) = update.balance {
            if balance.is_negative() {
                return Err(LaplataError::Validation(
                    WalletValidationError::NegativeBalance.to_string(),
                ));
            }
            after.balance = balance;
            patch.insert("balance".into(), serde_json::to_value(balance)?);
        }
        after
            .validate()
            .map_err(|e| LaplataError::Validation(e.to_string()))?;

        if patch.is_empty() {
            return Ok(before);
        }
        after.updated_at = Utc::now();
        patch.insert("updated_at".into(), serde_json::to_value(after.updated_at)?);

        let filters = ServiceContext::row_filters(owner, id.to_key());
        let row = self
            .ctx
            .backend()
            .update(Table::Wallets, &filters, patch)?
            .into_iter()
            .next()
            .ok_or_else(|| LaplataError::wallet_not_found(id.to_string()))?;
        let wallet: Wallet = from_row(row)?;

        self.ctx.record(
            owner,
            AuditEntry::update(
                EntityType::Wallet,
                wallet.id.to_key(),
                Some(wallet.name.clone()),
                &before,
                &wallet,
            ),
        );
        self.refresh();
        Ok(wallet)
    }

    /// Delete a wallet together with the incomes and expenses posted to it
    pub fn delete(&self, id: WalletId) -> LaplataResult<Wallet> {
        let owner = self.ctx.owner()?;
        let wallet = self.get(id)?;

        let postings = [
            Filter::eq("wallet_id", id.to_key()),
            ServiceContext::owner_filter(owner),
        ];
        let mut removed = Vec::new();
        for table in [Table::Incomes, Table::Expenses] {
            match self.ctx.backend().delete(table, &postings) {
                Ok(rows) => {
                    if !rows.is_empty() {
                        debug!(wallet = %id, %table, count = rows.len(), "removed postings");
                    }
                    removed.push((table, rows));
                }
                Err(e) => {
                    self.restore_postings(id, removed);
                    return Err(e);
                }
            }
        }

        let filters = ServiceContext::row_filters(owner, id.to_key());
        let deleted = match self.ctx.backend().delete(Table::Wallets, &filters) {
            Ok(deleted) => deleted,
            Err(e) => {
                self.restore_postings(id, removed);
                return Err(e);
            }
        };
        if deleted.is_empty() {
            self.restore_postings(id, removed);
            return Err(LaplataError::wallet_not_found(id.to_string()));
        }

        self.ctx.record(
            owner,
            AuditEntry::delete(
                EntityType::Wallet,
                wallet.id.to_key(),
                Some(wallet.name.clone()),
                &wallet,
            ),
        );
        self.refresh();
        Ok(wallet)
    }

    /// Put back postings removed by a wallet delete that did not go through
    fn restore_postings(&self, id: WalletId, removed: Vec<(Table, Vec<Row>)>) {
        for (table, rows) in removed.into_iter().filter(|(_, rows)| !rows.is_empty()) {
            if let Err(e) = self.ctx.backend().insert(table, rows) {
                error!(
                    wallet = %id,
                    %table,
                    error = %e,
                    "failed to restore postings, wallet delete left them removed"
                );
            }
        }
    }

    /// Sum of all wallet balances
    pub fn total_balance(&self) -> LaplataResult<Money> {
        Ok(self.fetch()?.iter().map(|w| w.balance).sum())
    }

    /// Atomically add `delta` to a wallet's balance, returning the new balance
    pub(crate) fn adjust_balance(&self, id: WalletId, delta: Money) -> LaplataResult<Money> {
        let owner = self.ctx.owner()?;
        let filters = ServiceContext::row_filters(owner, id.to_key());
        let row = self
            .ctx
            .backend()
            .increment(Table::Wallets, &filters, "balance", delta)?;
        let wallet: Wallet = from_row(row)?;
        debug!(wallet = %id, %delta, balance = %wallet.balance, "adjusted balance");
        self.refresh();
        Ok(wallet.balance)
    }

    /// Overwrite a wallet's balance
    pub(crate) fn set_balance(&self, id: WalletId, balance: Money) -> LaplataResult<Wallet> {
        self.update(
            id,
            WalletUpdate {
                balance: Some(balance),
                ..Default::default()
            },
        )
    }

    /// Republish the collection; a failed re-read keeps the previous value
    fn refresh(&self) {
        if let Err(e) = self.list() {
            warn!(error = %e, "failed to refresh wallets");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, LocalBackend};
    use crate::services::testing::{anonymous_context, context, context_with};
    use std::sync::Mutex;

    #[test]
    fn test_create_and_list_newest_first() {
        let service = WalletService::new(context());
        service.create("Main", Some(Money::from_units(100))).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        service.create("Savings", None).unwrap();

        let wallets = service.list().unwrap();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[0].name, "Savings");
        assert_eq!(wallets[0].balance, Money::zero());
        assert_eq!(wallets[1].balance, Money::from_units(100));
    }

    #[test]
    fn test_requires_session() {
        let service = WalletService::new(anonymous_context());
        let err = service.create("Main", None).unwrap_err();
        assert!(err.is_not_authenticated());
    }

    #[test]
    fn test_validation() {
        let service = WalletService::new(context());
        assert!(service.create("M", None).unwrap_err().is_validation());
        assert!(service
            .create("Main", Some(Money::from_units(-1)))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_cache_follows_mutations() {
        let service = WalletService::new(context());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = service
            .wallets()
            .subscribe(move |w: &Vec<Wallet>| sink.lock().unwrap().push(w.len()));

        let wallet = service.create("Main", None).unwrap();
        service.create("Other", None).unwrap();
        service.delete(wallet.id).unwrap();
        drop(sub);
        service.create("Late", None).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 1]);
        assert_eq!(service.wallets().get().len(), 2);
    }

    #[test]
    fn test_update_and_total() {
        let service = WalletService::new(context());
        let main = service.create("Main", Some(Money::from_units(100))).unwrap();
        service.create("Cash", Some(Money::from_cents(2550))).unwrap();

        let renamed = service
            .update(
                main.id,
                WalletUpdate {
                    name: Some("Principal".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Principal");
        assert_eq!(renamed.balance, Money::from_units(100));
        assert_eq!(service.total_balance().unwrap(), Money::from_cents(12550));
    }

    #[test]
    fn test_adjust_and_set_balance() {
        let service = WalletService::new(context());
        let main = service.create("Main", Some(Money::from_units(100))).unwrap();

        let balance = service
            .adjust_balance(main.id, Money::from_units(-30))
            .unwrap();
        assert_eq!(balance, Money::from_units(70));

        let wallet = service.set_balance(main.id, Money::from_units(5)).unwrap();
        assert_eq!(wallet.balance, Money::from_units(5));
    }

    #[test]
    fn test_find_by_name_or_id() {
        let service = WalletService::new(context());
        let main = service.create("Main", None).unwrap();

        assert_eq!(service.find("main").unwrap().unwrap().id, main.id);
        assert_eq!(
            service.find(&main.id.to_string()).unwrap().unwrap().id,
            main.id
        );
        assert!(service.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_other_owners_wallets_are_invisible() {
        let backend: Arc<dyn Backend> = Arc::new(LocalBackend::in_memory());
        let ana = WalletService::new(context_with(Arc::clone(&backend)));
        let bob = WalletService::new(context_with(backend));

        let wallet = ana.create("Main", None).unwrap();
        assert!(bob.list().unwrap().is_empty());
        assert!(bob.get(wallet.id).unwrap_err().is_not_found());
    }
}
