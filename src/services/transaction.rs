//! Income and expense service
//!
//! One [`TransactionService`] per [`TransactionKind`]. Besides CRUD on its
//! table, the service keeps the posting wallet's balance in step:
//!
//! - create adds the signed amount to the wallet;
//! - update reverses the old adjustment and applies the new one, possibly on a
//!   different wallet;
//! - delete reverses the adjustment.
//!
//! Each balance change is one atomic backend increment. When an increment
//! fails after the row write already succeeded, the row write is undone so the
//! ledger and the balance stay consistent.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, warn};

use super::{CategoryService, ServiceContext, WalletService};
use crate::audit::{AuditEntry, EntityType};
use crate::backend::{from_row, from_rows, to_row, Filter, Query, Table};
use crate::cache::{Observable, Subscription};
use crate::error::{LaplataError, LaplataResult};
use crate::models::{
    CategoryId, CategoryTotal, Money, MonthPeriod, Transaction, TransactionId, TransactionKind,
    TransactionStats, TransactionView, Wallet, WalletId,
};
use crate::reports::{category_breakdown, month_total, percent_change};

/// Number of entries returned by [`TransactionService::recent`] by default
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Input for a new income or expense
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub category_id: Option<CategoryId>,
    pub amount: Money,
    pub description: Option<String>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// Changes to an income or expense; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub wallet_id: Option<WalletId>,
    /// `Some(None)` clears the category
    pub category_id: Option<Option<CategoryId>>,
    pub amount: Option<Money>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
}

/// Service for incomes or expenses
pub struct TransactionService {
    kind: TransactionKind,
    ctx: Arc<ServiceContext>,
    wallets: Arc<WalletService>,
    categories: Arc<CategoryService>,
    transactions: Observable<Vec<TransactionView>>,
    /// Drops cached entries whose wallet was deleted
    _wallet_sync: Subscription,
}

impl TransactionService {
    pub fn new(
        kind: TransactionKind,
        ctx: Arc<ServiceContext>,
        wallets: Arc<WalletService>,
        categories: Arc<CategoryService>,
    ) -> Self {
        let transactions: Observable<Vec<TransactionView>> = Observable::default();
        let cache = transactions.clone();
        let wallet_sync = wallets.wallets().subscribe(move |current: &Vec<Wallet>| {
            let cached = cache.get();
            let kept: Vec<TransactionView> = cached
                .iter()
                .filter(|v| current.iter().any(|w| w.id == v.transaction.wallet_id))
                .cloned()
                .collect();
            if kept.len() != cached.len() {
                cache.replace(kept);
            }
        });

        Self {
            kind,
            ctx,
            wallets,
            categories,
            transactions,
            _wallet_sync: wallet_sync,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Latest collection, newest first
    pub fn transactions(&self) -> &Observable<Vec<TransactionView>> {
        &self.transactions
    }

    fn table(&self) -> Table {
        Table::for_kind(self.kind)
    }

    fn not_found(&self, id: TransactionId) -> LaplataError {
        LaplataError::transaction_not_found(self.kind.entity_name(), id.to_string())
    }

    /// Select owned rows and join wallet and category names
    fn fetch_views(&self, query: Query) -> LaplataResult<Vec<TransactionView>> {
        let owner = self.ctx.owner()?;
        let query = query.filter(ServiceContext::owner_filter(owner));
        let transactions: Vec<Transaction> =
            from_rows(self.ctx.backend().select(self.table(), &query)?)?;
        if transactions.is_empty() {
            return Ok(Vec::new());
        }

        let wallet_names: HashMap<WalletId, String> = self
            .names_or_empty("wallets", self.wallets.fetch())
            .into_iter()
            .map(|w| (w.id, w.name))
            .collect();
        let category_names: HashMap<CategoryId, String> = self
            .names_or_empty("categories", self.categories.fetch(None))
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(transactions
            .into_iter()
            .map(|transaction| TransactionView {
                wallet_name: wallet_names.get(&transaction.wallet_id).cloned(),
                category_name: transaction
                    .category_id
                    .and_then(|id| category_names.get(&id).cloned()),
                transaction,
            })
            .collect())
    }

    /// Names are decoration; a failed lookup leaves them unset
    fn names_or_empty<T>(&self, source: &str, result: LaplataResult<Vec<T>>) -> Vec<T> {
        result.unwrap_or_else(|e| {
            warn!(
                kind = self.kind.entity_name(),
                source,
                error = %e,
                "name lookup failed, showing transactions without names"
            );
            Vec::new()
        })
    }

    fn newest_first(query: Query) -> Query {
        query.order_by("date", false).order_by("created_at", false)
    }

    /// List all, newest first, and republish them
    pub fn list(&self) -> LaplataResult<Vec<TransactionView>> {
        let views = self.fetch_views(Self::newest_first(Query::new()))?;
        self.transactions.replace(views.clone());
        Ok(views)
    }

    /// Transactions dated within `from..=to`, newest first
    pub fn list_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LaplataResult<Vec<TransactionView>> {
        let query = Query::new()
            .gte("date", from.to_string())
            .lte("date", to.to_string());
        self.fetch_views(Self::newest_first(query))
    }

    fn get_row(&self, id: TransactionId) -> LaplataResult<Transaction> {
        let owner = self.ctx.owner()?;
        let query = Query::new()
            .eq("id", id.to_key())
            .filter(ServiceContext::owner_filter(owner));
        let row = self
            .ctx
            .backend()
            .select(self.table(), &query)?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found(id))?;
        from_row(row)
    }

    /// Get one transaction with its wallet and category names
    pub fn get(&self, id: TransactionId) -> LaplataResult<TransactionView> {
        self.fetch_views(Query::new().eq("id", id.to_key()))?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found(id))
    }

    /// Find by full id, display id or id prefix
    pub fn find(&self, identifier: &str) -> LaplataResult<Option<TransactionView>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|v| v.transaction.id.matches(identifier)))
    }

    /// Wallet must exist; a newly assigned category must exist and match
    /// this kind. An unchanged category is not looked up again.
    fn check_references(
        &self,
        transaction: &Transaction,
        previous_category: Option<CategoryId>,
    ) -> LaplataResult<()> {
        transaction
            .validate()
            .map_err(|e| LaplataError::Validation(e.to_string()))?;

        self.wallets.get(transaction.wallet_id)?;

        let assigned = transaction
            .category_id
            .filter(|id| Some(*id) != previous_category);
        if let Some(category_id) = assigned {
            let category = self.categories.get(category_id)?;
            if category.kind != self.kind.category_kind() {
                return Err(LaplataError::Validation(format!(
                    "Category '{}' is of kind {}, expected {}",
                    category.name,
                    category.kind,
                    self.kind.category_kind()
                )));
            }
        }
        Ok(())
    }

    /// Log a failed compensation step; the caller returns the original error
    fn compensate<T>(&self, step: &str, result: LaplataResult<T>) {
        if let Err(e) = result {
            error!(
                kind = self.kind.entity_name(),
                step,
                error = %e,
                "compensation failed, wallet balance may be out of sync"
            );
        }
    }

    /// Record a new transaction and post it to its wallet
    pub fn create(&self, input: NewTransaction) -> LaplataResult<TransactionView> {
        let owner = self.ctx.owner()?;
        let date = input.date.unwrap_or_else(|| Local::now().date_naive());

        let mut transaction = Transaction::new(owner, input.wallet_id, input.amount, date);
        transaction.category_id = input.category_id;
        transaction.description = normalize_description(input.description);
        self.check_references(&transaction, None)?;

        let stored = self
            .ctx
            .backend()
            .insert(self.table(), vec![to_row(&transaction)?])?
            .into_iter()
            .next()
            .ok_or_else(|| LaplataError::backend("insert returned no row"))?;
        let transaction: Transaction = from_row(stored)?;

        let delta = self.kind.balance_effect(transaction.amount);
        if let Err(e) = self.wallets.adjust_balance(transaction.wallet_id, delta) {
            let filters = ServiceContext::row_filters(owner, transaction.id.to_key());
            self.compensate("undo insert", self.ctx.backend().delete(self.table(), &filters));
            return Err(e);
        }
        debug!(kind = self.kind.entity_name(), id = %transaction.id, "created transaction");

        self.ctx.record(
            owner,
            AuditEntry::create(
                EntityType::for_kind(self.kind),
                transaction.id.to_key(),
                transaction.description.clone(),
                &transaction,
            ),
        );
        self.refresh();
        self.get(transaction.id)
    }

    /// Edit a transaction, moving its balance effect as needed
    pub fn update(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> LaplataResult<TransactionView> {
        let owner = self.ctx.owner()?;
        let before = self.get_row(id)?;

        let mut after = before.clone();
        if let Some(wallet_id) = update.wallet_id {
            after.wallet_id = wallet_id;
        }
        if let Some(category_id) = update.category_id {
            after.category_id = category_id;
        }
        if let Some(amount) = update.amount {
            after.amount = amount;
        }
        if let Some(description) = update.description {
            after.description = normalize_description(description);
        }
        if let Some(date) = update.date {
            after.date = date;
        }
        self.check_references(&after, before.category_id)?;

        let filters = ServiceContext::row_filters(owner, id.to_key());
        let row = self
            .ctx
            .backend()
            .update(self.table(), &filters, to_row(&after)?)?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found(id))?;
        let after: Transaction = from_row(row)?;

        let old_effect = self.kind.balance_effect(before.amount);
        let new_effect = self.kind.balance_effect(after.amount);
        let restore_row = || {
            to_row(&before).and_then(|row| self.ctx.backend().update(self.table(), &filters, row))
        };

        if before.wallet_id == after.wallet_id {
            let delta = new_effect - old_effect;
            if !delta.is_zero() {
                if let Err(e) = self.wallets.adjust_balance(after.wallet_id, delta) {
                    self.compensate("restore row", restore_row());
                    return Err(e);
                }
            }
        } else {
            if let Err(e) = self.wallets.adjust_balance(before.wallet_id, -old_effect) {
                self.compensate("restore row", restore_row());
                return Err(e);
            }
            if let Err(e) = self.wallets.adjust_balance(after.wallet_id, new_effect) {
                self.compensate(
                    "re-apply reversal",
                    self.wallets.adjust_balance(before.wallet_id, old_effect),
                );
                self.compensate("restore row", restore_row());
                return Err(e);
            }
        }

        self.ctx.record(
            owner,
            AuditEntry::update(
                EntityType::for_kind(self.kind),
                id.to_key(),
                after.description.clone(),
                &before,
                &after,
            ),
        );
        self.refresh();
        self.get(id)
    }

    /// Delete a transaction and reverse its balance effect
    pub fn delete(&self, id: TransactionId) -> LaplataResult<Transaction> {
        let owner = self.ctx.owner()?;
        let before = self.get_row(id)?;

        let filters = ServiceContext::row_filters(owner, id.to_key());
        if self.ctx.backend().delete(self.table(), &filters)?.is_empty() {
            return Err(self.not_found(id));
        }

        let reversal = -self.kind.balance_effect(before.amount);
        if let Err(e) = self.wallets.adjust_balance(before.wallet_id, reversal) {
            self.compensate(
                "re-insert row",
                to_row(&before).and_then(|row| self.ctx.backend().insert(self.table(), vec![row])),
            );
            return Err(e);
        }

        self.ctx.record(
            owner,
            AuditEntry::delete(
                EntityType::for_kind(self.kind),
                id.to_key(),
                before.description.clone(),
                &before,
            ),
        );
        self.refresh();
        Ok(before)
    }

    /// Statistics as of today's local date
    pub fn stats(&self) -> LaplataResult<TransactionStats> {
        self.stats_as_of(Local::now().date_naive())
    }

    /// Totals, current and previous calendar month, change, and breakdown
    pub fn stats_as_of(&self, today: NaiveDate) -> LaplataResult<TransactionStats> {
        let views = self.fetch_views(Query::new())?;
        let current = MonthPeriod::containing(today);
        let previous = current.prev();

        let current_month = month_total(&views, current);
        let previous_month = month_total(&views, previous);

        Ok(TransactionStats {
            total: views.iter().map(|v| v.transaction.amount).sum(),
            current_month,
            previous_month,
            percent_change: percent_change(current_month, previous_month),
            by_category: category_breakdown(&views),
        })
    }

    /// The `limit` most recent transactions
    pub fn recent(&self, limit: usize) -> LaplataResult<Vec<TransactionView>> {
        self.fetch_views(Self::newest_first(Query::new()).limit(limit))
    }

    /// Breakdown by category, optionally within `from..=to`
    pub fn by_category(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LaplataResult<Vec<CategoryTotal>> {
        let mut query = Query::new();
        if let Some(from) = from {
            query = query.filter(Filter::gte("date", from.to_string()));
        }
        if let Some(to) = to {
            query = query.filter(Filter::lte("date", to.to_string()));
        }
        Ok(category_breakdown(&self.fetch_views(query)?))
    }

    fn refresh(&self) {
        if let Err(e) = self.list() {
            warn!(kind = self.kind.entity_name(), error = %e, "failed to refresh transactions");
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{FlakyBackend, Op};
    use crate::backend::Backend;
    use crate::models::{CategoryKind, UNCATEGORIZED};
    use crate::services::testing::{context, context_with};
    use crate::services::CategoryUpdate;

    struct Fixture {
        wallets: Arc<WalletService>,
        categories: Arc<CategoryService>,
        incomes: TransactionService,
        expenses: TransactionService,
    }

    fn fixture_with(ctx: Arc<ServiceContext>) -> Fixture {
        let wallets = Arc::new(WalletService::new(Arc::clone(&ctx)));
        let categories = Arc::new(CategoryService::new(Arc::clone(&ctx)));
        Fixture {
            incomes: TransactionService::new(
                TransactionKind::Income,
                Arc::clone(&ctx),
                Arc::clone(&wallets),
                Arc::clone(&categories),
            ),
            expenses: TransactionService::new(
                TransactionKind::Expense,
                ctx,
                Arc::clone(&wallets),
                Arc::clone(&categories),
            ),
            wallets,
            categories,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(context())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_txn(wallet_id: WalletId, units: i64, on: NaiveDate) -> NewTransaction {
        NewTransaction {
            wallet_id,
            category_id: None,
            amount: Money::from_units(units),
            description: None,
            date: Some(on),
        }
    }

    fn balance(f: &Fixture, id: WalletId) -> Money {
        f.wallets.get(id).unwrap().balance
    }

    #[test]
    fn test_expense_lifecycle_moves_balance() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();

        let expense = f
            .expenses
            .create(new_txn(main.id, 30, date(2025, 3, 3)))
            .unwrap();
        assert_eq!(balance(&f, main.id), Money::from_units(70));

        f.expenses
            .update(
                expense.transaction.id,
                TransactionUpdate {
                    amount: Some(Money::from_units(50)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(balance(&f, main.id), Money::from_units(50));

        f.expenses.delete(expense.transaction.id).unwrap();
        assert_eq!(balance(&f, main.id), Money::from_units(100));
    }

    #[test]
    fn test_balance_is_order_independent() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(10))).unwrap();
        let day = date(2025, 1, 15);

        f.expenses.create(new_txn(main.id, 4, day)).unwrap();
        f.incomes.create(new_txn(main.id, 25, day)).unwrap();
        f.expenses.create(new_txn(main.id, 7, day)).unwrap();
        f.incomes.create(new_txn(main.id, 1, day)).unwrap();

        assert_eq!(balance(&f, main.id), Money::from_units(10 + 25 + 1 - 4 - 7));
    }

    #[test]
    fn test_moving_to_another_wallet() {
        let f = fixture();
        let a = f.wallets.create("Alpha", Some(Money::from_units(100))).unwrap();
        let b = f.wallets.create("Beta", Some(Money::from_units(100))).unwrap();

        let income = f
            .incomes
            .create(new_txn(a.id, 20, date(2025, 1, 1)))
            .unwrap();
        f.incomes
            .update(
                income.transaction.id,
                TransactionUpdate {
                    wallet_id: Some(b.id),
                    amount: Some(Money::from_units(30)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(balance(&f, a.id), Money::from_units(100));
        assert_eq!(balance(&f, b.id), Money::from_units(130));
    }

    #[test]
    fn test_view_joins_names() {
        let f = fixture();
        let main = f.wallets.create("Main", None).unwrap();
        let salud = f.categories.create("Salud", CategoryKind::Expense).unwrap();

        let mut input = new_txn(main.id, 5, date(2025, 1, 1));
        input.category_id = Some(salud.id);
        input.description = Some("  farmacia ".into());
        let view = f.expenses.create(input).unwrap();

        assert_eq!(view.wallet_name.as_deref(), Some("Main"));
        assert_eq!(view.category_label(), "Salud");
        assert_eq!(view.transaction.description.as_deref(), Some("farmacia"));
    }

    #[test]
    fn test_wrong_category_kind_rejected() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        let salario = f.categories.create("Salario", CategoryKind::Income).unwrap();

        let mut input = new_txn(main.id, 5, date(2025, 1, 1));
        input.category_id = Some(salario.id);
        assert!(f.expenses.create(input).unwrap_err().is_validation());
        assert_eq!(balance(&f, main.id), Money::from_units(100));
    }

    #[test]
    fn test_amount_must_be_positive() {
        let f = fixture();
        let main = f.wallets.create("Main", None).unwrap();
        let err = f
            .incomes
            .create(new_txn(main.id, 0, date(2025, 1, 1)))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unknown_wallet_is_not_found() {
        let f = fixture();
        let err = f
            .incomes
            .create(new_txn(WalletId::new(), 5, date(2025, 1, 1)))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_stats_use_calendar_months() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(1000))).unwrap();

        f.expenses.create(new_txn(main.id, 10, date(2025, 2, 28))).unwrap();
        f.expenses.create(new_txn(main.id, 20, date(2025, 3, 1))).unwrap();
        f.expenses.create(new_txn(main.id, 40, date(2025, 1, 31))).unwrap();

        let stats = f.expenses.stats_as_of(date(2025, 2, 14)).unwrap();
        assert_eq!(stats.current_month, Money::from_units(10));
        assert_eq!(stats.previous_month, Money::from_units(40));
        assert_eq!(stats.total, Money::from_units(70));
        assert_eq!(stats.percent_change, -75.0);
        assert_eq!(stats.by_category.len(), 1);
        assert_eq!(stats.by_category[0].category, UNCATEGORIZED);
    }

    #[test]
    fn test_stats_with_empty_previous_month() {
        let f = fixture();
        let main = f.wallets.create("Main", None).unwrap();
        f.incomes.create(new_txn(main.id, 10, date(2025, 2, 2))).unwrap();

        let stats = f.incomes.stats_as_of(date(2025, 2, 14)).unwrap();
        assert_eq!(stats.percent_change, 0.0);
    }

    #[test]
    fn test_recent_and_range() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(1000))).unwrap();
        for day in 1..=7 {
            f.expenses.create(new_txn(main.id, 1, date(2025, 4, day))).unwrap();
        }

        let recent = f.expenses.recent(DEFAULT_RECENT_LIMIT).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].transaction.date, date(2025, 4, 7));

        let range = f
            .expenses
            .list_by_date_range(date(2025, 4, 2), date(2025, 4, 4))
            .unwrap();
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn test_by_category_percentages() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(1000))).unwrap();
        let comida = f.categories.create("Comida", CategoryKind::Expense).unwrap();

        let mut input = new_txn(main.id, 75, date(2025, 5, 1));
        input.category_id = Some(comida.id);
        f.expenses.create(input).unwrap();
        f.expenses.create(new_txn(main.id, 25, date(2025, 5, 2))).unwrap();
        f.expenses.create(new_txn(main.id, 99, date(2025, 6, 2))).unwrap();

        let rows = f
            .expenses
            .by_category(Some(date(2025, 5, 1)), Some(date(2025, 5, 31)))
            .unwrap();
        assert_eq!(rows[0].category, "Comida");
        assert_eq!(rows[0].percentage, 75.0);
        assert_eq!(rows[1].category, UNCATEGORIZED);
    }

    #[test]
    fn test_deleted_category_reads_as_uncategorized() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        let ocio = f.categories.create("Ocio", CategoryKind::Expense).unwrap();
        let mut input = new_txn(main.id, 5, date(2025, 1, 1));
        input.category_id = Some(ocio.id);
        let view = f.expenses.create(input).unwrap();

        f.categories.delete(ocio.id).unwrap();
        let view = f.expenses.get(view.transaction.id).unwrap();
        assert_eq!(view.category_label(), UNCATEGORIZED);
    }

    #[test]
    fn test_deleting_category_detaches_transactions() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        let ocio = f.categories.create("Ocio", CategoryKind::Expense).unwrap();
        let mut input = new_txn(main.id, 5, date(2025, 1, 1));
        input.category_id = Some(ocio.id);
        let view = f.expenses.create(input).unwrap();

        f.categories.delete(ocio.id).unwrap();
        let updated = f
            .expenses
            .update(
                view.transaction.id,
                TransactionUpdate {
                    amount: Some(Money::from_units(50)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.transaction.category_id, None);
        assert_eq!(balance(&f, main.id), Money::from_units(50));
    }

    #[test]
    fn test_dangling_category_does_not_block_edits() {
        let backend = FlakyBackend::new();
        let f = fixture_with(context_with(Arc::clone(&backend) as Arc<dyn Backend>));
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        let ocio = f.categories.create("Ocio", CategoryKind::Expense).unwrap();
        let mut input = new_txn(main.id, 5, date(2025, 1, 1));
        input.category_id = Some(ocio.id);
        let view = f.expenses.create(input).unwrap();

        // Detaching fails, so the row keeps pointing at the deleted category
        backend.fail(Op::Update, Table::Expenses);
        f.categories.delete(ocio.id).unwrap();
        backend.heal(Op::Update, Table::Expenses);

        let edited = f
            .expenses
            .update(
                view.transaction.id,
                TransactionUpdate {
                    category_id: Some(Some(ocio.id)),
                    amount: Some(Money::from_units(50)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(edited.category_label(), UNCATEGORIZED);
        assert_eq!(balance(&f, main.id), Money::from_units(50));
    }

    #[test]
    fn test_referenced_category_kind_is_fixed() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        let ocio = f.categories.create("Ocio", CategoryKind::Expense).unwrap();
        let spare = f.categories.create("Regalos", CategoryKind::Expense).unwrap();
        let mut input = new_txn(main.id, 5, date(2025, 1, 1));
        input.category_id = Some(ocio.id);
        f.expenses.create(input).unwrap();

        let change_kind = CategoryUpdate {
            kind: Some(CategoryKind::Income),
            ..Default::default()
        };
        let err = f.categories.update(ocio.id, change_kind.clone()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(f.categories.get(ocio.id).unwrap().kind, CategoryKind::Expense);

        let renamed = f
            .categories
            .update(
                ocio.id,
                CategoryUpdate {
                    name: Some("Diversión".into()),
                    kind: Some(CategoryKind::Expense),
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Diversión");

        let spare = f.categories.update(spare.id, change_kind).unwrap();
        assert_eq!(spare.kind, CategoryKind::Income);
    }

    #[test]
    fn test_failed_increment_leaves_no_orphan_row() {
        let backend = FlakyBackend::new();
        let f = fixture_with(context_with(Arc::clone(&backend) as Arc<dyn Backend>));
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();

        backend.fail(Op::Increment, Table::Wallets);
        assert!(f
            .expenses
            .create(new_txn(main.id, 30, date(2025, 1, 1)))
            .is_err());

        backend.heal(Op::Increment, Table::Wallets);
        assert!(f.expenses.list().unwrap().is_empty());
        assert_eq!(balance(&f, main.id), Money::from_units(100));
    }

    #[test]
    fn test_failed_increment_restores_updated_row() {
        let backend = FlakyBackend::new();
        let f = fixture_with(context_with(Arc::clone(&backend) as Arc<dyn Backend>));
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        let expense = f
            .expenses
            .create(new_txn(main.id, 30, date(2025, 1, 1)))
            .unwrap();

        backend.fail(Op::Increment, Table::Wallets);
        let result = f.expenses.update(
            expense.transaction.id,
            TransactionUpdate {
                amount: Some(Money::from_units(50)),
                ..Default::default()
            },
        );
        assert!(result.is_err());

        backend.heal(Op::Increment, Table::Wallets);
        let stored = f.expenses.get(expense.transaction.id).unwrap();
        assert_eq!(stored.transaction.amount, Money::from_units(30));
        assert_eq!(balance(&f, main.id), Money::from_units(70));
    }

    #[test]
    fn test_failed_increment_reinserts_deleted_row() {
        let backend = FlakyBackend::new();
        let f = fixture_with(context_with(Arc::clone(&backend) as Arc<dyn Backend>));
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        let expense = f
            .expenses
            .create(new_txn(main.id, 30, date(2025, 1, 1)))
            .unwrap();

        backend.fail(Op::Increment, Table::Wallets);
        assert!(f.expenses.delete(expense.transaction.id).is_err());

        backend.heal(Op::Increment, Table::Wallets);
        assert!(f.expenses.get(expense.transaction.id).is_ok());
        assert_eq!(balance(&f, main.id), Money::from_units(70));
    }

    #[test]
    fn test_wallet_delete_prunes_cached_postings() {
        let f = fixture();
        let a = f.wallets.create("Alpha", Some(Money::from_units(100))).unwrap();
        let b = f.wallets.create("Beta", Some(Money::from_units(100))).unwrap();
        f.incomes.create(new_txn(a.id, 5, date(2025, 1, 1))).unwrap();
        f.incomes.create(new_txn(b.id, 7, date(2025, 1, 2))).unwrap();
        assert_eq!(f.incomes.transactions().get().len(), 2);

        f.wallets.delete(a.id).unwrap();
        let cached = f.incomes.transactions().get();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].transaction.wallet_id, b.id);
        assert_eq!(f.incomes.list().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_wallet_delete_restores_postings() {
        let backend = FlakyBackend::new();
        let f = fixture_with(context_with(Arc::clone(&backend) as Arc<dyn Backend>));
        let main = f.wallets.create("Main", Some(Money::from_units(100))).unwrap();
        f.incomes.create(new_txn(main.id, 5, date(2025, 1, 1))).unwrap();
        f.expenses.create(new_txn(main.id, 3, date(2025, 1, 1))).unwrap();

        backend.fail(Op::Delete, Table::Wallets);
        assert!(f.wallets.delete(main.id).is_err());
        backend.heal(Op::Delete, Table::Wallets);

        assert_eq!(f.incomes.list().unwrap().len(), 1);
        assert_eq!(f.expenses.list().unwrap().len(), 1);
        assert_eq!(balance(&f, main.id), Money::from_units(102));
    }

    #[test]
    fn test_cache_republished_after_create() {
        let f = fixture();
        let main = f.wallets.create("Main", Some(Money::from_units(10))).unwrap();
        f.incomes.create(new_txn(main.id, 5, date(2025, 1, 1))).unwrap();
        assert_eq!(f.incomes.transactions().get().len(), 1);
        assert_eq!(f.wallets.wallets().get()[0].balance, Money::from_units(15));
    }
}
