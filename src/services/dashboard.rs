//! Dashboard aggregation
//!
//! The dashboard reads six independent sources. Each one runs on its own
//! worker thread and is awaited until a shared deadline; a source that fails
//! or misses the deadline contributes its default value (zero or empty) and is
//! listed in [`DashboardStats::degraded_sources`]. A late worker finishes in
//! the background and its result is dropped.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use super::{CategoryService, ServiceContext, TransactionService, WalletService};
use crate::error::{LaplataError, LaplataResult};
use crate::models::{
    Alert, AlertLevel, Category, DashboardStats, Money, MonthPeriod, MonthlySummary,
    PerformanceMetrics, TransactionStats, TransactionView, Wallet,
};
use crate::reports::{financial_summary, performance_metrics, share};

/// Savings above this share of monthly income earn a "good savings" alert
const GOOD_SAVINGS_SHARE: f64 = 0.2;

/// Months covered by [`DashboardService::financial_summary`] by default
pub const DEFAULT_SUMMARY_MONTHS: usize = 6;

/// Tunables for the dashboard
#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    /// How long to wait for each source
    pub source_timeout: Duration,
    /// Total balance below this raises a low-balance alert
    pub low_balance_threshold: Money,
    /// Number of recent expenses shown
    pub recent_limit: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_millis(5000),
            low_balance_threshold: Money::from_units(1000),
            recent_limit: super::transaction::DEFAULT_RECENT_LIMIT,
        }
    }
}

/// A source running on a worker thread
struct Pending<T> {
    name: &'static str,
    rx: Receiver<LaplataResult<T>>,
}

fn spawn<T, F>(name: &'static str, job: F) -> Pending<T>
where
    T: Send + 'static,
    F: FnOnce() -> LaplataResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name(format!("dashboard-{}", name))
        .spawn(move || {
            // The receiver is gone once the deadline passed
            tx.send(job()).ok();
        });
    if let Err(e) = spawned {
        // The job and its sender were dropped; `wait` sees a disconnect
        warn!(source = name, error = %e, "failed to start dashboard worker");
    }
    Pending { name, rx }
}

impl<T: Default> Pending<T> {
    fn wait(self, deadline: Instant, degraded: &mut Vec<&'static str>) -> T {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let err = match self.rx.recv_timeout(remaining) {
            Ok(Ok(value)) => return value,
            Ok(Err(e)) => e,
            Err(RecvTimeoutError::Timeout) => LaplataError::Timeout {
                source_name: self.name,
            },
            Err(RecvTimeoutError::Disconnected) => {
                LaplataError::backend("dashboard worker exited without a result")
            }
        };
        warn!(source = self.name, error = %err, "dashboard source degraded, using default");
        degraded.push(self.name);
        T::default()
    }
}

pub struct DashboardService {
    ctx: Arc<ServiceContext>,
    wallets: Arc<WalletService>,
    categories: Arc<CategoryService>,
    incomes: Arc<TransactionService>,
    expenses: Arc<TransactionService>,
    options: DashboardOptions,
}

impl DashboardService {
    pub fn new(
        ctx: Arc<ServiceContext>,
        wallets: Arc<WalletService>,
        categories: Arc<CategoryService>,
        incomes: Arc<TransactionService>,
        expenses: Arc<TransactionService>,
        options: DashboardOptions,
    ) -> Self {
        Self {
            ctx,
            wallets,
            categories,
            incomes,
            expenses,
            options,
        }
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    /// Dashboard snapshot as of today's local date
    pub fn stats(&self) -> LaplataResult<DashboardStats> {
        self.stats_as_of(Local::now().date_naive())
    }

    /// Gather every source concurrently and derive the monthly figures
    pub fn stats_as_of(&self, today: NaiveDate) -> LaplataResult<DashboardStats> {
        // Without an owner every source would fail the same way
        self.ctx.owner()?;
        let started = Instant::now();
        let deadline = started + self.options.source_timeout;

        let total_balance: Pending<Money> = {
            let wallets = Arc::clone(&self.wallets);
            spawn("wallet_total", move || wallets.total_balance())
        };
        let wallets: Pending<Vec<Wallet>> = {
            let wallets = Arc::clone(&self.wallets);
            spawn("wallets", move || wallets.list())
        };
        let categories: Pending<Vec<Category>> = {
            let categories = Arc::clone(&self.categories);
            spawn("categories", move || categories.list())
        };
        let income: Pending<TransactionStats> = {
            let incomes = Arc::clone(&self.incomes);
            spawn("income_stats", move || incomes.stats_as_of(today))
        };
        let expense: Pending<TransactionStats> = {
            let expenses = Arc::clone(&self.expenses);
            spawn("expense_stats", move || expenses.stats_as_of(today))
        };
        let recent: Pending<Vec<TransactionView>> = {
            let expenses = Arc::clone(&self.expenses);
            let limit = self.options.recent_limit;
            spawn("recent_expenses", move || expenses.recent(limit))
        };

        let mut degraded = Vec::new();
        let total_balance = total_balance.wait(deadline, &mut degraded);
        let wallets = wallets.wait(deadline, &mut degraded);
        let categories = categories.wait(deadline, &mut degraded);
        let income = income.wait(deadline, &mut degraded);
        let expense = expense.wait(deadline, &mut degraded);
        let recent_expenses = recent.wait(deadline, &mut degraded);

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            degraded = degraded.len(),
            "dashboard stats gathered"
        );

        let movement = income.current_month + expense.current_month;
        Ok(DashboardStats {
            total_balance,
            total_income: income.total,
            total_expense: expense.total,
            income_month: income.current_month,
            expense_month: expense.current_month,
            monthly_balance: income.current_month - expense.current_month,
            income_share: share(income.current_month, movement),
            expense_share: share(expense.current_month, movement),
            wallets,
            categories,
            recent_expenses,
            income_by_category: income.by_category,
            expense_by_category: expense.by_category,
            degraded_sources: degraded,
        })
    }

    /// Notices derived from a snapshot
    pub fn alerts(&self, stats: &DashboardStats) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let threshold = self.options.low_balance_threshold;

        if stats.total_balance < threshold {
            alerts.push(Alert {
                level: AlertLevel::Warning,
                title: "Saldo Bajo",
                message: format!(
                    "Tu saldo total está por debajo de {}",
                    grouped_amount(threshold)
                ),
            });
        }
        if stats.expense_month > stats.income_month {
            alerts.push(Alert {
                level: AlertLevel::Danger,
                title: "Gastos Excesivos",
                message: "Tus gastos del mes superan tus ingresos".to_string(),
            });
        }
        if stats.monthly_balance.to_decimal() > stats.income_month.to_decimal() * GOOD_SAVINGS_SHARE
        {
            alerts.push(Alert {
                level: AlertLevel::Success,
                title: "Excelente Ahorro",
                message: "Estás ahorrando más del 20% de tus ingresos".to_string(),
            });
        }
        alerts
    }

    /// Income, expense and savings for the trailing `months` calendar months
    pub fn financial_summary(&self, months: usize) -> LaplataResult<Vec<MonthlySummary>> {
        self.financial_summary_as_of(Local::now().date_naive(), months)
    }

    pub fn financial_summary_as_of(
        &self,
        today: NaiveDate,
        months: usize,
    ) -> LaplataResult<Vec<MonthlySummary>> {
        let incomes = self.incomes.list()?;
        let expenses = self.expenses.list()?;
        let periods = MonthPeriod::containing(today).trailing(months);
        Ok(financial_summary(&incomes, &expenses, &periods))
    }

    /// This month against the previous one
    pub fn performance_metrics(&self) -> LaplataResult<PerformanceMetrics> {
        self.performance_metrics_as_of(Local::now().date_naive())
    }

    pub fn performance_metrics_as_of(&self, today: NaiveDate) -> LaplataResult<PerformanceMetrics> {
        let income = self.incomes.stats_as_of(today)?;
        let expense = self.expenses.stats_as_of(today)?;
        Ok(performance_metrics(&income, &expense))
    }

    /// Seed a new account's starter categories
    pub fn initialize_user_data(&self) -> LaplataResult<Vec<Category>> {
        self.categories.create_defaults()
    }
}

/// "$1,000" style amount for alert text
fn grouped_amount(amount: Money) -> String {
    let digits = amount.units().abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount.is_negative() { "-" } else { "" };
    if amount.cents_part() == 0 {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{:02}", sign, grouped, amount.cents_part())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{FlakyBackend, Op};
    use crate::backend::{Backend, Table};
    use crate::models::{CategoryKind, TransactionKind, WalletId, UNCATEGORIZED};
    use crate::services::testing::{anonymous_context, context, context_with};
    use crate::services::NewTransaction;

    struct Fixture {
        wallets: Arc<WalletService>,
        incomes: Arc<TransactionService>,
        expenses: Arc<TransactionService>,
        dashboard: DashboardService,
    }

    fn fixture_with(ctx: Arc<ServiceContext>, options: DashboardOptions) -> Fixture {
        let wallets = Arc::new(WalletService::new(Arc::clone(&ctx)));
        let categories = Arc::new(CategoryService::new(Arc::clone(&ctx)));
        let incomes = Arc::new(TransactionService::new(
            TransactionKind::Income,
            Arc::clone(&ctx),
            Arc::clone(&wallets),
            Arc::clone(&categories),
        ));
        let expenses = Arc::new(TransactionService::new(
            TransactionKind::Expense,
            Arc::clone(&ctx),
            Arc::clone(&wallets),
            Arc::clone(&categories),
        ));
        let dashboard = DashboardService::new(
            ctx,
            Arc::clone(&wallets),
            categories,
            Arc::clone(&incomes),
            Arc::clone(&expenses),
            options,
        );
        Fixture {
            wallets,
            incomes,
            expenses,
            dashboard,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn post(service: &TransactionService, wallet_id: WalletId, units: i64, on: NaiveDate) {
        service
            .create(NewTransaction {
                wallet_id,
                category_id: None,
                amount: Money::from_units(units),
                description: None,
                date: Some(on),
            })
            .unwrap();
    }

    #[test]
    fn test_stats_combine_sources() {
        let f = fixture_with(context(), DashboardOptions::default());
        let main = f.wallets.create("Main", Some(Money::from_units(500))).unwrap();
        f.wallets.create("Cash", Some(Money::from_units(100))).unwrap();

        post(&f.incomes, main.id, 300, date(2025, 3, 2));
        post(&f.expenses, main.id, 100, date(2025, 3, 5));
        post(&f.expenses, main.id, 40, date(2025, 2, 20));

        let stats = f.dashboard.stats_as_of(date(2025, 3, 15)).unwrap();
        assert!(stats.degraded_sources.is_empty());
        assert_eq!(stats.total_balance, Money::from_units(760));
        assert_eq!(stats.wallets.len(), 2);
        assert_eq!(stats.income_month, Money::from_units(300));
        assert_eq!(stats.expense_month, Money::from_units(100));
        assert_eq!(stats.total_expense, Money::from_units(140));
        assert_eq!(stats.monthly_balance, Money::from_units(200));
        assert_eq!(stats.income_share, 75.0);
        assert_eq!(stats.expense_share, 25.0);
        assert_eq!(stats.recent_expenses.len(), 2);
    }

    #[test]
    fn test_empty_month_has_zero_shares() {
        let f = fixture_with(context(), DashboardOptions::default());
        let stats = f.dashboard.stats_as_of(date(2025, 3, 15)).unwrap();
        assert_eq!(stats.income_share, 0.0);
        assert_eq!(stats.expense_share, 0.0);
    }

    #[test]
    fn test_failed_source_degrades_to_default() {
        let backend = FlakyBackend::new();
        let f = fixture_with(
            context_with(Arc::clone(&backend) as Arc<dyn Backend>),
            DashboardOptions::default(),
        );
        let main = f.wallets.create("Main", Some(Money::from_units(50))).unwrap();
        post(&f.incomes, main.id, 30, date(2025, 3, 2));
        post(&f.expenses, main.id, 20, date(2025, 3, 5));

        backend.fail(Op::Select, Table::Categories);
        let stats = f.dashboard.stats_as_of(date(2025, 3, 15)).unwrap();
        assert_eq!(stats.degraded_sources, vec!["categories"]);
        assert!(stats.categories.is_empty());
        assert_eq!(stats.total_balance, Money::from_units(60));
        assert_eq!(stats.wallets.len(), 1);
        assert_eq!(stats.income_month, Money::from_units(30));
        assert_eq!(stats.expense_month, Money::from_units(20));
        assert_eq!(stats.recent_expenses.len(), 1);
        assert_eq!(stats.expense_by_category[0].category, UNCATEGORIZED);
    }

    #[test]
    fn test_slow_source_times_out() {
        let backend = FlakyBackend::new();
        let options = DashboardOptions {
            source_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let f = fixture_with(context_with(Arc::clone(&backend) as Arc<dyn Backend>), options);
        f.wallets.create("Main", Some(Money::from_units(50))).unwrap();

        backend.slow(Table::Categories, Duration::from_millis(500));
        let started = Instant::now();
        let stats = f.dashboard.stats_as_of(date(2025, 3, 15)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(stats.degraded_sources, vec!["categories"]);
        assert_eq!(stats.total_balance, Money::from_units(50));
    }

    #[test]
    fn test_requires_session() {
        let ctx = anonymous_context();
        let f = fixture_with(ctx, DashboardOptions::default());
        assert!(f
            .dashboard
            .stats_as_of(date(2025, 3, 15))
            .unwrap_err()
            .is_not_authenticated());
    }

    #[test]
    fn test_alerts() {
        let f = fixture_with(context(), DashboardOptions::default());
        let stats = DashboardStats {
            total_balance: Money::from_units(999),
            income_month: Money::from_units(100),
            expense_month: Money::from_units(150),
            monthly_balance: Money::from_units(-50),
            ..Default::default()
        };
        let alerts = f.dashboard.alerts(&stats);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].title, "Saldo Bajo");
        assert_eq!(
            alerts[0].message,
            "Tu saldo total está por debajo de $1,000"
        );
        assert_eq!(alerts[1].level, AlertLevel::Danger);

        let thrifty = DashboardStats {
            total_balance: Money::from_units(5000),
            income_month: Money::from_units(1000),
            expense_month: Money::from_units(700),
            monthly_balance: Money::from_units(300),
            ..Default::default()
        };
        let alerts = f.dashboard.alerts(&thrifty);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Success);
    }

    #[test]
    fn test_financial_summary_and_metrics() {
        let f = fixture_with(context(), DashboardOptions::default());
        let main = f.wallets.create("Main", Some(Money::from_units(1000))).unwrap();
        post(&f.incomes, main.id, 200, date(2025, 2, 10));
        post(&f.expenses, main.id, 300, date(2025, 2, 11));
        post(&f.incomes, main.id, 400, date(2025, 3, 10));
        post(&f.expenses, main.id, 100, date(2025, 3, 11));

        let summary = f
            .dashboard
            .financial_summary_as_of(date(2025, 3, 20), 3)
            .unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].period, "2025-01");
        assert_eq!(summary[1].balance, Money::from_units(-100));
        assert_eq!(summary[1].savings, Money::zero());
        assert_eq!(summary[2].savings, Money::from_units(300));

        let metrics = f
            .dashboard
            .performance_metrics_as_of(date(2025, 3, 20))
            .unwrap();
        assert_eq!(metrics.income.percent_change, 100.0);
        assert_eq!(metrics.savings.current, Money::from_units(300));
        assert_eq!(metrics.savings.percent_change, 400.0);
        assert_eq!(metrics.savings_ratio, 75.0);
    }

    #[test]
    fn test_initialize_user_data() {
        let f = fixture_with(context(), DashboardOptions::default());
        let seeded = f.dashboard.initialize_user_data().unwrap();
        assert!(seeded.iter().any(|c| c.kind == CategoryKind::Income));
        assert!(f.dashboard.initialize_user_data().unwrap().is_empty());
    }

    #[test]
    fn test_grouped_amount() {
        assert_eq!(grouped_amount(Money::from_units(1000)), "$1,000");
        assert_eq!(grouped_amount(Money::from_units(999)), "$999");
        assert_eq!(grouped_amount(Money::from_cents(123456789)), "$1,234,567.89");
    }
}
