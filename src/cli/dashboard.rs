//! Dashboard CLI commands

use clap::Subcommand;

use super::{fail, CommandResult};
use crate::app::App;
use crate::config::Settings;
use crate::display::{
    format_alerts, format_dashboard, format_financial_summary, format_performance_metrics,
};
use crate::i18n::{Action, Subject};
use crate::services::dashboard::DEFAULT_SUMMARY_MONTHS;

#[derive(Subcommand)]
pub enum DashboardCommands {
    /// Balances, monthly totals, recent expenses and alerts
    Stats,
    /// Only the alerts
    Alerts,
    /// Income, expense and savings per month
    Summary {
        #[arg(short, long, default_value_t = DEFAULT_SUMMARY_MONTHS)]
        months: usize,
    },
    /// This month compared with the previous one
    Metrics,
}

pub fn handle_dashboard_command(
    app: &App,
    settings: &Settings,
    cmd: DashboardCommands,
) -> CommandResult {
    let currency = settings.currency_symbol.as_str();
    let load = || fail(Subject::Dashboard, Action::Load);

    match cmd {
        DashboardCommands::Stats => {
            let stats = app.dashboard.stats().map_err(load())?;
            let alerts = app.dashboard.alerts(&stats);
            print!("{}", format_dashboard(&stats, &alerts, currency));
        }
        DashboardCommands::Alerts => {
            let stats = app.dashboard.stats().map_err(load())?;
            print!("{}", format_alerts(&app.dashboard.alerts(&stats)));
        }
        DashboardCommands::Summary { months } => {
            let summary = app.dashboard.financial_summary(months).map_err(load())?;
            println!("{}", format_financial_summary(&summary, currency));
        }
        DashboardCommands::Metrics => {
            let metrics = app.dashboard.performance_metrics().map_err(load())?;
            print!("{}", format_performance_metrics(&metrics, currency));
        }
    }
    Ok(())
}
