use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use laplata::app::App;
use laplata::cli::{
    handle_auth_command, handle_category_command, handle_config_command,
    handle_dashboard_command, handle_history_command, handle_transaction_command,
    handle_wallet_command,
};
use laplata::config::{LaplataPaths, Settings};
use laplata::models::TransactionKind;

#[derive(Parser)]
#[command(
    name = "laplata",
    version,
    about = "Personal finance tracker: wallets, incomes, expenses and a dashboard",
    long_about = "LaPlata keeps track of your wallets (carteras), what comes in and \
                  what goes out, and summarizes it all in a dashboard. Data lives in \
                  local files or in a hosted Supabase project."
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this directory for data and settings
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, sign in and manage the account
    #[command(subcommand)]
    Auth(laplata::cli::AuthCommands),

    /// Wallet management commands
    #[command(subcommand, alias = "cartera")]
    Wallet(laplata::cli::WalletCommands),

    /// Category management commands
    #[command(subcommand, alias = "categoria")]
    Category(laplata::cli::CategoryCommands),

    /// Income commands
    #[command(subcommand, alias = "ingreso")]
    Income(laplata::cli::TransactionCommands),

    /// Expense commands
    #[command(subcommand, alias = "gasto")]
    Expense(laplata::cli::TransactionCommands),

    /// Dashboard figures and alerts
    #[command(subcommand, alias = "panel")]
    Dashboard(laplata::cli::DashboardCommands),

    /// Recent changes from the audit log
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Create the data directory and default settings
    Init,

    /// Show or change settings
    #[command(subcommand)]
    Config(laplata::cli::ConfigCommands),
}

fn init_tracing(verbose: bool, settings: &Settings) {
    let filter = if verbose {
        EnvFilter::new("laplata=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => LaplataPaths::with_base_dir(dir),
        None => LaplataPaths::new()?,
    };
    let mut settings = Settings::load_or_create(&paths)?;
    init_tracing(cli.verbose, &settings);

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("LaPlata - finanzas personales");
            println!();
            println!("Ejecuta 'laplata --help' para ver los comandos.");
            println!("Ejecuta 'laplata auth register' para crear tu cuenta.");
            return Ok(());
        }
    };

    match command {
        Commands::Init => {
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("LaPlata inicializado en: {}", paths.base_dir().display());
            println!();
            println!(
                "Siguiente paso: 'laplata auth register --email <email> --name <nombre> --accept-terms'"
            );
        }
        Commands::Config(cmd) => handle_config_command(&paths, &mut settings, cmd)?,
        other => run(other, &paths, settings.with_env_overrides())?,
    }

    Ok(())
}

/// Commands that work on the configured backend
fn run(command: Commands, paths: &LaplataPaths, settings: Settings) -> Result<()> {
    let app = App::open(paths, &settings)?;

    match command {
        Commands::Auth(cmd) => handle_auth_command(&app, cmd)?,
        Commands::Wallet(cmd) => handle_wallet_command(&app, &settings, cmd)?,
        Commands::Category(cmd) => handle_category_command(&app, cmd)?,
        Commands::Income(cmd) => {
            handle_transaction_command(&app, &settings, TransactionKind::Income, cmd)?
        }
        Commands::Expense(cmd) => {
            handle_transaction_command(&app, &settings, TransactionKind::Expense, cmd)?
        }
        Commands::Dashboard(cmd) => handle_dashboard_command(&app, &settings, cmd)?,
        Commands::History { limit } => handle_history_command(&app, limit)?,
        Commands::Init | Commands::Config(_) => {}
    }

    Ok(())
}
