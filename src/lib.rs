//! LaPlata - personal finance tracker
//!
//! Wallets ("carteras"), income and expense categories, incomes and expenses
//! that keep wallet balances in step, and a dashboard that combines them. Data
//! lives either in local JSON tables or in a hosted PostgREST/GoTrue project.
//!
//! # Architecture
//!
//! - `backend`: the table capability and its local and REST implementations
//! - `auth`: the auth capability, local (argon2) or hosted
//! - `cache`: observable values the services publish their collections through
//! - `services`: owner-scoped business logic and the dashboard
//! - `forms`: form models and modal state used by the command line
//! - `cli` / `display`: command handlers and terminal rendering
//! - `audit`: append-only log of mutations
//! - `config`: paths and persisted settings
//!
//! # Example
//!
//! ```rust,ignore
//! use laplata::app::App;
//! use laplata::config::{LaplataPaths, Settings};
//!
//! let paths = LaplataPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?.with_env_overrides();
//! let app = App::open(&paths, &settings)?;
//! println!("{}", app.wallets.total_balance()?);
//! ```

pub mod app;
pub mod audit;
pub mod auth;
pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod models;
pub mod reports;
pub mod services;

pub use error::LaplataError;
