//! Configuration module for LaPlata
//!
//! This module provides configuration management including:
//! - data directory resolution
//! - persisted settings with environment overrides

pub mod paths;
pub mod settings;

pub use paths::LaplataPaths;
pub use settings::{BackendKind, Settings};
