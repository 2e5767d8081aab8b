//! Path management for LaPlata
//!
//! ## Path Resolution Order
//!
//! 1. `LAPLATA_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/laplata` or `~/.config/laplata`
//! 3. Windows: `%APPDATA%\laplata`

use std::path::PathBuf;

use crate::error::LaplataError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "LAPLATA_DATA_DIR";

/// Manages all paths used by LaPlata
#[derive(Debug, Clone)]
pub struct LaplataPaths {
    base_dir: PathBuf,
}

impl LaplataPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, LaplataError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };
        Ok(Self { base_dir })
    }

    /// Use a fixed base directory (tests, `--data-dir`)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding one JSON file per local table
    pub fn tables_dir(&self) -> PathBuf {
        self.base_dir.join("tables")
    }

    /// Local accounts
    pub fn users_file(&self) -> PathBuf {
        self.base_dir.join("users.json")
    }

    /// The saved session, local or remote
    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join("session.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Create the base and table directories if missing
    pub fn ensure_directories(&self) -> Result<(), LaplataError> {
        for dir in [self.base_dir.clone(), self.tables_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                LaplataError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Whether settings have ever been saved here
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, LaplataError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("laplata"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| LaplataError::Config("Could not determine HOME directory".into()))?;
    Ok(PathBuf::from(home).join(".config").join("laplata"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, LaplataError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| LaplataError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("laplata"))
}
