//! Settings CLI commands

use clap::Subcommand;

use super::{CommandFailure, CommandResult};
use crate::config::{LaplataPaths, Settings};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show paths and settings
    Show,
    /// Change one setting, e.g. `config set dashboard.source_timeout_ms 2000`
    Set { key: String, value: String },
}

/// First and last characters only
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

pub fn handle_config_command(
    paths: &LaplataPaths,
    settings: &mut Settings,
    cmd: ConfigCommands,
) -> CommandResult {
    match cmd {
        ConfigCommands::Show => {
            println!("Configuración de LaPlata");
            println!("========================");
            println!("Directorio de datos: {}", paths.base_dir().display());
            println!("Archivo de ajustes:  {}", paths.settings_file().display());
            println!("Registro de cambios: {}", paths.audit_log().display());
            println!();
            println!("  backend:                         {}", settings.backend);
            println!(
                "  remote.url:                      {}",
                settings.remote.url.as_deref().unwrap_or("-")
            );
            println!(
                "  remote.anon_key:                 {}",
                settings.remote.anon_key.as_deref().map(mask).unwrap_or_else(|| "-".into())
            );
            println!("  currency_symbol:                 {}", settings.currency_symbol);
            println!("  date_format:                     {}", settings.date_format);
            println!("  log_level:                       {}", settings.log_level);
            println!(
                "  dashboard.source_timeout_ms:     {}",
                settings.dashboard.source_timeout_ms
            );
            println!(
                "  dashboard.recent_limit:          {}",
                settings.dashboard.recent_limit
            );
            println!(
                "  dashboard.low_balance_threshold: {}",
                settings.dashboard.low_balance_threshold
            );
        }

        ConfigCommands::Set { key, value } => {
            settings
                .set(&key, &value)
                .map_err(|e| CommandFailure(e.to_string()))?;
            settings
                .save(paths)
                .map_err(|e| CommandFailure(e.to_string()))?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}
